//! `slider show`: One slider with its banners in display order.

use super::{Context, display_order, format_store_ids, format_us, open_db, require_slider};
use crate::output::{pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use slider_core::SliderRepository;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Slider id.
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct BannerRow {
    banner_id: i64,
    position: i64,
}

#[derive(Debug, Serialize)]
struct ShowReport {
    id: i64,
    name: String,
    store_ids: Vec<i64>,
    created_at_us: i64,
    updated_at_us: i64,
    banners: Vec<BannerRow>,
}

/// Execute `slider show`.
///
/// # Errors
///
/// Returns an error if the store or slider is missing, or a query fails.
pub fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let conn = open_db(ctx)?;
    let repo = SliderRepository::new(&conn);
    let slider = require_slider(&repo, args.id, ctx.output)?;
    let positions = repo.banner_positions(args.id)?;

    let report = ShowReport {
        id: args.id,
        name: slider.name,
        store_ids: slider.store_ids,
        created_at_us: slider.created_at_us,
        updated_at_us: slider.updated_at_us,
        banners: display_order(&positions)
            .into_iter()
            .map(|(banner_id, position)| BannerRow {
                banner_id,
                position,
            })
            .collect(),
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            writeln!(w, "{}\t{}\t{}", r.id, r.name, format_store_ids(&r.store_ids))?;
            for banner in &r.banners {
                writeln!(w, "{}\t{}", banner.banner_id, banner.position)?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Slider {}: {}", r.id, r.name))?;
            pretty_kv(w, "stores", format_store_ids(&r.store_ids))?;
            pretty_kv(w, "created", format_us(r.created_at_us))?;
            pretty_kv(w, "updated", format_us(r.updated_at_us))?;
            writeln!(w)?;
            if r.banners.is_empty() {
                return writeln!(w, "No banners assigned.");
            }
            writeln!(w, "{:>8}  BANNER", "POSITION")?;
            for banner in &r.banners {
                writeln!(w, "{:>8}  {}", banner.position, banner.banner_id)?;
            }
            Ok(())
        },
    )
}
