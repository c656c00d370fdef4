//! `slider list`: Every slider, most recently updated first.

use super::{Context, format_store_ids, format_us, open_db};
use crate::output::{pretty_rule, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use slider_core::SliderRepository;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show sliders visible in this store (sliders on store 0 always match).
    #[arg(long)]
    pub store: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ListRow {
    id: i64,
    name: String,
    store_ids: Vec<i64>,
    banner_count: usize,
    updated_at_us: i64,
}

fn visible_in(store_ids: &[i64], store: Option<i64>) -> bool {
    store.is_none_or(|wanted| {
        store_ids.contains(&slider_core::slider::ALL_STORES) || store_ids.contains(&wanted)
    })
}

/// Execute `slider list`.
///
/// # Errors
///
/// Returns an error if the store is missing or a query fails.
pub fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let conn = open_db(ctx)?;
    let repo = SliderRepository::new(&conn);

    let mut rows = Vec::new();
    for slider in repo.list()? {
        if !visible_in(&slider.store_ids, args.store) {
            continue;
        }
        let Some(id) = slider.id else { continue };
        rows.push(ListRow {
            id,
            banner_count: repo.banner_positions(id)?.len(),
            name: slider.name,
            store_ids: slider.store_ids,
            updated_at_us: slider.updated_at_us,
        });
    }

    render_mode(
        ctx.output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    row.id,
                    row.name,
                    format_store_ids(&row.store_ids),
                    row.banner_count
                )?;
            }
            Ok(())
        },
        |rows, w| {
            if rows.is_empty() {
                return writeln!(w, "No sliders.");
            }
            writeln!(w, "{:>5}  {:<28} {:<10} {:>7}  UPDATED", "ID", "NAME", "STORES", "BANNERS")?;
            pretty_rule(w)?;
            for row in rows {
                writeln!(
                    w,
                    "{:>5}  {:<28} {:<10} {:>7}  {}",
                    row.id,
                    row.name,
                    format_store_ids(&row.store_ids),
                    row.banner_count,
                    format_us(row.updated_at_us)
                )?;
            }
            Ok(())
        },
    )
}
