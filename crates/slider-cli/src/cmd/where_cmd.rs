//! `slider where`: Which sliders carry a banner.

use super::{Context, open_db};
use crate::output::render_mode;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use slider_core::SliderRepository;
use slider_core::db::SqliteRelationStore;

#[derive(Args, Debug)]
pub struct WhereArgs {
    /// Banner id.
    pub banner: i64,
}

#[derive(Debug, Serialize)]
struct SliderRef {
    id: i64,
    name: String,
}

#[derive(Debug, Serialize)]
struct WhereReport {
    banner_id: i64,
    sliders: Vec<SliderRef>,
}

/// Execute `slider where`.
///
/// # Errors
///
/// Returns an error if the store is missing or a query fails.
pub fn run_where(args: &WhereArgs, ctx: &Context) -> Result<()> {
    let conn = open_db(ctx)?;
    let repo = SliderRepository::new(&conn);

    let mut sliders = Vec::new();
    for id in SqliteRelationStore::new(&conn).slider_ids_for_banner(args.banner)? {
        let name = repo.slider_name_by_id(id)?.unwrap_or_default();
        sliders.push(SliderRef { id, name });
    }
    let report = WhereReport {
        banner_id: args.banner,
        sliders,
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for slider in &r.sliders {
                writeln!(w, "{}\t{}", slider.id, slider.name)?;
            }
            Ok(())
        },
        |r, w| {
            if r.sliders.is_empty() {
                return writeln!(w, "Banner {} is not in any slider.", r.banner_id);
            }
            writeln!(w, "Banner {} appears in:", r.banner_id)?;
            for slider in &r.sliders {
                writeln!(w, "  {:>5}  {}", slider.id, slider.name)?;
            }
            Ok(())
        },
    )
}
