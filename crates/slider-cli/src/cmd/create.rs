//! `slider create`: Add a slider, optionally with its first banners.

use super::{Context, format_store_ids, open_db};
use crate::output::{CliError, fail_storage, pretty_kv, render_error, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use slider_core::relation::TracingSink;
use slider_core::{DesiredState, ErrorCode, SaveOutcome, Slider, SliderRepository};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Slider name.
    #[arg(long)]
    pub name: String,

    /// Store ids the slider is shown in (0 = all stores).
    #[arg(long = "store", value_delimiter = ',', default_value = "0")]
    pub stores: Vec<i64>,

    /// Banner to attach, as BANNER[:POSITION]. Repeatable.
    #[arg(long = "banner", value_name = "BANNER[:POSITION]")]
    pub banners: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateReport {
    slider: Slider,
    outcome: SaveOutcome,
}

/// Execute `slider create`.
///
/// # Errors
///
/// Returns an error if the name is blank, the store is missing, or the save
/// fails.
pub fn run_create(args: &CreateArgs, ctx: &Context) -> Result<()> {
    let name = args.name.trim();
    if name.is_empty() {
        let code = ErrorCode::InvalidName;
        render_error(
            ctx.output,
            &CliError::with_details(
                "slider name must not be empty",
                code.hint().unwrap_or_default(),
                code.code(),
            ),
        )?;
        anyhow::bail!("slider name must not be empty");
    }

    let conn = open_db(ctx)?;
    let repo = SliderRepository::with_sink(&conn, TracingSink);

    let mut slider = Slider::new(name);
    slider.store_ids.clone_from(&args.stores);
    let banners = (!args.banners.is_empty()).then(|| DesiredState::parse_pairs(&args.banners));

    let outcome = repo
        .save(&mut slider, banners.as_ref())
        .map_err(|err| fail_storage(ctx.output, &err))?;

    let report = CreateReport { slider, outcome };
    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "{}\t{}", r.outcome.slider_id, r.slider.name),
        |r, w| {
            pretty_kv(w, "created", format!("slider {}", r.outcome.slider_id))?;
            pretty_kv(w, "name", &r.slider.name)?;
            pretty_kv(w, "stores", format_store_ids(&r.slider.store_ids))?;
            pretty_kv(w, "banners", r.outcome.sync.diff.to_insert.len().to_string())
        },
    )
}
