pub mod assign;
pub mod create;
pub mod init;
pub mod list;
pub mod show;
pub mod where_cmd;

use crate::output::{CliError, OutputMode, render_error};
use chrono::{DateTime, SecondsFormat};
use rusqlite::Connection;
use slider_core::config::StoreConfig;
use slider_core::db::try_open_store;
use slider_core::error::ErrorCode;
use slider_core::{Slider, SliderId, SliderRepository};
use std::path::PathBuf;

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub db_path: PathBuf,
    pub store: StoreConfig,
    pub output: OutputMode,
}

/// Open the slider store, or explain how to create it.
pub fn open_db(ctx: &Context) -> anyhow::Result<Connection> {
    if let Some(conn) = try_open_store(&ctx.db_path, &ctx.store)? {
        return Ok(conn);
    }

    let code = ErrorCode::StoreNotInitialized;
    let message = format!("{}: {}", code.message(), ctx.db_path.display());
    render_error(
        ctx.output,
        &CliError::with_details(&message, code.hint().unwrap_or_default(), code.code()),
    )?;
    anyhow::bail!(message);
}

/// Load a slider that must exist.
pub fn require_slider<N>(
    repo: &SliderRepository<'_, N>,
    id: SliderId,
    output: OutputMode,
) -> anyhow::Result<Slider>
where
    N: slider_core::relation::ChangeSink,
{
    if let Some(slider) = repo.load(id)? {
        return Ok(slider);
    }

    render_error(
        output,
        &CliError::with_details(
            format!("slider {id} not found"),
            "use `slider list` to see available sliders",
            ErrorCode::SliderNotFound.code(),
        ),
    )?;
    anyhow::bail!("slider {id} not found");
}

/// RFC 3339 rendering of a microsecond timestamp.
pub fn format_us(us: i64) -> String {
    DateTime::from_timestamp_micros(us).map_or_else(
        || us.to_string(),
        |ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Store ids as `0,1,2`, with `0` spelled out.
pub fn format_store_ids(store_ids: &[i64]) -> String {
    if store_ids == [slider_core::slider::ALL_STORES] {
        return "all".to_string();
    }
    store_ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// `(banner_id, position)` pairs ordered for display: position, then id.
pub fn display_order(positions: &slider_core::PersistedState) -> Vec<(i64, i64)> {
    let mut pairs: Vec<(i64, i64)> = positions.iter().map(|(&b, &p)| (b, p)).collect();
    pairs.sort_by_key(|&(banner_id, position)| (position, banner_id));
    pairs
}
