//! `slider assign`: Replace a slider's banner list.
//!
//! The banners given here become the slider's complete desired state:
//! anything not listed is removed, listed banners are inserted or
//! repositioned, and banners already at the requested position are left
//! alone.

use super::{Context, open_db, require_slider};
use crate::output::{fail_storage, pretty_kv, render_mode};
use anyhow::Result;
use clap::{ArgGroup, Args};
use serde::Serialize;
use slider_core::relation::{RelationDiff, TracingSink, diff};
use slider_core::{DesiredState, SliderRepository, StorageError};

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("desired")
        .required(true)
        .args(["banners", "payload", "clear"])
))]
pub struct AssignArgs {
    /// Slider id.
    pub id: i64,

    /// Banner to keep, as BANNER[:POSITION]. Repeatable.
    #[arg(long = "banner", value_name = "BANNER[:POSITION]")]
    pub banners: Vec<String>,

    /// Desired banners as a JSON object: {"<banner_id>": {"position": N}}.
    #[arg(long, value_name = "JSON")]
    pub payload: Option<String>,

    /// Remove every banner from the slider.
    #[arg(long)]
    pub clear: bool,

    /// Report the changes without writing them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct AssignReport {
    slider_id: i64,
    dry_run: bool,
    changed: bool,
    affected_ids: Vec<i64>,
    notify_ids: Vec<i64>,
    diff: RelationDiff,
}

fn desired_state(args: &AssignArgs) -> Result<DesiredState, StorageError> {
    if args.clear {
        return Ok(DesiredState::empty());
    }
    if let Some(raw) = &args.payload {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|err| StorageError::InvalidDesiredState(format!("invalid JSON: {err}")))?;
        return DesiredState::from_json(&value);
    }
    Ok(DesiredState::parse_pairs(&args.banners))
}

/// Execute `slider assign`.
///
/// # Errors
///
/// Returns an error if the store or slider is missing, the payload is
/// malformed, or the save fails.
pub fn run_assign(args: &AssignArgs, ctx: &Context) -> Result<()> {
    let desired = desired_state(args).map_err(|err| fail_storage(ctx.output, &err))?;

    let conn = open_db(ctx)?;
    let repo = SliderRepository::with_sink(&conn, TracingSink);
    let mut slider = require_slider(&repo, args.id, ctx.output)?;

    let report = if args.dry_run {
        let persisted = repo.banner_positions(args.id)?;
        let planned = diff(&persisted, &desired);
        AssignReport {
            slider_id: args.id,
            dry_run: true,
            changed: !planned.is_empty(),
            affected_ids: planned.affected_ids(),
            notify_ids: planned.notify_ids(),
            diff: planned,
        }
    } else {
        let outcome = repo
            .save(&mut slider, Some(&desired))
            .map_err(|err| fail_storage(ctx.output, &err))?;
        AssignReport {
            slider_id: outcome.slider_id,
            dry_run: false,
            changed: outcome.sync.changed,
            affected_ids: outcome.sync.affected_ids,
            notify_ids: outcome.sync.notify_ids,
            diff: outcome.sync.diff,
        }
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            for (id, position) in &r.diff.to_insert {
                writeln!(w, "insert\t{id}\t{position}")?;
            }
            for (id, position) in &r.diff.to_update {
                writeln!(w, "update\t{id}\t{position}")?;
            }
            for id in r.diff.to_delete.keys() {
                writeln!(w, "delete\t{id}")?;
            }
            Ok(())
        },
        |r, w| {
            let verb = if r.dry_run { "would change" } else { "changed" };
            if !r.changed {
                return writeln!(w, "Slider {}: banner list unchanged.", r.slider_id);
            }
            writeln!(w, "Slider {}: {verb} {} banner(s).", r.slider_id, r.affected_ids.len())?;
            pretty_kv(w, "inserted", join_ids(r.diff.to_insert.keys()))?;
            pretty_kv(w, "moved", join_ids(r.diff.to_update.keys()))?;
            pretty_kv(w, "removed", join_ids(r.diff.to_delete.keys()))
        },
    )
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a i64>) -> String {
    let joined = ids.map(i64::to_string).collect::<Vec<_>>().join(", ");
    if joined.is_empty() { "-".to_string() } else { joined }
}
