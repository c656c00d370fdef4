//! `slider init`: Create (or upgrade) the slider store.

use super::Context;
use crate::output::{pretty_kv, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use slider_core::db::{migrations, open_store};

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    db: String,
    schema_version: u32,
}

/// Execute `slider init`. Safe to run against an existing store: pending
/// migrations are applied and nothing else changes.
///
/// # Errors
///
/// Returns an error if the database cannot be created or migrated.
pub fn run_init(_args: &InitArgs, ctx: &Context) -> Result<()> {
    let conn = open_store(&ctx.db_path, &ctx.store)?;
    let report = InitReport {
        db: ctx.db_path.display().to_string(),
        schema_version: migrations::current_schema_version(&conn)?,
    };
    tracing::info!(db = %report.db, schema_version = report.schema_version, "slider store ready");

    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "{}\t{}", r.db, r.schema_version),
        |r, w| {
            pretty_kv(w, "store", &r.db)?;
            pretty_kv(w, "schema", format!("v{}", r.schema_version))
        },
    )
}
