use crate::cmd::Context;
use crate::output::{fmt_instant, render_mode};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use leaflog_core::records::require_plant;
use leaflog_core::{PlantStatus, status_at};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct StatusArgs {
    pub plant_id: i64,
    /// Instant to evaluate at (date or RFC 3339). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    plant_id: i64,
    common_name: String,
    at: DateTime<Utc>,
    status: PlantStatus,
}

/// Execute `leaf status`.
///
/// # Errors
///
/// Returns an error if the plant is unknown, `--at` does not parse, or the
/// store is missing.
pub fn run_status(args: &StatusArgs, ctx: &Context) -> Result<()> {
    let at = ctx.instant_or_now(args.at.as_deref())?;
    let conn = ctx.open_store()?;
    let plant = ctx.check(require_plant(&conn, args.plant_id))?;
    let status = ctx.check(status_at(&conn, args.plant_id, at))?;

    let out = StatusOutput {
        plant_id: plant.plant_id,
        common_name: plant.common_name,
        at,
        status,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "{}\t{}\t{}", o.plant_id, o.at.to_rfc3339(), o.status),
        |o, w| {
            writeln!(
                w,
                "#{} {} was {} at {}",
                o.plant_id,
                o.common_name,
                o.status,
                fmt_instant(o.at)
            )
        },
    )
}
