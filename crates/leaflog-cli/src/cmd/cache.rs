//! `leaf cache`: check and rebuild the cached current status.

use crate::cmd::Context;
use crate::output::{CliError, render_error, render_mode};
use anyhow::Result;
use clap::Subcommand;
use leaflog_core::ErrorCode;
use leaflog_core::status::{StatusDrift, rebuild_status_cache, verify_status_cache};
use serde::Serialize;
use std::io::Write;

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Compare every plant's cached status with its event log. Exits
    /// non-zero on any mismatch.
    Verify,
    /// Recompute every cached status from the event log.
    Rebuild,
}

#[derive(Debug, Serialize)]
struct VerifyOutput {
    ok: bool,
    drift: Vec<StatusDrift>,
}

#[derive(Debug, Serialize)]
struct RebuildOutput {
    repaired: usize,
}

/// # Errors
///
/// Returns an error if the store is missing, the query fails, or `verify`
/// finds drift.
pub fn run_cache(command: &CacheCommand, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    match command {
        CacheCommand::Verify => {
            let drift = ctx.check(verify_status_cache(&conn))?;
            let out = VerifyOutput {
                ok: drift.is_empty(),
                drift,
            };
            render_mode(
                ctx.output,
                &out,
                |o, w| {
                    for d in &o.drift {
                        writeln!(w, "{}\t{}\t{}", d.plant_id, d.cached, d.derived)?;
                    }
                    Ok(())
                },
                |o, w| {
                    if o.ok {
                        return writeln!(w, "Status cache matches the event log.");
                    }
                    for d in &o.drift {
                        writeln!(
                            w,
                            "plant #{}: cached {} but log says {}",
                            d.plant_id, d.cached, d.derived
                        )?;
                    }
                    Ok(())
                },
            )?;
            if !out.ok {
                let code = ErrorCode::CorruptStore;
                render_error(
                    ctx.output,
                    &CliError::with_details(
                        format!("{} plant(s) have a stale cached status", out.drift.len()),
                        code.hint().unwrap_or("Run `leaf cache rebuild`"),
                        code.code(),
                    ),
                )?;
                anyhow::bail!("status cache drift detected");
            }
            Ok(())
        }
        CacheCommand::Rebuild => {
            let repaired = ctx.check(rebuild_status_cache(&conn, ctx.now))?;
            render_mode(
                ctx.output,
                &RebuildOutput { repaired },
                |o, w| writeln!(w, "repaired\t{}", o.repaired),
                |o, w| writeln!(w, "Rebuilt status cache ({} plant(s) repaired)", o.repaired),
            )
        }
    }
}
