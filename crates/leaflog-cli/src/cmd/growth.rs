use crate::cmd::Context;
use crate::output::render_list;
use anyhow::Result;
use clap::Args;
use leaflog_core::growth_trend;

#[derive(Args, Debug)]
pub struct GrowthArgs {
    pub plant_id: i64,
    /// Trailing window in days. Defaults to `[growth] default_days`.
    #[arg(long)]
    pub days: Option<i64>,
    /// End of the window. Defaults to now.
    #[arg(long)]
    pub as_of: Option<String>,
}

/// Execute `leaf growth`.
///
/// # Errors
///
/// Returns an error for an unknown plant or a missing store.
pub fn run_growth(args: &GrowthArgs, ctx: &Context) -> Result<()> {
    let now = ctx.instant_or_now(args.as_of.as_deref())?;
    let days = args.days.unwrap_or(ctx.config.growth.default_days);

    let conn = ctx.open_store()?;
    let samples = ctx.check(growth_trend(&conn, args.plant_id, days, now))?;
    render_list(
        &samples,
        ctx.output,
        &format!("No measurements in the last {days} days."),
    )?;
    Ok(())
}
