use crate::cmd::Context;
use crate::output::{fmt_instant, pretty_kv, pretty_rule, pretty_section, render_mode};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use leaflog_core::{DashboardStats, dashboard_stats};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Evaluate counters at this instant instead of now. Plant and unread
    /// notification totals are always current.
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Debug, Serialize)]
struct DashboardOutput {
    as_of: DateTime<Utc>,
    #[serde(flatten)]
    stats: DashboardStats,
}

/// Execute `leaf dashboard`.
///
/// # Errors
///
/// Returns an error if the store is missing or a count fails.
pub fn run_dashboard(args: &DashboardArgs, ctx: &Context) -> Result<()> {
    let as_of = ctx.instant_or_now(args.as_of.as_deref())?;
    let conn = ctx.open_store()?;
    let stats = ctx.check(dashboard_stats(&conn, as_of))?;

    render_mode(
        ctx.output,
        &DashboardOutput { as_of, stats },
        |o, w| {
            let s = &o.stats;
            writeln!(w, "total_plants\t{}", s.total_plants)?;
            writeln!(w, "healthy_plants\t{}", s.healthy_plants)?;
            writeln!(w, "overdue_reminders\t{}", s.overdue_reminders)?;
            writeln!(w, "unread_notifications\t{}", s.unread_notifications)?;
            writeln!(w, "events_this_week\t{}", s.events_this_week)
        },
        |o, w| {
            let s = &o.stats;
            pretty_section(w, &format!("Dashboard as of {}", fmt_instant(o.as_of)))?;
            pretty_kv(w, "Plants", s.total_plants.to_string())?;
            pretty_kv(w, "Healthy", s.healthy_plants.to_string())?;
            pretty_kv(w, "Overdue", s.overdue_reminders.to_string())?;
            pretty_kv(w, "Unread", s.unread_notifications.to_string())?;
            pretty_kv(w, "Events (7d)", s.events_this_week.to_string())?;
            pretty_rule(w)
        },
    )
}
