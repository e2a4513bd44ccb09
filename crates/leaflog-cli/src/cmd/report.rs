//! `leaf report` and `leaf overview`.

use crate::cmd::Context;
use crate::output::{
    Renderable, fmt_instant, fmt_optional_instant, pretty_kv, pretty_rule, pretty_section,
    render_list, render_mode, write_json,
};
use anyhow::Result;
use clap::Args;
use leaflog_core::report::{PlantOverview, PlantReport, plant_report, plants_overview};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ReportArgs {
    pub plant_id: i64,
    /// Build the report as of this instant instead of now.
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Args, Debug)]
pub struct OverviewArgs {
    #[arg(long)]
    pub as_of: Option<String>,
}

/// Execute `leaf report`.
///
/// # Errors
///
/// Returns an error for an unknown plant or a missing store.
pub fn run_report(args: &ReportArgs, ctx: &Context) -> Result<()> {
    let now = ctx.instant_or_now(args.as_of.as_deref())?;
    let conn = ctx.open_store()?;
    let report = ctx.check(plant_report(&conn, args.plant_id, now))?;

    render_mode(ctx.output, &report, render_report_text, render_report_pretty)
}

fn render_report_text(r: &PlantReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "plant_id\t{}", r.plant.plant_id)?;
    writeln!(w, "name\t{}", r.plant.common_name)?;
    writeln!(w, "status\t{}", r.status)?;
    writeln!(w, "days_since_planting\t{}", r.days_since_planting)?;
    writeln!(w, "total_events\t{}", r.total_events)?;
    for entry in &r.events_by_type {
        writeln!(w, "events.{}\t{}", entry.event_type, entry.count)?;
    }
    writeln!(w, "last_watering\t{}", fmt_optional_instant(r.last_watering))?;
    writeln!(w, "last_fertilizing\t{}", fmt_optional_instant(r.last_fertilizing))?;
    writeln!(w, "active_reminders\t{}", r.active_reminders)?;
    writeln!(w, "overdue_reminders\t{}", r.overdue_reminders)
}

fn render_report_pretty(r: &PlantReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!("#{} {} as of {}", r.plant.plant_id, r.plant.common_name, fmt_instant(r.as_of)),
    )?;
    pretty_kv(w, "Status", r.status.as_str())?;
    pretty_kv(
        w,
        "Planted",
        format!("{} ({} days ago)", r.plant.planting_date, r.days_since_planting),
    )?;
    pretty_kv(w, "Last watered", fmt_optional_instant(r.last_watering))?;
    pretty_kv(w, "Last fed", fmt_optional_instant(r.last_fertilizing))?;
    pretty_kv(
        w,
        "Reminders",
        format!("{} active, {} overdue", r.active_reminders, r.overdue_reminders),
    )?;
    if let Some(m) = &r.latest_measurement {
        let mut parts = Vec::new();
        if let Some(h) = m.height_cm {
            parts.push(format!("height {h}cm"));
        }
        if let Some(wd) = m.width_cm {
            parts.push(format!("width {wd}cm"));
        }
        if let Some(n) = m.leaf_count {
            parts.push(format!("{n} leaves"));
        }
        if let Some(n) = m.flower_count {
            parts.push(format!("{n} flowers"));
        }
        pretty_kv(
            w,
            "Last measured",
            format!("{} ({})", fmt_instant(m.taken_at), parts.join(", ")),
        )?;
    }

    writeln!(w)?;
    pretty_section(w, &format!("Events ({})", r.total_events))?;
    for entry in &r.events_by_type {
        writeln!(w, "  {:<18} {}", entry.event_type.as_str(), entry.count)?;
    }
    pretty_rule(w)
}

/// Execute `leaf overview`.
///
/// # Errors
///
/// Returns an error if the store is missing or the query fails.
pub fn run_overview(args: &OverviewArgs, ctx: &Context) -> Result<()> {
    let now = ctx.instant_or_now(args.as_of.as_deref())?;
    let conn = ctx.open_store()?;
    let rows = ctx.check(plants_overview(&conn, now))?;
    render_list(&rows, ctx.output, "No plants yet.")?;
    Ok(())
}

impl Renderable for PlantOverview {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "#{:<4} {:<24} {:<16} watered {:<16} next {}",
            self.plant_id,
            self.common_name,
            self.status,
            fmt_optional_instant(self.last_watering),
            fmt_optional_instant(self.next_due)
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.plant_id,
            self.common_name,
            self.location.as_deref().unwrap_or("-"),
            self.status,
            self.last_watering.map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
            self.next_due.map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "LOCATION", "STATUS", "LAST_WATERING", "NEXT_DUE"]
    }
}
