//! `leaf reminder`: schedule recurring care and mark it done.

use crate::cmd::Context;
use crate::output::{Renderable, fmt_instant, pretty_kv, render_list, render_mode, write_json};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use leaflog_core::records::{self, get_reminder, insert_reminder};
use leaflog_core::scheduler::overdue_reminders;
use leaflog_core::time::parse_instant;
use leaflog_core::{
    DriftPolicy, Frequency, NewReminder, Reminder, ReminderType, active_reminders,
    complete_reminder, is_overdue,
};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum ReminderCommand {
    /// Schedule a recurring reminder.
    #[command(after_help = "EXAMPLES:\n    \
        leaf reminder add 1 watering --every \"7 days\"\n    \
        leaf reminder add 1 fertilizing --every P2W --due 2024-03-01")]
    Add(AddArgs),
    /// List reminders.
    List(ListArgs),
    /// Mark a reminder done and schedule the next occurrence.
    Complete(CompleteArgs),
    /// Stop a reminder from firing. Its history is kept.
    Deactivate(IdArgs),
    /// Delete a reminder and its notifications.
    Remove(IdArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub plant_id: i64,
    /// watering, fertilizing, repotting, pruning, misting or inspection.
    pub reminder_type: ReminderType,
    /// Recurrence, e.g. "7 days", "2 weeks", "12h", P7D.
    #[arg(long)]
    pub every: Frequency,
    /// First due date. Defaults to now.
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only this plant's reminders, including inactive ones.
    #[arg(long)]
    pub plant: Option<i64>,
    /// Only reminders overdue at `--as-of`.
    #[arg(long)]
    pub overdue: bool,
    /// Evaluate overdue status at this instant instead of now.
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompleteArgs {
    pub reminder_id: i64,
    /// When the care was done. Defaults to now; may be backdated.
    #[arg(long)]
    pub at: Option<String>,
    /// How to advance the due date. Defaults to `[reminders] drift_policy`.
    #[arg(long)]
    pub policy: Option<DriftPolicy>,
    /// Who did it.
    #[arg(long = "by")]
    pub performed_by: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub reminder_id: i64,
}

/// # Errors
///
/// Returns an error if the store is missing or the subcommand fails.
pub fn run_reminder(command: &ReminderCommand, ctx: &Context) -> Result<()> {
    match command {
        ReminderCommand::Add(args) => run_add(args, ctx),
        ReminderCommand::List(args) => run_list(args, ctx),
        ReminderCommand::Complete(args) => run_complete(args, ctx),
        ReminderCommand::Deactivate(args) => run_deactivate(args, ctx),
        ReminderCommand::Remove(args) => run_remove(args, ctx),
    }
}

/// A reminder with its overdue flag at the evaluation instant.
#[derive(Debug, Serialize)]
struct ReminderRow {
    #[serde(flatten)]
    reminder: Reminder,
    overdue: bool,
}

impl ReminderRow {
    fn at(reminder: Reminder, now: DateTime<Utc>) -> Self {
        Self {
            overdue: is_overdue(&reminder, now),
            reminder,
        }
    }
}

impl Renderable for ReminderRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let r = &self.reminder;
        let flag = if self.overdue {
            "  OVERDUE"
        } else if r.is_active {
            ""
        } else {
            "  (inactive)"
        };
        writeln!(
            w,
            "#{:<4} plant #{:<4} {:<12} every {:<10} next {}{flag}",
            r.reminder_id,
            r.plant_id,
            r.reminder_type,
            r.frequency,
            fmt_instant(r.next_due)
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let r = &self.reminder;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.reminder_id,
            r.plant_id,
            r.reminder_type,
            r.frequency.as_secs(),
            r.next_due.to_rfc3339(),
            r.is_active,
            self.overdue
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "PLANT", "TYPE", "EVERY_SECS", "NEXT_DUE", "ACTIVE", "OVERDUE"]
    }
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let next_due = args.due.as_deref().map(|raw| ctx.check(parse_instant(raw))).transpose()?;
    let conn = ctx.open_store()?;
    let reminder_id = ctx.check(insert_reminder(
        &conn,
        &NewReminder {
            plant_id: args.plant_id,
            reminder_type: args.reminder_type,
            frequency: args.every,
            next_due,
        },
        ctx.now,
    ))?;
    let row = ReminderRow::at(ctx.check(get_reminder(&conn, reminder_id))?, ctx.now);

    render_mode(
        ctx.output,
        &row,
        |r, w| r.render_table(w),
        |r, w| {
            write!(w, "Scheduled ")?;
            r.render_human(w)
        },
    )
}

fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let now = ctx.instant_or_now(args.as_of.as_deref())?;
    let conn = ctx.open_store()?;

    let reminders = match (args.plant, args.overdue) {
        (Some(plant_id), _) => ctx.check(records::plant_reminders(&conn, plant_id))?,
        (None, true) => ctx.check(overdue_reminders(&conn, now))?,
        (None, false) => ctx.check(active_reminders(&conn))?,
    };
    let rows: Vec<ReminderRow> = reminders
        .into_iter()
        .map(|r| ReminderRow::at(r, now))
        .filter(|row| !args.overdue || row.overdue)
        .collect();

    let empty = if args.overdue {
        "Nothing is overdue."
    } else {
        "No reminders."
    };
    render_list(&rows, ctx.output, empty)?;
    Ok(())
}

fn run_complete(args: &CompleteArgs, ctx: &Context) -> Result<()> {
    let occurred_at = ctx.instant_or_now(args.at.as_deref())?;
    let policy = args.policy.unwrap_or(ctx.config.reminders.drift_policy);

    let conn = ctx.open_store()?;
    let completion = ctx.check(complete_reminder(
        &conn,
        args.reminder_id,
        occurred_at,
        policy,
        args.performed_by.as_deref(),
    ))?;

    render_mode(
        ctx.output,
        &completion,
        |c, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                c.reminder_id,
                c.previous_due.to_rfc3339(),
                c.next_due.to_rfc3339(),
                c.event_id.map_or_else(|| "-".to_string(), |id| id.to_string())
            )
        },
        |c, w| {
            writeln!(w, "Completed reminder #{}", c.reminder_id)?;
            pretty_kv(w, "Was due", fmt_instant(c.previous_due))?;
            pretty_kv(w, "Next due", fmt_instant(c.next_due))?;
            if let Some(event_id) = c.event_id {
                pretty_kv(w, "Logged event", format!("#{event_id}"))?;
            }
            Ok(())
        },
    )
}

#[derive(Debug, Serialize)]
struct Changed {
    reminder_id: i64,
    action: &'static str,
}

fn run_deactivate(args: &IdArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    ctx.check(records::deactivate_reminder(&conn, args.reminder_id))?;
    report_change(ctx, args.reminder_id, "deactivated")
}

fn run_remove(args: &IdArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    ctx.check(records::delete_reminder(&conn, args.reminder_id))?;
    report_change(ctx, args.reminder_id, "removed")
}

fn report_change(ctx: &Context, reminder_id: i64, action: &'static str) -> Result<()> {
    render_mode(
        ctx.output,
        &Changed {
            reminder_id,
            action,
        },
        |c, w| writeln!(w, "{}\t{}", c.action, c.reminder_id),
        |c, w| writeln!(w, "Reminder #{} {}", c.reminder_id, c.action),
    )
}
