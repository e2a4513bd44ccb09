//! Overdue notifications: raise, list unread, mark read.

use crate::cmd::Context;
use crate::output::{Renderable, fmt_instant, render_mode, render_list, write_json};
use anyhow::Result;
use clap::Args;
use leaflog_core::Notification;
use leaflog_core::notify::{mark_notification_read, notify_overdue, unread_notifications};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct NotifyArgs {
    /// Check for overdue reminders as of this instant instead of now.
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Args, Debug)]
pub struct NotificationsArgs {
    /// Maximum rows. Defaults to `[notifications] unread_limit`.
    #[arg(long, short = 'n')]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    pub notification_id: i64,
}

#[derive(Debug, Serialize)]
struct NotifyOutput {
    created: usize,
}

/// Execute `leaf notify`. Safe to run repeatedly, e.g. from cron.
///
/// # Errors
///
/// Returns an error if the store is missing or the write fails.
pub fn run_notify(args: &NotifyArgs, ctx: &Context) -> Result<()> {
    let now = ctx.instant_or_now(args.as_of.as_deref())?;
    let conn = ctx.open_store()?;
    let created = ctx.check(notify_overdue(&conn, now))?;

    render_mode(
        ctx.output,
        &NotifyOutput { created },
        |o, w| writeln!(w, "created\t{}", o.created),
        |o, w| match o.created {
            0 => writeln!(w, "No new overdue notifications."),
            1 => writeln!(w, "Raised 1 notification."),
            n => writeln!(w, "Raised {n} notifications."),
        },
    )
}

/// Execute `leaf notifications`.
///
/// # Errors
///
/// Returns an error if the store is missing or the query fails.
pub fn run_notifications(args: &NotificationsArgs, ctx: &Context) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.config.notifications.unread_limit);
    let conn = ctx.open_store()?;
    let unread = ctx.check(unread_notifications(&conn, limit))?;
    render_list(&unread, ctx.output, "No unread notifications.")?;
    Ok(())
}

/// Execute `leaf read`.
///
/// # Errors
///
/// Returns an error for an unknown notification or a missing store.
pub fn run_read(args: &ReadArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let notification = ctx.check(mark_notification_read(&conn, args.notification_id, ctx.now))?;
    render_mode(
        ctx.output,
        &notification,
        |n, w| n.render_table(w),
        |n, w| {
            writeln!(
                w,
                "Marked #{} read ({})",
                n.notification_id,
                n.read_at.map_or_else(|| "-".to_string(), fmt_instant)
            )
        },
    )
}

impl Renderable for Notification {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "#{:<4} {:<16} {}",
            self.notification_id,
            fmt_instant(self.created_at),
            self.message
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.notification_id,
            self.reminder_id,
            self.plant_id,
            self.due_at.to_rfc3339(),
            self.message
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "REMINDER", "PLANT", "DUE", "MESSAGE"]
    }
}
