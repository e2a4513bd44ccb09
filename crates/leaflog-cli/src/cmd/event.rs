//! `leaf event`: append to and read a plant's event log.

use crate::cmd::Context;
use crate::output::{Renderable, fmt_instant, render_list, render_mode, write_json};
use anyhow::Result;
use clap::{Args, Subcommand};
use leaflog_core::time::parse_instant;
use leaflog_core::{
    Event, EventFilter, EventOrder, EventType, NewEvent, PlantStatus, append_event, query_events,
};
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Record an event for a plant.
    #[command(after_help = "EXAMPLES:\n    \
        leaf event add 1 watering --amount 250\n    \
        leaf event add 1 status_change --status sick --at 2024-03-01\n    \
        leaf event add 1 pest_observed --description \"spider mites\"")]
    Add(AddArgs),
    /// List a plant's events.
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub plant_id: i64,
    /// Event type (watering, fertilizing, status_change, repotting, pruning,
    /// disease_observed, pest_observed, treatment, death).
    pub event_type: EventType,
    /// When the event happened. Defaults to now; may be backdated.
    #[arg(long)]
    pub at: Option<String>,
    /// New status; required for status_change, rejected otherwise.
    #[arg(long)]
    pub status: Option<PlantStatus>,
    /// Amount (e.g. millilitres of water).
    #[arg(long)]
    pub amount: Option<f64>,
    #[arg(long)]
    pub description: Option<String>,
    /// Who performed the care.
    #[arg(long = "by")]
    pub performed_by: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub plant_id: i64,
    /// Only these types (repeatable).
    #[arg(long = "type", short = 't')]
    pub types: Vec<EventType>,
    /// Inclusive lower bound.
    #[arg(long)]
    pub since: Option<String>,
    /// Inclusive upper bound.
    #[arg(long)]
    pub until: Option<String>,
    #[arg(long, short = 'n')]
    pub limit: Option<u32>,
    #[arg(long)]
    pub newest_first: bool,
    /// Only events that set a status.
    #[arg(long)]
    pub status_only: bool,
}

/// # Errors
///
/// Returns an error if the store is missing or the subcommand fails.
pub fn run_event(command: &EventCommand, ctx: &Context) -> Result<()> {
    match command {
        EventCommand::Add(args) => run_add(args, ctx),
        EventCommand::List(args) => run_list(args, ctx),
    }
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let event_date = ctx.instant_or_now(args.at.as_deref())?;
    let event = NewEvent {
        plant_id: args.plant_id,
        event_type: args.event_type,
        event_date,
        description: args.description.clone(),
        amount: args.amount,
        performed_by: args.performed_by.clone(),
        status: args.status,
    };

    let conn = ctx.open_store()?;
    let event_id = ctx.check(append_event(&conn, &event, ctx.now))?;
    let stored = ctx.check(query_events(
        &conn,
        args.plant_id,
        &EventFilter {
            since: Some(event_date),
            until: Some(event_date),
            ..EventFilter::default()
        },
    ))?
    .into_iter()
    .find(|e| e.event_id == event_id);

    match stored {
        Some(stored) => render_mode(
            ctx.output,
            &stored,
            |e, w| e.render_table(w),
            |e, w| {
                write!(w, "Recorded ")?;
                e.render_human(w)
            },
        ),
        None => anyhow::bail!("event {event_id} was appended but could not be read back"),
    }
}

fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let filter = EventFilter {
        event_types: args.types.clone(),
        status_relevant_only: args.status_only,
        since: args.since.as_deref().map(|raw| ctx.check(parse_instant(raw))).transpose()?,
        until: args.until.as_deref().map(|raw| ctx.check(parse_instant(raw))).transpose()?,
        limit: args.limit,
        order: if args.newest_first {
            EventOrder::NewestFirst
        } else {
            EventOrder::OldestFirst
        },
    };

    let conn = ctx.open_store()?;
    let events = ctx.check(query_events(&conn, args.plant_id, &filter))?;
    render_list(&events, ctx.output, "No events match.")?;
    Ok(())
}

impl Renderable for Event {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        write!(
            w,
            "#{:<5} {:<16} {:<18}",
            self.event_id,
            fmt_instant(self.event_date),
            self.event_type
        )?;
        if let Some(status) = self.status {
            write!(w, " -> {status}")?;
        }
        if let Some(amount) = self.amount {
            write!(w, " ({amount})")?;
        }
        if let Some(description) = &self.description {
            write!(w, " {description}")?;
        }
        if let Some(by) = &self.performed_by {
            write!(w, " [by {by}]")?;
        }
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.event_id,
            self.event_date.to_rfc3339(),
            self.event_type,
            self.status.map_or("-", PlantStatus::as_str),
            self.description.as_deref().unwrap_or("-")
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "DATE", "TYPE", "STATUS", "DESCRIPTION"]
    }
}
