//! `leaf plant`: add, show, list, update and remove plants.

use crate::cmd::Context;
use crate::output::{
    Renderable, fmt_instant, pretty_kv, pretty_rule, pretty_section, render_list, render_mode,
    write_json,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use leaflog_core::records::{self, insert_plant, list_plants, require_plant, update_plant};
use leaflog_core::scheduler::is_overdue;
use leaflog_core::time::parse_date;
use leaflog_core::{NewPlant, Plant, PlantStatus, PlantUpdate, Reminder, status_at};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum PlantCommand {
    /// Add a plant.
    Add(AddArgs),
    /// Show one plant with its status and reminders.
    Show(ShowArgs),
    /// List all plants.
    List,
    /// Change a plant's name, location, notes or other details.
    #[command(after_help = "EXAMPLES:\n    \
        leaf plant update 1 --location \"bedroom window\"\n    \
        leaf plant update 1 --notes \"\"    # clear notes")]
    Update(UpdateArgs),
    /// Remove a plant and everything recorded for it.
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Common name, e.g. "Monstera".
    pub name: String,
    #[arg(long)]
    pub scientific: Option<String>,
    #[arg(long)]
    pub variety: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Planting date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub planted: Option<String>,
    /// Where the plant came from.
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub plant_id: i64,
    /// Evaluate status at this instant instead of now.
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub plant_id: i64,
    #[arg(long)]
    pub name: Option<String>,
    /// An empty value clears this and the other optional text fields.
    #[arg(long)]
    pub scientific: Option<String>,
    #[arg(long)]
    pub variety: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Planting date (YYYY-MM-DD).
    #[arg(long)]
    pub planted: Option<String>,
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    pub plant_id: i64,
}

/// # Errors
///
/// Returns an error if the store is missing or the subcommand fails.
pub fn run_plant(command: &PlantCommand, ctx: &Context) -> Result<()> {
    match command {
        PlantCommand::Add(args) => run_add(args, ctx),
        PlantCommand::Show(args) => run_show(args, ctx),
        PlantCommand::List => run_list(ctx),
        PlantCommand::Update(args) => run_update(args, ctx),
        PlantCommand::Remove(args) => run_remove(args, ctx),
    }
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let planting_date = args
        .planted
        .as_deref()
        .map(|raw| ctx.check(parse_date(raw)))
        .transpose()?;
    let plant = NewPlant {
        common_name: args.name.clone(),
        scientific_name: args.scientific.clone(),
        variety: args.variety.clone(),
        location: args.location.clone(),
        planting_date,
        acquisition_source: args.source.clone(),
        notes: args.notes.clone(),
    };
    let conn = ctx.open_store()?;
    let plant_id = ctx.check(insert_plant(&conn, &plant, ctx.now))?;
    let stored = ctx.check(require_plant(&conn, plant_id))?;

    render_mode(
        ctx.output,
        &stored,
        |p, w| writeln!(w, "{}\t{}", p.plant_id, p.common_name),
        |p, w| writeln!(w, "Added plant #{} {}", p.plant_id, p.common_name),
    )
}

fn run_update(args: &UpdateArgs, ctx: &Context) -> Result<()> {
    let planting_date = args
        .planted
        .as_deref()
        .map(|raw| ctx.check(parse_date(raw)))
        .transpose()?;
    let update = PlantUpdate {
        common_name: args.name.clone(),
        scientific_name: args.scientific.clone(),
        variety: args.variety.clone(),
        location: args.location.clone(),
        planting_date,
        acquisition_source: args.source.clone(),
        notes: args.notes.clone(),
    };

    let conn = ctx.open_store()?;
    let plant = ctx.check(update_plant(&conn, args.plant_id, &update))?;

    render_mode(
        ctx.output,
        &plant,
        |p, w| p.render_table(w),
        |p, w| {
            if update.is_empty() {
                writeln!(w, "Nothing to change for plant #{}", p.plant_id)
            } else {
                writeln!(w, "Updated plant #{} {}", p.plant_id, p.common_name)
            }
        },
    )
}

#[derive(Debug, Serialize)]
struct PlantDetail {
    #[serde(flatten)]
    plant: Plant,
    status: PlantStatus,
    as_of: chrono::DateTime<chrono::Utc>,
    reminders: Vec<ReminderLine>,
}

#[derive(Debug, Serialize)]
struct ReminderLine {
    #[serde(flatten)]
    reminder: Reminder,
    overdue: bool,
}

fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let as_of = ctx.instant_or_now(args.as_of.as_deref())?;
    let conn = ctx.open_store()?;

    let plant = ctx.check(require_plant(&conn, args.plant_id))?;
    let status = ctx.check(status_at(&conn, args.plant_id, as_of))?;
    let reminders = ctx
        .check(records::plant_reminders(&conn, args.plant_id))?
        .into_iter()
        .map(|reminder| ReminderLine {
            overdue: is_overdue(&reminder, as_of),
            reminder,
        })
        .collect();

    let detail = PlantDetail {
        plant,
        status,
        as_of,
        reminders,
    };
    render_mode(
        ctx.output,
        &detail,
        |d, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                d.plant.plant_id,
                d.plant.common_name,
                d.status,
                d.plant.location.as_deref().unwrap_or("-")
            )
        },
        |d, w| render_detail_pretty(d, w),
    )
}

fn render_detail_pretty(d: &PlantDetail, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("#{} {}", d.plant.plant_id, d.plant.common_name))?;
    if let Some(name) = &d.plant.scientific_name {
        pretty_kv(w, "Scientific", name)?;
    }
    if let Some(variety) = &d.plant.variety {
        pretty_kv(w, "Variety", variety)?;
    }
    if let Some(location) = &d.plant.location {
        pretty_kv(w, "Location", location)?;
    }
    pretty_kv(w, "Planted", d.plant.planting_date.to_string())?;
    pretty_kv(w, "Status", format!("{} (as of {})", d.status, fmt_instant(d.as_of)))?;
    if let Some(source) = &d.plant.acquisition_source {
        pretty_kv(w, "Source", source)?;
    }
    if let Some(notes) = &d.plant.notes {
        pretty_kv(w, "Notes", notes)?;
    }
    if !d.reminders.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Reminders")?;
        for line in &d.reminders {
            let r = &line.reminder;
            writeln!(
                w,
                "  #{:<4} {:<12} every {:<10} next {}{}{}",
                r.reminder_id,
                r.reminder_type,
                r.frequency,
                fmt_instant(r.next_due),
                if line.overdue { "  OVERDUE" } else { "" },
                if r.is_active { "" } else { "  (inactive)" },
            )?;
        }
    }
    pretty_rule(w)
}

impl Renderable for Plant {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "#{:<4} {:<24} {:<16} {}",
            self.plant_id,
            self.common_name,
            self.current_status,
            self.location.as_deref().unwrap_or("")
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.plant_id,
            self.common_name,
            self.current_status,
            self.planting_date,
            self.location.as_deref().unwrap_or("-")
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "STATUS", "PLANTED", "LOCATION"]
    }
}

fn run_list(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let plants = ctx.check(list_plants(&conn))?;
    render_list(&plants, ctx.output, "No plants yet. Add one with `leaf plant add <name>`.")?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct Removed {
    plant_id: i64,
    removed: bool,
}

fn run_remove(args: &RemoveArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    ctx.check(records::delete_plant(&conn, args.plant_id))?;
    render_mode(
        ctx.output,
        &Removed {
            plant_id: args.plant_id,
            removed: true,
        },
        |r, w| writeln!(w, "removed\t{}", r.plant_id),
        |r, w| writeln!(w, "Removed plant #{} and its history", r.plant_id),
    )
}
