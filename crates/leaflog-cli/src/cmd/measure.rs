use crate::cmd::Context;
use crate::output::{Renderable, fmt_instant, render_mode, write_json};
use anyhow::Result;
use clap::Args;
use leaflog_core::growth::latest_measurement;
use leaflog_core::{MeasurementSample, NewMeasurement, append_measurement};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct MeasureArgs {
    pub plant_id: i64,
    /// Height in centimetres.
    #[arg(long)]
    pub height: Option<f64>,
    /// Width in centimetres.
    #[arg(long)]
    pub width: Option<f64>,
    #[arg(long)]
    pub leaves: Option<u32>,
    #[arg(long)]
    pub flowers: Option<u32>,
    #[arg(long)]
    pub notes: Option<String>,
    /// When the sample was taken. Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

/// Execute `leaf measure`.
///
/// # Errors
///
/// Returns an error if the sample is empty or negative, the plant is
/// unknown, or the store is missing.
pub fn run_measure(args: &MeasureArgs, ctx: &Context) -> Result<()> {
    let taken_at = ctx.instant_or_now(args.at.as_deref())?;
    let sample = NewMeasurement {
        plant_id: args.plant_id,
        taken_at,
        height_cm: args.height,
        width_cm: args.width,
        leaf_count: args.leaves,
        flower_count: args.flowers,
        notes: args.notes.clone(),
    };

    let conn = ctx.open_store()?;
    let measurement_id = ctx.check(append_measurement(&conn, &sample))?;
    let Some(stored) = ctx.check(latest_measurement(&conn, args.plant_id, taken_at))? else {
        anyhow::bail!("measurement {measurement_id} was appended but could not be read back");
    };

    render_mode(
        ctx.output,
        &stored,
        |m, w| m.render_table(w),
        |m, w| {
            write!(w, "Recorded ")?;
            m.render_human(w)
        },
    )
}

fn metric<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl Renderable for MeasurementSample {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        write!(w, "#{:<5} {:<16}", self.measurement_id, fmt_instant(self.taken_at))?;
        if let Some(h) = self.height_cm {
            write!(w, " height {h}cm")?;
        }
        if let Some(wd) = self.width_cm {
            write!(w, " width {wd}cm")?;
        }
        if let Some(n) = self.leaf_count {
            write!(w, " leaves {n}")?;
        }
        if let Some(n) = self.flower_count {
            write!(w, " flowers {n}")?;
        }
        if let Some(notes) = &self.notes {
            write!(w, "  {notes}")?;
        }
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.measurement_id,
            self.taken_at.to_rfc3339(),
            metric(self.height_cm),
            metric(self.width_cm),
            metric(self.leaf_count),
            metric(self.flower_count)
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "TAKEN", "HEIGHT_CM", "WIDTH_CM", "LEAVES", "FLOWERS"]
    }
}
