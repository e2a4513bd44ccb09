use crate::cmd::Context;
use crate::output::{Renderable, fmt_instant, render_list, write_json};
use anyhow::Result;
use clap::Args;
use leaflog_core::history::resolve_range;
use leaflog_core::{StatusTransition, history};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    pub plant_id: i64,
    /// Start of the range. Defaults to `[history] default_from`.
    #[arg(long)]
    pub from: Option<String>,
    /// End of the range (inclusive). Defaults to now.
    #[arg(long)]
    pub to: Option<String>,
}

/// Execute `leaf history`: the status in effect at `from`, then every
/// change up to and including `to`.
///
/// # Errors
///
/// Returns an error for an unknown plant, an unparseable bound, an inverted
/// range, or a missing store.
pub fn run_history(args: &HistoryArgs, ctx: &Context) -> Result<()> {
    let default_from = ctx.config.history.default_from_instant()?;
    let (from, to) = ctx.check(resolve_range(
        args.from.as_deref(),
        args.to.as_deref(),
        default_from,
        ctx.now,
    ))?;

    let conn = ctx.open_store()?;
    let transitions = ctx.check(history(&conn, args.plant_id, from, to))?;
    render_list(&transitions, ctx.output, "No status history in range.")?;
    Ok(())
}

impl Renderable for StatusTransition {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{:<16}  {}", fmt_instant(self.at), self.status)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}\t{}", self.at.to_rfc3339(), self.status)
    }

    fn table_headers() -> &'static [&'static str] {
        &["AT", "STATUS"]
    }
}
