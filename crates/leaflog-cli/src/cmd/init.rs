use crate::cmd::Context;
use crate::output::{pretty_kv, render_mode};
use anyhow::{Context as _, Result};
use clap::Args;
use leaflog_core::config::LEAFLOG_DIR;
use leaflog_core::db::{migrations, open_store};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `config.toml` even if `.leaflog/` already exists. The store
    /// itself is never dropped.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[history]\n\
    # Lower bound for `leaf history` when --from is omitted.\n\
    default_from = \"2024-01-01\"\n\
    \n\
    [growth]\n\
    default_days = 30\n\
    \n\
    [reminders]\n\
    # anchored: keep the original cadence; from_occurrence: restart from completion.\n\
    drift_policy = \"anchored\"\n\
    \n\
    [notifications]\n\
    unread_limit = 20\n";

const GITIGNORE: &str = "leaflog.db\nleaflog.db-wal\nleaflog.db-shm\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    directory: String,
    store: String,
    schema_version: u32,
}

/// Execute `leaf init`. Creates the project skeleton:
///
/// ```text
/// .leaflog/
///   leaflog.db    (migrated store)
///   config.toml   (default project config)
///   .gitignore    (store files)
/// ```
///
/// # Errors
///
/// Returns an error if `.leaflog/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, ctx: &Context) -> Result<()> {
    let dir = ctx.project_root.join(LEAFLOG_DIR);
    if dir.exists() && !args.force {
        anyhow::bail!(".leaflog/ already exists. Use `leaf init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let config_path = dir.join("config.toml");
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    std::fs::write(dir.join(".gitignore"), GITIGNORE).context("Failed to write .gitignore")?;

    let conn = open_store(&ctx.store_path)?;
    let schema_version = migrations::current_schema_version(&conn)?;

    tracing::info!(store = %ctx.store_path.display(), schema_version, "initialized leaflog");

    let out = InitOutput {
        directory: dir.display().to_string(),
        store: ctx.store_path.display().to_string(),
        schema_version,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "initialized\t{}\t{}", o.directory, o.store),
        |o, w| {
            writeln!(w, "Initialized leaflog in {}", o.directory)?;
            pretty_kv(w, "Store", &o.store)?;
            pretty_kv(w, "Schema", o.schema_version.to_string())
        },
    )
}
