pub mod cache;
pub mod completions;
pub mod dashboard;
pub mod event;
pub mod growth;
pub mod history;
pub mod init;
pub mod measure;
pub mod notifications;
pub mod plant;
pub mod reminder;
pub mod report;
pub mod status;

use crate::output::{CliError, OutputMode, render_error};
use chrono::{DateTime, Utc};
use leaflog_core::config::ProjectConfig;
use leaflog_core::db::try_open_store;
use leaflog_core::time::parse_instant;
use leaflog_core::{ErrorCode, LeafError};
use rusqlite::Connection;
use std::path::PathBuf;

/// Per-invocation state shared by every command handler.
///
/// `now` is sampled once at startup so every derivation in one command sees
/// the same instant.
#[derive(Debug)]
pub struct Context {
    pub project_root: PathBuf,
    pub store_path: PathBuf,
    pub config: ProjectConfig,
    pub output: OutputMode,
    pub now: DateTime<Utc>,
}

impl Context {
    /// Open the existing store, or report that `leaf init` is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is missing or cannot be opened.
    pub fn open_store(&self) -> anyhow::Result<Connection> {
        if let Some(conn) = try_open_store(&self.store_path)? {
            return Ok(conn);
        }
        let code = ErrorCode::NotInitialized;
        render_error(
            self.output,
            &CliError::with_details(
                format!("no leaflog store at {}", self.store_path.display()),
                code.hint().unwrap_or(code.message()),
                code.code(),
            ),
        )?;
        anyhow::bail!("leaflog store not found at {}", self.store_path.display());
    }

    /// Render a core error and convert it for `main`'s exit path.
    pub fn fail(&self, err: LeafError) -> anyhow::Error {
        if let Err(render_err) = render_error(self.output, &CliError::from(&err)) {
            return render_err.context(err.to_string());
        }
        anyhow::Error::new(err)
    }

    /// Run a core call, rendering its error on failure.
    ///
    /// # Errors
    ///
    /// Returns the rendered core error.
    pub fn check<T>(&self, result: leaflog_core::Result<T>) -> anyhow::Result<T> {
        result.map_err(|err| self.fail(err))
    }

    /// Parse an optional `--as-of`/`--at` argument, defaulting to `now`.
    ///
    /// # Errors
    ///
    /// Returns the rendered validation error for an unparseable instant.
    pub fn instant_or_now(&self, raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
        match raw {
            Some(raw) => self.check(parse_instant(raw)),
            None => Ok(self.now),
        }
    }
}
