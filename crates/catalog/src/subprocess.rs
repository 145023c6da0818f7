//! External search command backend
//!
//! Invocations:
//! - search: `command args… -- <query>`
//! - order number only: `command args… --bestell-only -- <query>`
//! - rebuild: `command args… --build`
//!
//! The query always follows `--`, so user text is never parsed as an option.
//! Stdout is the result text. Output starting with the no-match marker means
//! nothing was found.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::CatalogConfig;
use catalog_chat_core::{CatalogBackend, CatalogHit, SearchMode};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;

use crate::{CatalogError, NO_MATCH_PREFIX};

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct SubprocessCatalog {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    rebuild_timeout: Duration,
}

impl SubprocessCatalog {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        rebuild_timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
            rebuild_timeout,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let command = config
            .command
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| CatalogError::Config("catalog.command is required".to_string()))?;
        Ok(Self::new(
            command,
            config.args.clone(),
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.rebuild_timeout_ms),
        ))
    }

    async fn run(&self, extra: &[&str], timeout: Duration) -> Result<String, CatalogError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = std::time::Instant::now();
        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| CatalogError::Timeout(timeout.as_millis() as u64))?
            .map_err(|e| CatalogError::Spawn(format!("{}: {}", self.command, e)))?;

        tracing::debug!(
            command = %self.command,
            status = ?output.status.code(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Search process finished"
        );

        if !output.status.success() {
            return Err(CatalogError::Process {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Map process output to a hit; the no-match marker means no hit
pub fn interpret_output(stdout: &str) -> Option<CatalogHit> {
    let text = stdout.trim();
    if text.starts_with(NO_MATCH_PREFIX) {
        return None;
    }
    Some(CatalogHit::new(text))
}

#[async_trait]
impl CatalogBackend for SubprocessCatalog {
    async fn search(&self, query: &str, mode: SearchMode) -> catalog_chat_core::Result<Option<CatalogHit>> {
        let stdout = match mode {
            SearchMode::Full => self.run(&["--", query], self.timeout).await?,
            SearchMode::OrderNumberOnly => {
                self.run(&["--bestell-only", "--", query], self.timeout).await?
            },
        };
        Ok(interpret_output(&stdout))
    }

    async fn rebuild(&self) -> catalog_chat_core::Result<usize> {
        let stdout = self.run(&["--build"], self.rebuild_timeout).await?;
        let count = FIRST_NUMBER
            .find(&stdout)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        tracing::info!(entries = count, "External catalog index rebuilt");
        Ok(count)
    }

    fn name(&self) -> &str {
        "subprocess"
    }
}
