//! Run report: one entry appended per `load` run to a JSON history file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::runner::{FileError, RunStats, Statistics};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunReport {
    pub run_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub statistics: Statistics,
    pub documents_by_year: BTreeMap<String, u64>,
    pub errors: Vec<FileError>,
}

impl RunReport {
    pub(crate) fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        stats: RunStats,
        documents_by_year: BTreeMap<String, u64>,
    ) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let duration_seconds = (end_time - start_time).num_milliseconds() as f64 / 1000.0;
        Self {
            run_id: Uuid::new_v4(),
            start_time,
            end_time,
            duration_seconds,
            statistics: stats.statistics,
            documents_by_year,
            errors: stats.errors,
        }
    }
}

/// Previous runs stored at `path`. Older files held a single run object or a
/// bare array of runs; both are migrated. Unreadable content is moved to
/// [`backup_path`] and a fresh history starts.
fn existing_runs(path: &Path) -> Vec<Value> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let problem = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(mut object)) => {
            return match object.remove("runs") {
                Some(Value::Array(runs)) => runs,
                Some(_) | None => vec![Value::Object(object)],
            }
        }
        Ok(Value::Array(runs)) => return runs,
        Ok(_) => "unexpected shape".to_string(),
        Err(e) => e.to_string(),
    };

    let backup = backup_path(path);
    match std::fs::rename(path, &backup) {
        Ok(()) => tracing::warn!(
            path = %path.display(),
            backup = %backup.display(),
            error = %problem,
            "run report unreadable, moved aside and starting a new history"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %problem,
            rename_error = %e,
            "run report unreadable and could not be moved aside, starting a new history"
        ),
    }
    Vec::new()
}

/// `<path>.bak`, next to the report.
fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Appends `report` to the `runs` array at `path` and returns the number of
/// runs now stored.
///
/// # Errors
///
/// Returns an error if the file or its parent directory cannot be written.
pub(crate) fn append_run(path: &Path, report: &RunReport) -> anyhow::Result<usize> {
    let mut runs = existing_runs(path);
    runs.push(serde_json::to_value(report).context("failed to serialize run report")?);
    let count = runs.len();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(&json!({ "runs": runs }))?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), runs = count, "run report saved");
    Ok(count)
}
