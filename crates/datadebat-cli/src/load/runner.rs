//! Per-file pipeline and the bounded worker pool driving it.
//!
//! Each archive goes through: optional already-indexed check, unpack and
//! transform on the blocking pool, optional snapshot, optional bulk write.
//! A failing file is recorded and the run moves on.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use datadebat_core::ParagraphRecord;
use datadebat_search::{write_records, SearchClient, TermFilter, WriteMode, WriteReport};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use super::discovery::{discover, ArchiveFile};

pub(crate) const NO_PARAGRAPHS: &str = "no paragraphs extracted";

#[derive(Debug, Clone)]
pub(crate) struct SnapshotOptions {
    pub dir: PathBuf,
    pub append: bool,
    /// Held for the read-merge-write of one snapshot file.
    write_lock: Arc<Mutex<()>>,
}

impl SnapshotOptions {
    pub(crate) fn new(dir: PathBuf, append: bool) -> Self {
        Self {
            dir,
            append,
            write_lock: Arc::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub parallel: bool,
    pub workers: usize,
    pub skip_existing: bool,
    pub years: Vec<i32>,
    pub index_to_store: bool,
    pub snapshot: Option<SnapshotOptions>,
    pub mode: WriteMode,
    pub batch_size: usize,
}

impl RunOptions {
    fn concurrency(&self) -> usize {
        if self.parallel {
            self.workers.max(1)
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FileOutcome {
    Success {
        records: usize,
        write: Option<WriteReport>,
    },
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Statistics {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub documents_indexed: usize,
    #[serde(default)]
    pub documents_already_present: usize,
    #[serde(default)]
    pub records_rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FileError {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RunStats {
    pub statistics: Statistics,
    pub errors: Vec<FileError>,
}

impl RunStats {
    fn completed(&self) -> usize {
        self.statistics.success + self.statistics.failed + self.statistics.skipped
    }

    fn record(&mut self, file: &Path, outcome: &FileOutcome) {
        let stats = &mut self.statistics;
        match outcome {
            FileOutcome::Success { write, .. } => {
                stats.success += 1;
                if let Some(write) = write {
                    stats.documents_indexed += write.indexed;
                    stats.documents_already_present += write.already_present;
                    stats.records_rejected += write.failures.len();
                    if let Some(first) = write.failures.first() {
                        self.errors.push(FileError {
                            file: file.display().to_string(),
                            error: format!(
                                "{} records rejected, first {}: {}",
                                write.failures.len(),
                                first.para_id,
                                first.reason
                            ),
                        });
                    }
                }
            }
            FileOutcome::Failed(reason) => {
                stats.failed += 1;
                self.errors.push(FileError {
                    file: file.display().to_string(),
                    error: reason.clone(),
                });
            }
            FileOutcome::Skipped => stats.skipped += 1,
        }
    }
}

/// Receives per-file progress from [`run`].
pub(crate) trait ProgressObserver: Sync {
    fn run_started(&self, _total: usize) {}
    fn file_finished(&self, file: &ArchiveFile, outcome: &FileOutcome, done: usize, total: usize);
}

/// Reports progress through `tracing`.
pub(crate) struct LogProgress;

impl ProgressObserver for LogProgress {
    fn run_started(&self, total: usize) {
        tracing::info!(total, "processing archives");
    }

    fn file_finished(&self, file: &ArchiveFile, outcome: &FileOutcome, done: usize, total: usize) {
        let path = file.path.display();
        match outcome {
            FileOutcome::Success { records, write } => tracing::info!(
                file = %path,
                records,
                indexed = write.as_ref().map_or(0, |w| w.indexed),
                done,
                total,
                "archive loaded"
            ),
            FileOutcome::Failed(reason) => {
                tracing::warn!(file = %path, error = %reason, done, total, "archive failed");
            }
            FileOutcome::Skipped => {
                tracing::info!(file = %path, done, total, "archive already indexed, skipped");
            }
        }
    }
}

/// Discovers the archives under `root` and runs each through the pipeline.
///
/// # Errors
///
/// Fails when discovery fails, or when indexing is requested without a
/// store. Per-file failures only show up in the returned statistics.
pub(crate) async fn run(
    root: &Path,
    options: &RunOptions,
    store: Option<&SearchClient>,
    observer: &dyn ProgressObserver,
) -> anyhow::Result<RunStats> {
    if options.index_to_store && store.is_none() {
        anyhow::bail!("indexing requested without a search client");
    }
    let store = store.filter(|_| options.index_to_store);

    let files: Vec<ArchiveFile> = discover(root, &options.years)?
        .into_values()
        .flatten()
        .collect();
    let total = files.len();
    let stats = Mutex::new(RunStats {
        statistics: Statistics {
            total,
            ..Statistics::default()
        },
        errors: Vec::new(),
    });
    observer.run_started(total);

    stream::iter(&files)
        .for_each_concurrent(options.concurrency(), |file| {
            let stats = &stats;
            async move {
                let outcome = process_file(file, options, store).await;
                let done = {
                    let mut guard = stats.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.record(&file.path, &outcome);
                    guard.completed()
                };
                observer.file_finished(file, &outcome, done, total);
            }
        })
        .await;

    Ok(stats.into_inner().unwrap_or_else(PoisonError::into_inner))
}

pub(crate) async fn process_file(
    file: &ArchiveFile,
    options: &RunOptions,
    store: Option<&SearchClient>,
) -> FileOutcome {
    if options.skip_existing {
        if let Some(store) = store {
            if already_indexed(store, file).await {
                return FileOutcome::Skipped;
            }
        }
    }

    let path = file.path.clone();
    let snapshot = options.snapshot.clone();
    let transformed =
        tokio::task::spawn_blocking(move || transform_file(&path, snapshot.as_ref())).await;
    let records = match transformed {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => return FileOutcome::Failed(format!("{e:#}")),
        Err(e) => return FileOutcome::Failed(format!("transform task failed: {e}")),
    };

    let Some(store) = store else {
        return FileOutcome::Success {
            records: records.len(),
            write: None,
        };
    };
    match write_records(store, &records, options.batch_size, options.mode).await {
        Ok(report) => FileOutcome::Success {
            records: records.len(),
            write: Some(report),
        },
        Err(e) => FileOutcome::Failed(format!("indexing failed: {e}")),
    }
}

/// Counts documents of the file's publication. Any failure is treated as
/// "not indexed" so the file is processed.
async fn already_indexed(store: &SearchClient, file: &ArchiveFile) -> bool {
    let Some(key) = file.publication else {
        return false;
    };
    let filters = [
        TermFilter::new("annee", key.year),
        TermFilter::new("publication_numero", key.number),
    ];
    match store.count(&filters).await {
        Ok(count) => count > 0,
        Err(e) => {
            tracing::warn!(
                file = %file.path.display(),
                error = %e,
                "already-indexed check failed, processing file"
            );
            false
        }
    }
}

fn transform_file(
    path: &Path,
    snapshot: Option<&SnapshotOptions>,
) -> anyhow::Result<Vec<ParagraphRecord>> {
    use anyhow::Context;

    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let output = datadebat_transform::transform_archive(&bytes)?;
    if output.records.is_empty() {
        anyhow::bail!(NO_PARAGRAPHS);
    }
    if let Some(snapshot) = snapshot {
        let _guard = snapshot
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        datadebat_transform::write_snapshot(&output.records, &snapshot.dir, snapshot.append)
            .context("snapshot write failed")?;
    }
    Ok(output.records)
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
