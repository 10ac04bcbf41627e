use std::path::{Path, PathBuf};

use datadebat_core::ParagraphRecord;

use crate::error::TransformError;

/// Destination of a document's snapshot:
/// `<dir>/<year>/<session date>_<publication number>.json`, with `unknown`
/// and `N-A` standing in for a missing year or date. Several sittings share a
/// date, so the number keeps their files apart; without one the name is the
/// date alone.
#[must_use]
pub fn snapshot_path(output_dir: &Path, records: &[ParagraphRecord]) -> PathBuf {
    let metadata = records.first().map(|r| &r.metadata);
    let year = metadata
        .and_then(|m| m.year)
        .map_or_else(|| "unknown".to_string(), |y| y.to_string());
    let date = metadata
        .and_then(|m| m.session_date)
        .map_or_else(|| "N-A".to_string(), |d| d.format("%Y-%m-%d").to_string());
    let file = match metadata.and_then(|m| m.publication_number) {
        Some(number) => format!("{date}_{number:03}.json"),
        None => format!("{date}.json"),
    };
    output_dir.join(year).join(file)
}

/// Writes `records` as a pretty-printed JSON array and returns the path and
/// the total number of records in the file.
///
/// With `append`, records already in the file are kept in front of the new
/// ones. An existing file that cannot be read as an array is replaced.
///
/// # Errors
///
/// Returns [`TransformError::Io`] when the directory or file cannot be
/// written and [`TransformError::Snapshot`] when serialization fails.
pub fn write_snapshot(
    records: &[ParagraphRecord],
    output_dir: &Path,
    append: bool,
) -> Result<(PathBuf, usize), TransformError> {
    let path = snapshot_path(output_dir, records);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut all: Vec<ParagraphRecord> = if append && path.exists() {
        read_existing(&path)
    } else {
        Vec::new()
    };
    all.extend_from_slice(records);

    let body = serde_json::to_string_pretty(&all).map_err(|source| TransformError::Snapshot {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(&path, body)?;

    tracing::info!(
        path = %path.display(),
        added = records.len(),
        total = all.len(),
        "snapshot written"
    );
    Ok((path, all.len()))
}

fn read_existing(path: &Path) -> Vec<ParagraphRecord> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Vec<ParagraphRecord>>(&raw).map_err(|e| e.to_string()));
    match parsed {
        Ok(existing) => existing,
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "existing snapshot unreadable, replacing it");
            Vec::new()
        }
    }
}
