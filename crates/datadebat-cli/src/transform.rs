//! `transform` command: one archive to a JSON snapshot, no indexing.

use std::path::{Path, PathBuf};

use anyhow::Context;
use datadebat_core::AppConfig;
use datadebat_transform::{transform_archive, write_snapshot};

/// Returns the snapshot path and the number of records it now holds.
///
/// # Errors
///
/// Fails when the archive cannot be read or transformed, yields no
/// paragraphs, or the snapshot cannot be written.
pub(crate) fn transform_to_snapshot(
    archive: &Path,
    output_dir: &Path,
    append: bool,
) -> anyhow::Result<(PathBuf, usize)> {
    let bytes = std::fs::read(archive).with_context(|| format!("cannot read {}", archive.display()))?;
    let output = transform_archive(&bytes)
        .with_context(|| format!("failed to transform {}", archive.display()))?;
    if output.records.is_empty() {
        anyhow::bail!("no paragraphs extracted from {}", archive.display());
    }
    let written = write_snapshot(&output.records, output_dir, append)?;
    tracing::info!(
        archive = %archive.display(),
        payload = %output.payload_name,
        records = output.records.len(),
        "archive transformed"
    );
    Ok(written)
}

pub(crate) async fn run_transform(
    config: &AppConfig,
    archive: &Path,
    output_dir: Option<PathBuf>,
    append: bool,
) -> anyhow::Result<()> {
    let archive = archive.to_path_buf();
    let output_dir = output_dir.unwrap_or_else(|| config.transformed_dir.clone());
    let (path, total) =
        tokio::task::spawn_blocking(move || transform_to_snapshot(&archive, &output_dir, append))
            .await??;
    println!("{total} records written to {}", path.display());
    Ok(())
}
