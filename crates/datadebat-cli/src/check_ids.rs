//! `check-ids` command: identifier coverage of one archive, optionally
//! compared with what the index holds for the same publication.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use datadebat_core::{AppConfig, ParagraphRecord, SessionMetadata};
use datadebat_search::{SearchClient, TermFilter};
use datadebat_transform::{transform_archive, IdentifierCoverage};
use serde::Serialize;

/// Ids listed inline before the output points to `--report`.
const LISTED_IDS: usize = 20;

/// Headroom over the extracted record count when searching for stale ids.
const STALE_SEARCH_MARGIN: usize = 1_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct IndexComparison {
    /// Extracted records found in the index.
    pub indexed: usize,
    pub not_indexed: Vec<String>,
    /// Indexed ids of this publication that the archive no longer yields.
    pub stale: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    archive: String,
    payload: &'a str,
    publication_numero: Option<i64>,
    records: usize,
    match_rate: f64,
    exact: bool,
    coverage: &'a IdentifierCoverage,
    index: Option<&'a IndexComparison>,
}

fn preview(ids: &[String]) -> String {
    let shown: Vec<&str> = ids.iter().take(LISTED_IDS).map(String::as_str).collect();
    if ids.len() > LISTED_IDS {
        format!("{} (+{} more)", shown.join(", "), ids.len() - LISTED_IDS)
    } else {
        shown.join(", ")
    }
}

pub(crate) fn render_coverage(coverage: &IdentifierCoverage) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "source ids: {} ({} unique)",
        coverage.raw_total, coverage.raw_unique
    );
    let _ = writeln!(
        out,
        "record ids: {} ({} unique)",
        coverage.output_total, coverage.output_unique
    );
    let _ = writeln!(
        out,
        "common: {} ({:.2}%)",
        coverage.common,
        coverage.match_rate()
    );
    if !coverage.missing.is_empty() {
        let _ = writeln!(out, "missing ({}): {}", coverage.missing.len(), preview(&coverage.missing));
        for (tag, count) in &coverage.missing_tags {
            let _ = writeln!(out, "  <{tag}>: {count}");
        }
    }
    if !coverage.spurious.is_empty() {
        let _ = writeln!(out, "spurious ({}): {}", coverage.spurious.len(), preview(&coverage.spurious));
    }
    if !coverage.raw_duplicates.is_empty() {
        let _ = writeln!(
            out,
            "ids repeated in the source (merged): {}",
            coverage.raw_duplicates.len()
        );
    }
    if !coverage.output_duplicates.is_empty() {
        let _ = writeln!(
            out,
            "ids repeated in the records: {}",
            coverage.output_duplicates.len()
        );
    }
    out
}

/// Looks up the extracted ids in the index, then lists indexed documents of
/// the same publication that were not extracted this time. The second step
/// needs both the year and the publication number.
///
/// # Errors
///
/// Returns the first failing search request.
pub(crate) async fn compare_with_index(
    client: &SearchClient,
    metadata: &SessionMetadata,
    records: &[ParagraphRecord],
) -> anyhow::Result<IndexComparison> {
    let ids: Vec<String> = records.iter().map(|r| r.para_id.clone()).collect();
    let found = client
        .multi_get(&ids)
        .await
        .context("multi-get of extracted ids failed")?;
    let not_indexed: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains_key(*id))
        .cloned()
        .collect();

    let stale = match (metadata.year, metadata.publication_number) {
        (Some(year), Some(number)) => {
            let filters = [
                TermFilter::new("annee", year),
                TermFilter::new("publication_numero", number),
            ];
            let extracted: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
            let indexed = client
                .search_terms(&filters, records.len() + STALE_SEARCH_MARGIN)
                .await
                .context("search for indexed publication records failed")?;
            indexed
                .into_iter()
                .map(|r| r.para_id)
                .filter(|id| !extracted.contains(id.as_str()))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }
        (year, number) => {
            tracing::warn!(
                ?year,
                ?number,
                "publication not fully identified, stale ids not checked"
            );
            Vec::new()
        }
    };

    Ok(IndexComparison {
        indexed: found.len(),
        not_indexed,
        stale,
    })
}

pub(crate) async fn run_check_ids(
    config: &AppConfig,
    archive: &Path,
    report_path: Option<&Path>,
    against_index: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(archive)
        .await
        .with_context(|| format!("cannot read {}", archive.display()))?;
    let output = tokio::task::spawn_blocking(move || transform_archive(&bytes))
        .await?
        .with_context(|| format!("failed to transform {}", archive.display()))?;

    let coverage = IdentifierCoverage::compare(&output.tree, &output.records);
    println!("{} ({})", archive.display(), output.payload_name);
    print!("{}", render_coverage(&coverage));

    let index = if against_index {
        let client = crate::connect_search(config).await?;
        let comparison = compare_with_index(&client, &output.metadata, &output.records).await?;
        println!(
            "index: {} of {} records present",
            comparison.indexed,
            output.records.len()
        );
        if !comparison.not_indexed.is_empty() {
            println!("  not indexed: {}", preview(&comparison.not_indexed));
        }
        if !comparison.stale.is_empty() {
            println!("  stale in index: {}", preview(&comparison.stale));
        }
        Some(comparison)
    } else {
        None
    };

    if let Some(path) = report_path {
        let report = CheckReport {
            archive: archive.display().to_string(),
            payload: &output.payload_name,
            publication_numero: output.metadata.publication_number,
            records: output.records.len(),
            match_rate: coverage.match_rate(),
            exact: coverage.is_exact(),
            coverage: &coverage,
            index: index.as_ref(),
        };
        let body = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
        println!("report written to {}", path.display());
    }

    if coverage.is_exact() {
        println!("identifier coverage is exact");
    } else {
        println!("identifier coverage is not exact");
    }
    Ok(())
}
