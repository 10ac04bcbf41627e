//! `status` command.

use std::fmt::Write as _;

use datadebat_core::AppConfig;
use datadebat_search::{collect_status, IndexStatus, SearchClient, SearchConfig};

const UNAVAILABLE: &str = "unavailable";

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub(crate) fn render_status(status: &IndexStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "status at {}",
        status.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    match &status.cluster {
        Ok(cluster) => {
            let _ = writeln!(out, "cluster: {}", cluster.status);
            let _ = writeln!(out, "  nodes: {}", cluster.number_of_nodes);
            let _ = writeln!(
                out,
                "  shards: {} active, {} relocating, {} unassigned",
                cluster.active_shards, cluster.relocating_shards, cluster.unassigned_shards
            );
        }
        Err(e) => {
            let _ = writeln!(out, "cluster: {UNAVAILABLE} ({e})");
        }
    }

    match &status.stats {
        Ok(stats) if !stats.exists => {
            let _ = writeln!(out, "index '{}': does not exist", status.index);
        }
        Ok(stats) => {
            let _ = writeln!(out, "index '{}':", status.index);
            let _ = writeln!(
                out,
                "  documents: {} ({} deleted)",
                stats.documents_count, stats.documents_deleted
            );
            let _ = writeln!(out, "  size: {:.2} MB", megabytes(stats.size_bytes));
            let _ = writeln!(
                out,
                "  indexing: {} operations in {} ms",
                stats.indexing_total, stats.indexing_time_ms
            );
        }
        Err(e) => {
            let _ = writeln!(out, "index '{}': {UNAVAILABLE} ({e})", status.index);
        }
    }

    match &status.documents_by_year {
        Ok(by_year) if by_year.is_empty() => {
            let _ = writeln!(out, "documents by year: none");
        }
        Ok(by_year) => {
            let _ = writeln!(out, "documents by year:");
            for (year, count) in by_year {
                let _ = writeln!(out, "  {year}: {count}");
            }
        }
        Err(e) => {
            let _ = writeln!(out, "documents by year: {UNAVAILABLE} ({e})");
        }
    }
    out
}

/// Never fails on an unreachable cluster; each part reports its own error.
pub(crate) async fn run_status(config: &AppConfig) -> anyhow::Result<()> {
    let client = SearchClient::new(&SearchConfig::from_app_config(config))?;
    let status = collect_status(&client).await;
    print!("{}", render_status(&status));
    Ok(())
}
