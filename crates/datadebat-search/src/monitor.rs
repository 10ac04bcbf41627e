use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::client::SearchClient;
use crate::types::{ClusterHealth, IndexStats};

/// Snapshot of cluster and index state. Each part carries its own error so a
/// failing endpoint does not hide the others.
#[derive(Debug, Clone)]
pub struct IndexStatus {
    pub checked_at: DateTime<Utc>,
    pub index: String,
    pub cluster: Result<ClusterHealth, String>,
    pub stats: Result<IndexStats, String>,
    pub documents_by_year: Result<BTreeMap<String, u64>, String>,
}

pub async fn collect_status(client: &SearchClient) -> IndexStatus {
    let (cluster, stats, by_year) = tokio::join!(
        client.cluster_health(),
        client.index_stats(),
        client.documents_by_year()
    );

    for (part, error) in [
        ("cluster", cluster.as_ref().err()),
        ("index stats", stats.as_ref().err()),
        ("documents by year", by_year.as_ref().err()),
    ] {
        if let Some(e) = error {
            tracing::warn!(part, error = %e, "status part unavailable");
        }
    }

    IndexStatus {
        checked_at: Utc::now(),
        index: client.index().to_string(),
        cluster: cluster.map_err(|e| e.to_string()),
        stats: stats.map_err(|e| e.to_string()),
        documents_by_year: by_year.map_err(|e| e.to_string()),
    }
}
