//! Request and response shapes of the search-engine HTTP API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Exact-match condition on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct TermFilter {
    pub field: String,
    pub value: Value,
}

impl TermFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// `bool.filter` query over `filters`; `match_all` when empty.
#[must_use]
pub fn filter_query(filters: &[TermFilter]) -> Value {
    if filters.is_empty() {
        return json!({ "match_all": {} });
    }
    let terms: Vec<Value> = filters
        .iter()
        .map(|f| {
            let mut term = serde_json::Map::new();
            term.insert(f.field.clone(), f.value.clone());
            json!({ "term": term })
        })
        .collect();
    json!({ "bool": { "filter": terms } })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    /// One single-key object per action, keyed by the action name.
    #[serde(default)]
    pub items: Vec<BTreeMap<String, BulkItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl std::fmt::Display for BulkItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => f.write_str(&self.kind),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResponse<T> {
    pub hits: Hits<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Hits<T> {
    #[serde(default = "Vec::new")]
    pub hits: Vec<Hit<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Hit<T> {
    #[serde(rename = "_source")]
    pub source: T,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MultiGetResponse<T> {
    #[serde(default = "Vec::new")]
    pub docs: Vec<MultiGetDoc<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MultiGetDoc<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub found: bool,
    #[serde(rename = "_source", default = "Option::default")]
    pub source: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AggregationResponse {
    pub aggregations: YearAggregations,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct YearAggregations {
    pub by_year: TermsAggregation,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TermsAggregation {
    #[serde(default)]
    pub buckets: Vec<TermsBucket>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TermsBucket {
    pub key: Value,
    pub doc_count: u64,
}

impl TermsBucket {
    pub(crate) fn key_string(&self) -> String {
        match &self.key {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealth {
    /// `green`, `yellow` or `red`.
    pub status: String,
    pub number_of_nodes: u32,
    pub active_shards: u32,
    pub relocating_shards: u32,
    pub unassigned_shards: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub exists: bool,
    pub documents_count: u64,
    pub documents_deleted: u64,
    pub size_bytes: u64,
    pub indexing_total: u64,
    pub indexing_time_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatsResponse {
    #[serde(rename = "_all")]
    pub all: StatsScope,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatsScope {
    pub primaries: PrimaryStats,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PrimaryStats {
    pub docs: DocStats,
    pub store: StoreStats,
    pub indexing: IndexingStats,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DocStats {
    pub count: u64,
    pub deleted: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StoreStats {
    pub size_in_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IndexingStats {
    pub index_total: u64,
    pub index_time_in_millis: u64,
}

impl From<StatsResponse> for IndexStats {
    fn from(stats: StatsResponse) -> Self {
        let p = stats.all.primaries;
        Self {
            exists: true,
            documents_count: p.docs.count,
            documents_deleted: p.docs.deleted,
            size_bytes: p.store.size_in_bytes,
            indexing_total: p.indexing.index_total,
            indexing_time_ms: p.indexing.index_time_in_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_list_matches_everything() {
        assert_eq!(filter_query(&[]), json!({ "match_all": {} }));
    }

    #[test]
    fn filters_become_term_clauses() {
        let query = filter_query(&[
            TermFilter::new("annee", 2022),
            TermFilter::new("publication_numero", 4),
        ]);
        assert_eq!(
            query,
            json!({ "bool": { "filter": [
                { "term": { "annee": 2022 } },
                { "term": { "publication_numero": 4 } }
            ] } })
        );
    }

    #[test]
    fn bulk_items_parse_with_and_without_errors() {
        let body = json!({
            "errors": true,
            "items": [
                { "create": { "_id": "1", "status": 201 } },
                { "create": { "_id": "2", "status": 409, "error": {
                    "type": "version_conflict_engine_exception",
                    "reason": "[2]: version conflict, document already exists"
                } } }
            ]
        });
        let parsed: BulkResponse = serde_json::from_value(body).unwrap();
        assert!(parsed.errors);
        let second = &parsed.items[1]["create"];
        assert_eq!(second.status, 409);
        assert_eq!(
            second.error.as_ref().map(|e| e.kind.as_str()),
            Some("version_conflict_engine_exception")
        );
    }

    #[test]
    fn numeric_bucket_keys_render_without_quotes() {
        let bucket = TermsBucket {
            key: json!(2022),
            doc_count: 3,
        };
        assert_eq!(bucket.key_string(), "2022");
        let bucket = TermsBucket {
            key: json!("2021"),
            doc_count: 3,
        };
        assert_eq!(bucket.key_string(), "2021");
    }
}
