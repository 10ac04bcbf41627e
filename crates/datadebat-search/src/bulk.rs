//! Batched, idempotent record writes keyed by `para_id`.

use datadebat_core::ParagraphRecord;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::client::SearchClient;
use crate::error::SearchError;
use crate::types::{BulkItem, BulkResponse};

const VERSION_CONFLICT: &str = "version_conflict_engine_exception";

/// How existing documents with the same `para_id` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Overwrite (`index` action).
    Replace,
    /// Keep the stored document (`create` action); conflicts are benign.
    #[default]
    CreateIfAbsent,
}

impl WriteMode {
    fn action(self) -> &'static str {
        match self {
            WriteMode::Replace => "index",
            WriteMode::CreateIfAbsent => "create",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub para_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub indexed: usize,
    /// Records skipped because a document with the same id was already stored.
    pub already_present: usize,
    pub failures: Vec<RecordFailure>,
}

impl WriteReport {
    fn fail(&mut self, para_id: &str, reason: impl Into<String>) {
        self.failures.push(RecordFailure {
            para_id: para_id.to_string(),
            reason: reason.into(),
        });
    }
}

enum ItemOutcome {
    Written,
    AlreadyPresent,
    Failed(String),
}

/// Writes `records` in chunks of `batch_size` and refreshes the index.
///
/// Invalid records are reported without being sent. A chunk whose request
/// fails after retries marks each of its records as failed and the next
/// chunk is still attempted.
///
/// # Errors
///
/// Only the final refresh can fail the call.
pub async fn write_records(
    client: &SearchClient,
    records: &[ParagraphRecord],
    batch_size: usize,
    mode: WriteMode,
) -> Result<WriteReport, SearchError> {
    let mut report = WriteReport::default();

    let mut valid = Vec::with_capacity(records.len());
    for record in records {
        match validate(record) {
            Ok(()) => valid.push(record),
            Err(reason) => report.fail(&record.para_id, reason),
        }
    }

    for chunk in valid.chunks(batch_size.max(1)) {
        let (body, sent) = encode_chunk(client.index(), chunk, mode, &mut report);
        if sent.is_empty() {
            continue;
        }
        match client.bulk(&body).await {
            Ok(response) => classify(&response, &sent, mode, &mut report),
            Err(e) => {
                tracing::warn!(records = sent.len(), error = %e, "bulk request failed");
                let reason = e.to_string();
                for id in &sent {
                    report.fail(id, reason.clone());
                }
            }
        }
    }

    client.refresh().await?;

    tracing::info!(
        indexed = report.indexed,
        already_present = report.already_present,
        failed = report.failures.len(),
        "records written"
    );
    Ok(report)
}

fn validate(record: &ParagraphRecord) -> Result<(), &'static str> {
    if record.para_id.trim().is_empty() {
        return Err("missing para_id");
    }
    if record.text.trim().is_empty() {
        return Err("empty text");
    }
    Ok(())
}

/// NDJSON body for one chunk plus the ids actually included, in order.
fn encode_chunk<'a>(
    index: &str,
    chunk: &[&'a ParagraphRecord],
    mode: WriteMode,
    report: &mut WriteReport,
) -> (String, Vec<&'a str>) {
    let mut body = String::new();
    let mut sent = Vec::with_capacity(chunk.len());
    for record in chunk {
        let source = match serde_json::to_string(record) {
            Ok(source) => source,
            Err(e) => {
                report.fail(&record.para_id, format!("serialization failed: {e}"));
                continue;
            }
        };
        let mut action = Map::new();
        action.insert(
            mode.action().to_string(),
            json!({ "_index": index, "_id": record.para_id }),
        );
        body.push_str(&Value::Object(action).to_string());
        body.push('\n');
        body.push_str(&source);
        body.push('\n');
        sent.push(record.para_id.as_str());
    }
    (body, sent)
}

fn classify(response: &BulkResponse, sent: &[&str], mode: WriteMode, report: &mut WriteReport) {
    for (position, para_id) in sent.iter().enumerate() {
        let item = response
            .items
            .get(position)
            .and_then(|entry| entry.values().next());
        let Some(item) = item else {
            report.fail(para_id, "no result returned for this record");
            continue;
        };
        let id = item.id.as_deref().unwrap_or(*para_id);
        match outcome(item, mode) {
            ItemOutcome::Written => report.indexed += 1,
            ItemOutcome::AlreadyPresent => report.already_present += 1,
            ItemOutcome::Failed(reason) => {
                tracing::debug!(para_id = id, reason = %reason, "record rejected");
                report.fail(id, reason);
            }
        }
    }
}

fn outcome(item: &BulkItem, mode: WriteMode) -> ItemOutcome {
    let conflict = item.status == 409
        || item
            .error
            .as_ref()
            .is_some_and(|e| e.kind == VERSION_CONFLICT);
    if mode == WriteMode::CreateIfAbsent && conflict {
        return ItemOutcome::AlreadyPresent;
    }
    match &item.error {
        Some(error) => ItemOutcome::Failed(error.to_string()),
        None if (200..300).contains(&item.status) => ItemOutcome::Written,
        None => ItemOutcome::Failed(format!("status {}", item.status)),
    }
}
