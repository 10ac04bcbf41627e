//! Bulk writer behaviour against a mocked search engine.

use chrono::{TimeZone, Utc};
use datadebat_core::{ParagraphRecord, SectionContext, SessionMetadata, SpeakerRole};
use datadebat_search::{write_records, SearchClient, SearchConfig, WriteMode};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> SearchClient {
    SearchClient::new(&SearchConfig {
        url: server.uri(),
        index: "debats".to_string(),
        timeout_secs: 5,
        max_retries: 0,
        backoff_base_ms: 0,
        user_agent: "datadebat-test".to_string(),
    })
    .expect("client construction should not fail")
}

fn record(id: &str, text: &str) -> ParagraphRecord {
    ParagraphRecord {
        para_id: id.to_string(),
        metadata: SessionMetadata {
            publication_number: Some(4),
            year: Some(2022),
            ..SessionMetadata::default()
        },
        section: SectionContext::default(),
        speaker_name: Some("M. Thomas Mesnier".to_string()),
        speaker_role: SpeakerRole::Deputy,
        text: text.to_string(),
        extraction_timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        vote_present: false,
        vote: None,
    }
}

async fn mount_refresh(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/debats/_refresh"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn item_results_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(body_string_contains(r#""create":"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": true,
            "items": [
                { "create": { "_id": "1", "status": 201 } },
                { "create": { "_id": "2", "status": 409, "error": {
                    "type": "version_conflict_engine_exception",
                    "reason": "[2]: version conflict, document already exists"
                } } },
                { "create": { "_id": "3", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [annee]"
                } } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, 200).await;

    let records = vec![
        record("1", "Premier."),
        record("2", "Deuxième."),
        record("3", "Troisième."),
        record("4", "   "),
    ];
    let client = test_client(&server);
    let report = write_records(&client, &records, 500, WriteMode::CreateIfAbsent)
        .await
        .expect("write should complete");

    assert_eq!(report.indexed, 1);
    assert_eq!(report.already_present, 1);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.para_id.as_str()).collect();
    assert_eq!(failed, vec!["4", "3"]);
    assert_eq!(report.failures[0].reason, "empty text");
    assert!(report.failures[1].reason.contains("mapper_parsing_exception"));
}

#[tokio::test]
async fn failed_chunk_does_not_stop_later_chunks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(body_string_contains(r#""_id":"1""#))
        .respond_with(ResponseTemplate::new(500).set_body_string("node restarting"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(body_string_contains(r#""_id":"2""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": false,
            "items": [ { "index": { "_id": "2", "status": 200 } } ]
        })))
        .mount(&server)
        .await;
    mount_refresh(&server, 200).await;

    let records = vec![record("1", "Premier."), record("2", "Deuxième.")];
    let client = test_client(&server);
    let report = write_records(&client, &records, 1, WriteMode::Replace)
        .await
        .expect("write should complete");

    assert_eq!(report.indexed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].para_id, "1");
    assert!(report.failures[0].reason.contains("500"));
}

#[tokio::test]
async fn refresh_failure_fails_the_write() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": false,
            "items": [ { "create": { "_id": "1", "status": 201 } } ]
        })))
        .mount(&server)
        .await;
    mount_refresh(&server, 403).await;

    let client = test_client(&server);
    let err = write_records(&client, &[record("1", "Premier.")], 10, WriteMode::CreateIfAbsent)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn nothing_valid_sends_no_bulk_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_refresh(&server, 200).await;

    let client = test_client(&server);
    let report = write_records(&client, &[record("", "Sans identifiant.")], 10, WriteMode::CreateIfAbsent)
        .await
        .unwrap();
    assert_eq!(report.indexed, 0);
    assert_eq!(report.failures[0].reason, "missing para_id");
}
