use thiserror::Error;

/// Errors raised while unpacking or parsing one archive file.
///
/// Every variant is a per-file failure: the orchestrator records it and moves
/// on to the next archive.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no inner archive member ending in '{extension}' found")]
    InnerArchiveNotFound { extension: &'static str },

    #[error("no payload document matching '{prefix}*{extension}' found in {archive}")]
    PayloadNotFound {
        archive: String,
        prefix: &'static str,
        extension: &'static str,
    },

    #[error("XML parse error in {document}: {source}")]
    Xml {
        document: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed payload {document}: {reason}")]
    Malformed { document: String, reason: String },

    #[error("snapshot serialization error for {path}: {source}")]
    Snapshot {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
