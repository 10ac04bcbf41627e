use chrono::{DateTime, Utc};
use datadebat_core::{ParagraphRecord, SessionMetadata};

use crate::archive::unpack;
use crate::error::TransformError;
use crate::metadata::extract_metadata;
use crate::sections::walk_sections;
use crate::xml::XmlNode;

/// Everything produced from one archive.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub inner_name: String,
    pub payload_name: String,
    pub metadata: SessionMetadata,
    pub records: Vec<ParagraphRecord>,
    /// Parsed payload, kept for identifier audits.
    pub tree: XmlNode,
}

/// Unpacks and transforms one archive, stamping records with the current time.
///
/// # Errors
///
/// See [`unpack`].
pub fn transform_archive(archive_bytes: &[u8]) -> Result<TransformOutput, TransformError> {
    transform_archive_at(archive_bytes, Utc::now())
}

/// Same as [`transform_archive`] with an explicit extraction timestamp, so
/// that repeated runs over the same input produce identical records.
///
/// # Errors
///
/// See [`unpack`].
pub fn transform_archive_at(
    archive_bytes: &[u8],
    extracted_at: DateTime<Utc>,
) -> Result<TransformOutput, TransformError> {
    let unpacked = unpack(archive_bytes)?;
    let metadata = extract_metadata(&unpacked.tree);
    let records = walk_sections(&unpacked.tree, &metadata, extracted_at);

    tracing::debug!(
        payload = %unpacked.payload_name,
        publication = ?metadata.publication_number,
        records = records.len(),
        "archive transformed"
    );

    Ok(TransformOutput {
        inner_name: unpacked.inner_name,
        payload_name: unpacked.payload_name,
        metadata,
        records,
        tree: unpacked.tree,
    })
}
