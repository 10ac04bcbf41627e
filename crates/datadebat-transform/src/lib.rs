//! Archive unpacking and transcript transformation.
//!
//! `unpack` → `extract_metadata` → `walk_sections` (which drives the
//! paragraph assembler and vote extraction) turns one `.taz` publication into
//! an ordered list of [`datadebat_core::ParagraphRecord`]s.

pub mod archive;
pub mod audit;
pub mod error;
pub mod metadata;
pub mod paragraphs;
pub mod pipeline;
pub mod sections;
pub mod snapshot;
pub mod text;
pub mod vote;
pub mod xml;

pub use archive::{unpack, UnpackedDocument};
pub use audit::IdentifierCoverage;
pub use error::TransformError;
pub use metadata::{extract_metadata, parse_date};
pub use paragraphs::{extract_paragraphs, RecordContext};
pub use pipeline::{transform_archive, transform_archive_at, TransformOutput};
pub use sections::walk_sections;
pub use snapshot::{snapshot_path, write_snapshot};
pub use text::{clean_text, strip_speaker_echo};
pub use vote::extract_vote;
pub use xml::{parse_document, XmlNode};
