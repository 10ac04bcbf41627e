//! Paragraph assembly.
//!
//! Consecutive `Para` nodes sharing an `idsyceron` are fragments of one
//! utterance split by page breaks or interjections. The assembler is a fold
//! over a container's direct `Para` children whose state is the list of
//! emitted records plus the record still open for continuation.

use chrono::{DateTime, Utc};
use datadebat_core::{ParagraphRecord, SectionContext, SessionMetadata, SpeakerRole};

use crate::text::{node_text, strip_speaker_echo};
use crate::xml::XmlNode;

pub const PARAGRAPH_TAG: &str = "Para";
pub const PARA_ID_ATTRIBUTE: &str = "idsyceron";

/// Fields every record below a section or subsection starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordContext {
    pub metadata: SessionMetadata,
    pub section: SectionContext,
}

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub emitted: Vec<ParagraphRecord>,
    pub open: Option<ParagraphRecord>,
}

impl Assembly {
    /// Closes the open record and returns everything in document order.
    #[must_use]
    pub fn finish(self) -> Vec<ParagraphRecord> {
        let mut records = self.emitted;
        records.extend(self.open);
        records
    }
}

/// One fold transition.
///
/// A node without an identifier leaves the state untouched. A node carrying
/// the open record's identifier is appended to it; any other identifier
/// closes the open record and opens a new one.
#[must_use]
pub fn step(
    state: Assembly,
    para: &XmlNode,
    base: &RecordContext,
    extracted_at: DateTime<Utc>,
) -> Assembly {
    let Assembly { mut emitted, open } = state;
    let Some(para_id) = para.attr(PARA_ID_ATTRIBUTE) else {
        return Assembly { emitted, open };
    };

    match open {
        Some(mut current) if current.para_id == para_id => {
            let fragment =
                strip_speaker_echo(&para.text_content(), current.speaker_name.as_deref());
            if !fragment.is_empty() {
                if !current.text.is_empty() {
                    current.text.push(' ');
                }
                current.text.push_str(&fragment);
            }
            Assembly {
                emitted,
                open: Some(current),
            }
        }
        previous => {
            emitted.extend(previous);
            Assembly {
                emitted,
                open: Some(open_record(para, para_id, base, extracted_at)),
            }
        }
    }
}

/// Assembles the direct `Para` children of `container`.
///
/// Empty records are kept; filtering is the caller's decision.
#[must_use]
pub fn extract_paragraphs(
    container: &XmlNode,
    base: &RecordContext,
    extracted_at: DateTime<Utc>,
) -> Vec<ParagraphRecord> {
    container
        .children_named(PARAGRAPH_TAG)
        .fold(Assembly::default(), |state, para| {
            step(state, para, base, extracted_at)
        })
        .finish()
}

/// Name from the first `Orateur/Nom` below the paragraph.
#[must_use]
pub fn extract_speaker(para: &XmlNode) -> Option<String> {
    para.find("Orateur")
        .and_then(|orateur| orateur.child("Nom"))
        .map(node_text)
        .filter(|name| !name.is_empty())
}

fn open_record(
    para: &XmlNode,
    para_id: &str,
    base: &RecordContext,
    extracted_at: DateTime<Utc>,
) -> ParagraphRecord {
    let speaker_name = extract_speaker(para);
    let text = strip_speaker_echo(&para.text_content(), speaker_name.as_deref());
    ParagraphRecord {
        para_id: para_id.to_string(),
        metadata: base.metadata.clone(),
        section: base.section.clone(),
        speaker_role: SpeakerRole::from_speaker_name(speaker_name.as_deref()),
        speaker_name,
        text,
        extraction_timestamp: extracted_at,
        vote_present: false,
        vote: None,
    }
}
