//! Paragraph record model shared by the transform pipeline and the search loader.
//!
//! Rust field names are English; the serialized names follow the persisted
//! index schema that downstream analyses read (`texte`, `orateur_nom`,
//! `annee`, ...). Absent optional values are omitted from the document.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Publication-level fields read once per payload document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(
        rename = "publication_numero",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publication_number: Option<i64>,
    #[serde(rename = "date_seance", default, skip_serializing_if = "Option::is_none")]
    pub session_date: Option<NaiveDate>,
    #[serde(
        rename = "date_parution",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parution_date: Option<NaiveDate>,
    #[serde(rename = "annee", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "mois", default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(rename = "session_nom", default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(
        rename = "session_parlementaire",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parliamentary_session: Option<String>,
    #[serde(rename = "legislature", default, skip_serializing_if = "Option::is_none")]
    pub legislature_number: Option<i64>,
    #[serde(
        rename = "numero_premiere_page",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_page_number: Option<i64>,
}

/// Section and subsection titles inherited by every paragraph below them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(rename = "section_titre", default, skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    #[serde(
        rename = "sous_section_titre",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subsection_title: Option<String>,
}

/// Role of a speaker, inferred from the speaker's displayed name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerRole {
    #[serde(rename = "Président")]
    President,
    #[serde(rename = "Ministre")]
    Minister,
    #[serde(rename = "Secrétaire")]
    Secretary,
    #[serde(rename = "Député")]
    Deputy,
    #[default]
    #[serde(rename = "Inconnu")]
    Unknown,
}

impl SpeakerRole {
    /// Infers the role from keywords in the speaker name.
    ///
    /// `"M. le président"` and `"Mme la présidente"` are presidents,
    /// `"M. le ministre de l'intérieur"` a minister. Any other non-empty name
    /// is a deputy; no name at all is [`SpeakerRole::Unknown`].
    #[must_use]
    pub fn from_speaker_name(name: Option<&str>) -> Self {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Self::Unknown;
        };
        let lower = name.to_lowercase();
        if lower.contains("président") {
            Self::President
        } else if lower.contains("ministre") {
            Self::Minister
        } else if lower.contains("secrétaire") {
            Self::Secretary
        } else {
            Self::Deputy
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::President => "Président",
            Self::Minister => "Ministre",
            Self::Secretary => "Secrétaire",
            Self::Deputy => "Député",
            Self::Unknown => "Inconnu",
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts from a voting-result block. Any subset may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteFields {
    #[serde(
        rename = "nombre_votants",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub voters_count: Option<i64>,
    #[serde(
        rename = "nombre_suffrages_exprimes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expressed_suffrages: Option<i64>,
    #[serde(rename = "votes_pour", default, skip_serializing_if = "Option::is_none")]
    pub votes_for: Option<i64>,
    #[serde(rename = "votes_contre", default, skip_serializing_if = "Option::is_none")]
    pub votes_against: Option<i64>,
}

/// One logical utterance: the unit persisted in the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    /// Stable cross-run key (`idsyceron` in the source markup).
    pub para_id: String,
    #[serde(flatten)]
    pub metadata: SessionMetadata,
    #[serde(flatten)]
    pub section: SectionContext,
    #[serde(rename = "orateur_nom", default, skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
    #[serde(rename = "orateur_fonction", default)]
    pub speaker_role: SpeakerRole,
    #[serde(rename = "texte")]
    pub text: String,
    pub extraction_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub vote_present: bool,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<VoteFields>,
}

impl ParagraphRecord {
    /// Marks this record as carrying the section's vote result.
    pub fn attach_vote(&mut self, vote: VoteFields) {
        self.vote_present = true;
        self.vote = Some(vote);
    }
}
