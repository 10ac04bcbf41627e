use chrono::{Datelike, NaiveDate};
use datadebat_core::SessionMetadata;

use crate::text::node_text;
use crate::xml::XmlNode;

/// Parses publication dates written as `Weekday-DD-MM-MonthName-YYYY`, e.g.
/// `Mercredi-22-05-Mai-2013`.
///
/// Token 1 is the day, token 2 the month and the last token the year, which
/// must have four digits. Impossible dates are rejected.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('-').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let year_token = parts[parts.len() - 1];
    if year_token.len() != 4 {
        return None;
    }
    let day = parts[1].parse::<u32>().ok()?;
    let month = parts[2].parse::<u32>().ok()?;
    let year = year_token.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Reads publication-level fields from the first `Metadonnees` element.
///
/// Missing elements and unparsable values leave the field empty.
#[must_use]
pub fn extract_metadata(tree: &XmlNode) -> SessionMetadata {
    let meta = if tree.name == "Metadonnees" {
        Some(tree)
    } else {
        tree.find("Metadonnees")
    };
    let Some(meta) = meta else {
        tracing::debug!("document has no Metadonnees element");
        return SessionMetadata::default();
    };

    let field = |name: &str| -> Option<String> {
        meta.child(name)
            .map(node_text)
            .filter(|value| !value.is_empty())
    };
    let integer = |name: &str| -> Option<i64> {
        let raw = field(name)?;
        match raw.parse::<i64>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(field = name, value = %raw, error = %e, "ignoring non-numeric metadata field");
                None
            }
        }
    };
    let date = |name: &str| -> Option<NaiveDate> {
        let raw = field(name)?;
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            tracing::debug!(field = name, value = %raw, "ignoring unparsable metadata date");
        }
        parsed
    };

    let session_date = date("DateSeance");

    SessionMetadata {
        publication_number: integer("PublicationNumero"),
        session_date,
        parution_date: date("DateParution"),
        year: session_date.map(|d| d.year()),
        month: session_date.map(|d| d.month()),
        session_name: field("SessionNom"),
        parliamentary_session: field("SessionParlementaire"),
        legislature_number: integer("LegislatureNumero"),
        first_page_number: integer("NumeroPremierePage"),
    }
}
