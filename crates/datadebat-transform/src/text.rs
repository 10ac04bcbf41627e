use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::xml::XmlNode;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Matches a generic speaker header such as `M. le président.` or
/// `Mme Dupont.` at the start of a fragment.
static GENERIC_SPEAKER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:M\.|Mme|Mlle)\.?\s+[^.]+\.\s*").expect("valid regex"));

/// Collapses whitespace runs (including non-breaking spaces) to one space and
/// trims both ends.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}

/// Full recursive text of `node`, whitespace-collapsed.
#[must_use]
pub fn node_text(node: &XmlNode) -> String {
    clean_text(&node.text_content())
}

/// Removes a leading echo of the speaker's name from a paragraph fragment.
///
/// The exact name is tried first, case-insensitively and with an optional
/// trailing period that may be separated from the name by whitespace. When
/// it does not match, a generic civility header is removed instead. Only one
/// of the two is ever stripped.
#[must_use]
pub fn strip_speaker_echo(text: &str, speaker_name: Option<&str>) -> String {
    let text = clean_text(text);

    if let Some(name) = speaker_name.map(str::trim).filter(|n| !n.is_empty()) {
        let pattern = format!(r"^{}\s*\.?\s*", regex::escape(name));
        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(exact) => {
                if let Some(m) = exact.find(&text) {
                    return text[m.end()..].trim().to_string();
                }
            }
            Err(e) => {
                tracing::debug!(speaker = name, error = %e, "speaker name pattern rejected");
            }
        }
    }

    GENERIC_SPEAKER_HEADER.replace(&text, "").trim().to_string()
}
