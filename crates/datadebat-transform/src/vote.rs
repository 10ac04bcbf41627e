use datadebat_core::VoteFields;

use crate::xml::XmlNode;

pub const VOTE_TAG: &str = "ResultatVote";

/// Reads the first voting-result block under `section`.
///
/// Each count is optional on its own; a block with no readable count still
/// yields an empty [`VoteFields`] so the vote is flagged as present.
#[must_use]
pub fn extract_vote(section: &XmlNode) -> Option<VoteFields> {
    let block = section.find(VOTE_TAG)?;
    let count = |name: &str| -> Option<i64> {
        let value = block.find_path(&[name, "Valeur"])?.text_content();
        let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        match digits.parse::<i64>() {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::debug!(field = name, value = %value, error = %e, "ignoring unreadable vote count");
                None
            }
        }
    };

    Some(VoteFields {
        voters_count: count("NombreVotants"),
        expressed_suffrages: count("NombreSuffrageExprime"),
        votes_for: count("Pour"),
        votes_against: count("Contre"),
    })
}
