use chrono::{DateTime, Utc};
use datadebat_core::{ParagraphRecord, SectionContext, SessionMetadata};

use crate::paragraphs::{extract_paragraphs, RecordContext};
use crate::text::node_text;
use crate::vote::extract_vote;
use crate::xml::XmlNode;

pub const SECTION_TAG: &str = "Section";
const SUBSECTION_PREFIX: &str = "SousSection";

/// Walks every `Section` of the document in order and returns its records.
///
/// Paragraphs directly under a section come first, then those of each
/// numbered subsection (recursively, in document order). Empty records are
/// dropped per section before the section's vote, if any, is attached to the
/// last remaining record.
#[must_use]
pub fn walk_sections(
    tree: &XmlNode,
    metadata: &SessionMetadata,
    extracted_at: DateTime<Utc>,
) -> Vec<ParagraphRecord> {
    let sections = std::iter::once(tree)
        .filter(|n| n.name == SECTION_TAG)
        .chain(tree.descendants_named(SECTION_TAG));

    let mut all = Vec::new();
    for section in sections {
        let base = RecordContext {
            metadata: metadata.clone(),
            section: section_context(section),
        };

        let mut records = extract_paragraphs(section, &base, extracted_at);
        collect_subsections(section, &base, extracted_at, &mut records);
        records.retain(|r| !r.text.trim().is_empty());

        if let Some(vote) = extract_vote(section) {
            match records.last_mut() {
                Some(last) => last.attach_vote(vote),
                None => tracing::debug!(
                    section_id = base.section.section_id.as_deref().unwrap_or(""),
                    "vote result in a section without paragraphs"
                ),
            }
        }

        tracing::debug!(
            section_id = base.section.section_id.as_deref().unwrap_or(""),
            paragraphs = records.len(),
            "section walked"
        );
        all.extend(records);
    }
    all
}

fn section_context(section: &XmlNode) -> SectionContext {
    let title_struct = section.child("TitreStruct");
    SectionContext {
        section_id: title_struct
            .and_then(|t| t.attr("Ident"))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        section_title: title_struct.and_then(heading),
        subsection_title: None,
    }
}

fn heading(title_struct: &XmlNode) -> Option<String> {
    title_struct
        .find("Intitule")
        .map(node_text)
        .filter(|t| !t.is_empty())
}

fn is_subsection(name: &str) -> bool {
    name.strip_prefix(SUBSECTION_PREFIX)
        .is_some_and(|level| !level.is_empty() && level.bytes().all(|b| b.is_ascii_digit()))
}

fn collect_subsections(
    parent: &XmlNode,
    base: &RecordContext,
    extracted_at: DateTime<Utc>,
    out: &mut Vec<ParagraphRecord>,
) {
    for subsection in parent.children.iter().filter(|c| is_subsection(&c.name)) {
        let mut context = base.clone();
        if let Some(title) = subsection.child("TitreStruct").and_then(heading) {
            context.section.subsection_title = Some(title);
        }
        out.extend(extract_paragraphs(subsection, &context, extracted_at));
        collect_subsections(subsection, &context, extracted_at, out);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use datadebat_core::VoteFields;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn para(id: &str, text: &str) -> XmlNode {
        XmlNode::new("Para").with_attr("idsyceron", id).with_text(text)
    }

    fn title(ident: Option<&str>, text: &str) -> XmlNode {
        let node = XmlNode::new("TitreStruct")
            .with_child(XmlNode::new("Intitule").with_text(text));
        match ident {
            Some(id) => node.with_attr("Ident", id),
            None => node,
        }
    }

    fn document(sections: Vec<XmlNode>) -> XmlNode {
        let contenu = sections
            .into_iter()
            .fold(XmlNode::new("Contenu"), XmlNode::with_child);
        XmlNode::new("CompteRendu").with_child(contenu)
    }

    #[test]
    fn direct_paragraphs_come_before_subsections() {
        let tree = document(vec![XmlNode::new("Section")
            .with_child(title(Some("S1"), "Questions au Gouvernement"))
            .with_child(XmlNode::new("SousSection1")
                .with_child(title(None, "Politique agricole"))
                .with_child(para("3", "Dans la sous-section.")))
            .with_child(para("1", "Directement."))]);
        let records = walk_sections(&tree, &SessionMetadata::default(), at());
        let ids: Vec<&str> = records.iter().map(|r| r.para_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(records[0].section.section_id.as_deref(), Some("S1"));
        assert_eq!(records[0].section.subsection_title, None);
        assert_eq!(records[1].section.section_title.as_deref(), Some("Questions au Gouvernement"));
        assert_eq!(records[1].section.subsection_title.as_deref(), Some("Politique agricole"));
    }

    #[test]
    fn nested_subsections_overlay_their_own_title() {
        let tree = document(vec![XmlNode::new("Section")
            .with_child(title(Some("S2"), "Projet de loi"))
            .with_child(XmlNode::new("SousSection1")
                .with_child(title(None, "Discussion générale"))
                .with_child(para("10", "Niveau un."))
                .with_child(XmlNode::new("SousSection2")
                    .with_child(title(None, "Article 1er"))
                    .with_child(para("11", "Niveau deux."))))
            .with_child(XmlNode::new("SousSection3").with_child(para("12", "Sans titre.")))]);
        let records = walk_sections(&tree, &SessionMetadata::default(), at());
        let titles: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.section.subsection_title.as_deref())
            .collect();
        assert_eq!(
            titles,
            vec![Some("Discussion générale"), Some("Article 1er"), None]
        );
    }

    #[test]
    fn no_paragraph_is_collected_twice() {
        let tree = document(vec![XmlNode::new("Section")
            .with_child(para("1", "Un."))
            .with_child(XmlNode::new("SousSection1")
                .with_child(para("2", "Deux."))
                .with_child(XmlNode::new("SousSection2").with_child(para("3", "Trois."))))]);
        let records = walk_sections(&tree, &SessionMetadata::default(), at());
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn empty_records_are_dropped() {
        let tree = document(vec![XmlNode::new("Section")
            .with_child(para("1", "  \n "))
            .with_child(para("2", "Texte."))]);
        let records = walk_sections(&tree, &SessionMetadata::default(), at());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].para_id, "2");
    }

    #[test]
    fn vote_attaches_to_last_non_empty_record() {
        let vote = XmlNode::new("ResultatVote").with_child(
            XmlNode::new("Pour").with_child(XmlNode::new("Valeur").with_text("120")),
        );
        let tree = document(vec![XmlNode::new("Section")
            .with_child(para("1", "Je mets aux voix."))
            .with_child(para("2", "Adopté."))
            .with_child(para("3", " "))
            .with_child(vote)]);
        let records = walk_sections(&tree, &SessionMetadata::default(), at());
        assert_eq!(records.len(), 2);
        assert!(!records[0].vote_present);
        assert!(records[1].vote_present);
        assert_eq!(
            records[1].vote,
            Some(VoteFields {
                votes_for: Some(120),
                ..VoteFields::default()
            })
        );
    }

    #[test]
    fn sections_are_walked_in_document_order() {
        let tree = document(vec![
            XmlNode::new("Section").with_child(title(Some("A"), "Premier")).with_child(para("1", "a")),
            XmlNode::new("Section").with_child(title(Some("B"), "Second")).with_child(para("2", "b")),
        ]);
        let records = walk_sections(&tree, &SessionMetadata::default(), at());
        let ids: Vec<&str> = records
            .iter()
            .filter_map(|r| r.section.section_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn subsection_tag_detection() {
        assert!(is_subsection("SousSection1"));
        assert!(is_subsection("SousSection12"));
        assert!(!is_subsection("SousSection"));
        assert!(!is_subsection("SousSectionX"));
        assert!(!is_subsection("Section"));
    }
}
