//! Identifier coverage: compares the identifiers carried by the raw tree with
//! the `para_id`s of the records produced from it.

use std::collections::{BTreeMap, BTreeSet};

use datadebat_core::ParagraphRecord;
use serde::Serialize;

use crate::paragraphs::PARA_ID_ATTRIBUTE;
use crate::xml::XmlNode;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdentifierCoverage {
    pub raw_total: usize,
    pub raw_unique: usize,
    pub output_total: usize,
    pub output_unique: usize,
    pub common: usize,
    /// Raw identifiers with no output record, sorted.
    pub missing: Vec<String>,
    /// Output identifiers absent from the raw tree, sorted.
    pub spurious: Vec<String>,
    /// Raw identifiers seen more than once (continuation fragments).
    pub raw_duplicates: BTreeMap<String, usize>,
    pub output_duplicates: BTreeMap<String, usize>,
    /// Tags of the nodes carrying each missing identifier.
    pub missing_tags: BTreeMap<String, usize>,
}

impl IdentifierCoverage {
    #[must_use]
    pub fn compare(tree: &XmlNode, records: &[ParagraphRecord]) -> Self {
        let mut raw_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut raw_tags: BTreeMap<&str, &str> = BTreeMap::new();
        let mut raw_total = 0;
        for node in std::iter::once(tree).chain(tree.descendants()) {
            if let Some(id) = node.attr(PARA_ID_ATTRIBUTE) {
                raw_total += 1;
                *raw_counts.entry(id.to_string()).or_default() += 1;
                raw_tags.entry(id).or_insert(node.name.as_str());
            }
        }

        let mut output_counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            *output_counts.entry(record.para_id.clone()).or_default() += 1;
        }

        let raw_ids: BTreeSet<&String> = raw_counts.keys().collect();
        let output_ids: BTreeSet<&String> = output_counts.keys().collect();

        let missing: Vec<String> = raw_ids
            .difference(&output_ids)
            .map(|id| (*id).clone())
            .collect();
        let mut missing_tags: BTreeMap<String, usize> = BTreeMap::new();
        for id in &missing {
            if let Some(tag) = raw_tags.get(id.as_str()) {
                *missing_tags.entry((*tag).to_string()).or_default() += 1;
            }
        }

        Self {
            raw_total,
            raw_unique: raw_ids.len(),
            output_total: records.len(),
            output_unique: output_ids.len(),
            common: raw_ids.intersection(&output_ids).count(),
            spurious: output_ids
                .difference(&raw_ids)
                .map(|id| (*id).clone())
                .collect(),
            missing,
            raw_duplicates: duplicates(&raw_counts),
            output_duplicates: duplicates(&output_counts),
            missing_tags,
        }
    }

    /// Share of unique raw identifiers found in the output, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn match_rate(&self) -> f64 {
        if self.raw_unique == 0 {
            return 100.0;
        }
        self.common as f64 / self.raw_unique as f64 * 100.0
    }

    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.spurious.is_empty() && self.output_duplicates.is_empty()
    }
}

fn duplicates(counts: &BTreeMap<String, usize>) -> BTreeMap<String, usize> {
    counts
        .iter()
        .filter(|(_, &n)| n > 1)
        .map(|(id, &n)| (id.clone(), n))
        .collect()
}
