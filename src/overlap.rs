//! Pages where two topics meet.

use std::collections::{BTreeMap, BTreeSet};

use storylab_types::{Citation, TimedSentence};

/// A page where sentences of both compared topics appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapGroup {
    pub source_id: String,
    pub page: u32,
    /// Sentence texts ordered by topic name; dataset order within a topic.
    pub snippets: Vec<String>,
}

impl OverlapGroup {
    pub fn citation(&self) -> Citation {
        Citation::new(&self.source_id, self.page)
    }
}

/// Find every (source, page) holding sentences of both `topic_a` and `topic_b`.
///
/// Groups come back ordered by source id, then page number.
pub fn overlap_snippets(
    topic_a: &str,
    topic_b: &str,
    rows: &[TimedSentence],
) -> Vec<OverlapGroup> {
    let mut pages: BTreeMap<(&str, u32), Vec<&TimedSentence>> = BTreeMap::new();
    for row in rows
        .iter()
        .filter(|r| r.topic == topic_a || r.topic == topic_b)
    {
        pages
            .entry((row.source_id.as_str(), row.page))
            .or_default()
            .push(row);
    }

    pages
        .into_iter()
        .filter_map(|((source_id, page), mut group)| {
            let topics: BTreeSet<&str> = group.iter().map(|r| r.topic.as_str()).collect();
            if !(topics.contains(topic_a) && topics.contains(topic_b)) {
                return None;
            }
            // stable: keeps dataset order among sentences of the same topic
            group.sort_by(|x, y| x.topic.cmp(&y.topic));
            Some(OverlapGroup {
                source_id: source_id.to_string(),
                page,
                snippets: group.into_iter().map(|r| r.text.clone()).collect(),
            })
        })
        .collect()
}
