//! Keyword-based topic labelling.
//!
//! A sentence gets the first topic, in table order, whose pattern matches
//! anywhere in it. The order of [`DEFAULT_TOPICS`] is therefore part of the
//! classification result: "Industrial policy reform" is `Policy` only
//! because `Policy` is listed before `Industry`.

use regex::{Regex, RegexBuilder};
use storylab_types::{ClassifiedSentence, SentenceRecord};

/// Label for sentences no pattern matches.
pub const FALLBACK_TOPIC: &str = "Other";

/// Topic → keyword alternation, in priority order.
pub const DEFAULT_TOPICS: &[(&str, &str)] = &[
    ("Energy", r"\b(GW|renewable|solar|wind|electricity|PV|power)\b"),
    ("Climate", r"\b(CO2|emission|Paris Agreement|GHG)\b"),
    ("Construction", r"\b(construction|housing|dwelling|building permit)\b"),
    ("Labour", r"\b(unemployment|employment|wage)\b"),
    ("Trade", r"\b(export|import|sanction|tariff)\b"),
    ("Finance", r"\b(debt|budget deficit|fiscal)\b"),
    (
        "Economic Recovery",
        r"\b(recovery|rebound|stimulus|bounce\s?back|expansion|growth momentum)\b",
    ),
    (
        "Policy",
        r"\b(policy|regulation|directive|legislation|law|strategy|framework|ordinance)\b",
    ),
    (
        "Work Models",
        r"\b(remote work|telework|hybrid work|flexible working|gig economy|home office|four-day week)\b",
    ),
    (
        "Industry",
        r"\b(industry|industrial|manufacturing|factory|plant|production|industrial output|processing sector)\b",
    ),
];

/// Ordered `(label, pattern)` list. Iteration order is priority order.
#[derive(Debug, Clone)]
pub struct TopicTable {
    entries: Vec<(String, Regex)>,
}

impl TopicTable {
    /// Compile `(label, pattern)` pairs case-insensitively, keeping their order.
    pub fn new<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, regex::Error> {
        let entries = entries
            .into_iter()
            .map(|(label, pattern)| {
                let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
                Ok((label.to_string(), re))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { entries })
    }

    /// Labels in priority order, without the fallback.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// First matching label, or [`FALLBACK_TOPIC`].
    pub fn classify(&self, text: &str) -> &str {
        self.entries
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(label, _)| label.as_str())
            .unwrap_or(FALLBACK_TOPIC)
    }

    pub fn classify_sentences(&self, rows: Vec<SentenceRecord>) -> Vec<ClassifiedSentence> {
        rows.into_iter()
            .map(|row| {
                let topic = self.classify(&row.text).to_string();
                row.with_topic(topic)
            })
            .collect()
    }
}

impl Default for TopicTable {
    fn default() -> Self {
        Self::new(DEFAULT_TOPICS.iter().copied()).expect("built-in topic patterns compile")
    }
}
