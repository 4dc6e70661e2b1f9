use std::fmt;

use serde::{Deserialize, Serialize};

// ── Sentence records ─────────────────────────────────────────────────────

/// One sentence cut from one page of a source document.
///
/// Produced by extraction; the cleaning stage rewrites `text` in place and
/// every later stage appends exactly one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    /// Document identifier (the file name, e.g. `report.pdf`)
    pub source_id: String,
    /// 1-based page number
    pub page: u32,
    pub text: String,
}

impl SentenceRecord {
    pub fn new(source_id: impl Into<String>, page: u32, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            page,
            text: text.into(),
        }
    }

    pub fn with_topic(self, topic: impl Into<String>) -> ClassifiedSentence {
        ClassifiedSentence {
            source_id: self.source_id,
            page: self.page,
            text: self.text,
            topic: topic.into(),
        }
    }
}

/// A sentence carrying exactly one topic label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSentence {
    pub source_id: String,
    pub page: u32,
    pub text: String,
    pub topic: String,
}

impl ClassifiedSentence {
    pub fn with_phase(self, phase: Phase) -> TimedSentence {
        TimedSentence {
            source_id: self.source_id,
            page: self.page,
            text: self.text,
            topic: self.topic,
            phase,
        }
    }
}

/// A classified sentence placed on the Past/Present/Future axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedSentence {
    pub source_id: String,
    pub page: u32,
    pub text: String,
    pub topic: String,
    pub phase: Phase,
}

impl TimedSentence {
    pub fn citation(&self) -> Citation {
        Citation::new(&self.source_id, self.page)
    }
}

// ── Phase ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Past,
    Present,
    Future,
}

impl Phase {
    /// Narrative order: every story walks the phases in this sequence.
    pub const ALL: [Phase; 3] = [Phase::Past, Phase::Present, Phase::Future];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Past => "Past",
            Self::Present => "Present",
            Self::Future => "Future",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Citation ─────────────────────────────────────────────────────────────

/// `"<source_id> p.<page>"`: dedup key and display string for references.
///
/// Ordering is plain lexicographic on the rendered string, which is the
/// order used in every `**References**` section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Citation(String);

impl Citation {
    pub fn new(source_id: &str, page: u32) -> Self {
        Self(format!("{source_id} p.{page}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_format() {
        assert_eq!(Citation::new("doc.pdf", 4).as_str(), "doc.pdf p.4");
    }

    #[test]
    fn test_citation_sorts_lexicographically() {
        let mut refs = vec![
            Citation::new("b.pdf", 1),
            Citation::new("a.pdf", 12),
            Citation::new("a.pdf", 2),
        ];
        refs.sort();
        let rendered: Vec<&str> = refs.iter().map(Citation::as_str).collect();
        // "p.12" < "p.2" as strings
        assert_eq!(rendered, vec!["a.pdf p.12", "a.pdf p.2", "b.pdf p.1"]);
    }

    #[test]
    fn test_stage_columns_carry_forward() {
        let timed = SentenceRecord::new("r.pdf", 3, "Wind power grew.")
            .with_topic("Energy")
            .with_phase(Phase::Past);
        assert_eq!(timed.source_id, "r.pdf");
        assert_eq!(timed.page, 3);
        assert_eq!(timed.topic, "Energy");
        assert_eq!(timed.phase, Phase::Past);
        assert_eq!(timed.citation().as_str(), "r.pdf p.3");
    }
}
