//! Past / Present / Future tagging.
//!
//! Best-effort heuristic, evaluated in this order (first hit wins):
//!   1. explicit years 1900–2099: the latest one decides,
//!   2. a future marker ("will", "target", "by 20XX"),
//!   3. a present auxiliary ("has", "is"),
//!   4. otherwise Past.
//! The precedence is the contract; a year always beats verb tense.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use storylab_types::{ClassifiedSentence, Phase, TimedSentence};

pub const DEFAULT_BOUNDARY_YEAR: u16 = 2022;

static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static RE_FUTURE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\bwill\b|\btarget\b|\bby 20\d{2}\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});

static RE_PRESENT: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\bhas\b|\bis\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Assigns phases relative to a boundary year: years up to the boundary are
/// Past, the two years after it Present, anything later Future.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTagger {
    boundary_year: u16,
}

impl Default for PhaseTagger {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDARY_YEAR)
    }
}

impl PhaseTagger {
    pub fn new(boundary_year: u16) -> Self {
        Self { boundary_year }
    }

    pub fn boundary_year(&self) -> u16 {
        self.boundary_year
    }

    pub fn phase_of(&self, sentence: &str) -> Phase {
        if let Some(year) = latest_year(sentence) {
            return self.phase_of_year(year);
        }
        if RE_FUTURE.is_match(sentence) {
            return Phase::Future;
        }
        if RE_PRESENT.is_match(sentence) {
            return Phase::Present;
        }
        Phase::Past
    }

    fn phase_of_year(&self, year: u16) -> Phase {
        let boundary = self.boundary_year;
        if year <= boundary {
            Phase::Past
        } else if year <= boundary.saturating_add(2) {
            Phase::Present
        } else {
            Phase::Future
        }
    }

    pub fn tag_sentences(&self, rows: Vec<ClassifiedSentence>) -> Vec<TimedSentence> {
        rows.into_iter()
            .map(|row| {
                let phase = self.phase_of(&row.text);
                row.with_phase(phase)
            })
            .collect()
    }
}

/// Largest standalone four-digit year in [1900, 2099], if any.
fn latest_year(sentence: &str) -> Option<u16> {
    RE_YEAR
        .find_iter(sentence)
        .filter_map(|m| m.as_str().parse::<u16>().ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storylab_types::SentenceRecord;

    fn phase(s: &str) -> Phase {
        PhaseTagger::default().phase_of(s)
    }

    #[test]
    fn test_latest_year_extraction() {
        assert_eq!(latest_year("from 1998 to 2019"), Some(2019));
        assert_eq!(latest_year("in 1899 and 2100"), None);
        assert_eq!(latest_year("code 12019 or 20199"), None);
        assert_eq!(latest_year("no year here"), None);
    }

    #[test]
    fn test_max_year_wins() {
        assert_eq!(phase("Emissions fell in 2019 and will fall further by 2030."), Phase::Future);
    }

    #[test]
    fn test_year_boundaries() {
        assert_eq!(phase("In 2022 output fell."), Phase::Past);
        assert_eq!(phase("In 2023 output fell."), Phase::Present);
        assert_eq!(phase("In 2024 output fell."), Phase::Present);
        assert_eq!(phase("In 2025 output fell."), Phase::Future);
    }

    #[test]
    fn test_year_beats_tense() {
        // future-sounding verb but both years are at or before the boundary
        assert_eq!(phase("The plan will build on 2015 and 2021 results."), Phase::Past);
        assert_eq!(phase("Debt is lower than in 2010 and 2020."), Phase::Past);
    }

    #[test]
    fn test_future_markers() {
        assert_eq!(phase("Capacity will rise."), Phase::Future);
        assert_eq!(phase("The TARGET is ambitious."), Phase::Future);
    }

    #[test]
    fn test_present_auxiliaries() {
        assert_eq!(phase("Inflation is high."), Phase::Present);
        assert_eq!(phase("The sector has grown."), Phase::Present);
        // "this" and "hash" are not auxiliaries
        assert_eq!(phase("This hash changed."), Phase::Past);
    }

    #[test]
    fn test_default_past() {
        assert_eq!(phase("GW capacity expanded to 1.5 GW this year."), Phase::Past);
    }

    #[test]
    fn test_custom_boundary() {
        let tagger = PhaseTagger::new(2024);
        assert_eq!(tagger.boundary_year(), 2024);
        assert_eq!(tagger.phase_of("Back in 2024."), Phase::Past);
        assert_eq!(tagger.phase_of("Then 2026."), Phase::Present);
        assert_eq!(tagger.phase_of("Then 2027."), Phase::Future);
    }

    #[test]
    fn test_tag_sentences() {
        let rows = vec![
            SentenceRecord::new("a.pdf", 1, "Wind will grow.").with_topic("Energy"),
            SentenceRecord::new("a.pdf", 2, "Wind grew in 2010.").with_topic("Energy"),
        ];
        let out = PhaseTagger::default().tag_sentences(rows);
        assert_eq!(out[0].phase, Phase::Future);
        assert_eq!(out[1].phase, Phase::Past);
        assert_eq!(out[1].topic, "Energy");
    }
}
