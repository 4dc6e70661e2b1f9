//! Reading stored stories back: phase splitting and reference stripping.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use storylab_types::Phase;
use thiserror::Error;

static RE_PARAGRAPH_1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*paragraph\s*1\s*(?:\([^)]*\))?\s*:?").unwrap());
static RE_PARAGRAPH_2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)paragraph\s*2").unwrap());
static RE_PARAGRAPH_3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)paragraph\s*3").unwrap());
// "(Present):" left over after the paragraph marker
static RE_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(?:\([^)]*\))?\s*:?").unwrap());
static RE_REFERENCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*references").unwrap());

/// Shown for each part when a stored story cannot be split.
pub const SPLIT_PLACEHOLDER: &str = "Could not split story";

/// A three-paragraph story cut into its phases, labels removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeSections {
    pub past: String,
    pub present: String,
    pub future: String,
}

impl NarrativeSections {
    /// Placeholder sections for display when splitting failed.
    pub fn placeholder() -> Self {
        Self {
            past: SPLIT_PLACEHOLDER.to_string(),
            present: SPLIT_PLACEHOLDER.to_string(),
            future: SPLIT_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeSplitError {
    #[error("no '{0}' marker in story")]
    MissingMarker(&'static str),

    #[error("'Paragraph 3' appears before 'Paragraph 2'")]
    OutOfOrder,

    #[error("{0} paragraph is empty")]
    EmptySection(Phase),
}

/// Split a story on its "Paragraph 2" / "Paragraph 3" markers (any case).
///
/// Past is everything before the first "Paragraph 2", Present runs up to the
/// first "Paragraph 3" after it, Future runs to the `**References` section
/// or the end of the text. Each part must keep some text once its label is
/// removed.
pub fn split_story(text: &str) -> Result<NarrativeSections, NarrativeSplitError> {
    let p2 = RE_PARAGRAPH_2
        .find(text)
        .ok_or(NarrativeSplitError::MissingMarker("Paragraph 2"))?;
    let p3 = match RE_PARAGRAPH_3.find_at(text, p2.end()) {
        Some(m) => m,
        None if RE_PARAGRAPH_3.is_match(text) => return Err(NarrativeSplitError::OutOfOrder),
        None => return Err(NarrativeSplitError::MissingMarker("Paragraph 3")),
    };

    let future_end = RE_REFERENCES
        .find_at(text, p3.end())
        .map_or(text.len(), |m| m.start());

    let sections = NarrativeSections {
        past: strip_label(&RE_PARAGRAPH_1, &text[..p2.start()]),
        present: strip_label(&RE_LABEL, &text[p2.end()..p3.start()]),
        future: strip_label(&RE_LABEL, &text[p3.end()..future_end]),
    };
    for (phase, part) in [
        (Phase::Past, &sections.past),
        (Phase::Present, &sections.present),
        (Phase::Future, &sections.future),
    ] {
        if part.is_empty() {
            return Err(NarrativeSplitError::EmptySection(phase));
        }
    }
    Ok(sections)
}

fn strip_label(label: &Regex, segment: &str) -> String {
    label.replace(segment, "").trim().to_string()
}

/// The story without its `**References` section.
pub fn strip_references(text: &str) -> &str {
    RE_REFERENCES
        .split(text)
        .next()
        .unwrap_or_default()
        .trim()
}

pub fn comparison_file_name(topic_a: &str, topic_b: &str) -> String {
    format!("{topic_a}_vs_{topic_b}.txt")
}

/// Locate a stored comparison under either topic order.
pub fn find_comparison(dir: &Path, topic_a: &str, topic_b: &str) -> Option<PathBuf> {
    [
        comparison_file_name(topic_a, topic_b),
        comparison_file_name(topic_b, topic_a),
    ]
    .into_iter()
    .map(|name| dir.join(name))
    .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY: &str = "Paragraph 1 (Past): Wind grew 4.2 GW.\n\n\
        Paragraph 2 (Present): Solar is at 9 GW.\n\n\
        Paragraph 3 (Future): Targets reach 30 GW by 2030.\n\n\
        **References**\n– a.pdf p.1";

    #[test]
    fn test_split_story_three_parts() {
        let s = split_story(STORY).unwrap();
        assert_eq!(s.past, "Wind grew 4.2 GW.");
        assert_eq!(s.present, "Solar is at 9 GW.");
        assert_eq!(s.future, "Targets reach 30 GW by 2030.");
    }

    #[test]
    fn test_split_story_case_and_spacing() {
        let s = split_story("old times PARAGRAPH2 now paragraph   3 later").unwrap();
        assert_eq!(s.past, "old times");
        assert_eq!(s.present, "now");
        assert_eq!(s.future, "later");
    }

    #[test]
    fn test_split_story_missing_markers() {
        assert_eq!(
            split_story("just one paragraph"),
            Err(NarrativeSplitError::MissingMarker("Paragraph 2"))
        );
        assert_eq!(
            split_story("a Paragraph 2 b"),
            Err(NarrativeSplitError::MissingMarker("Paragraph 3"))
        );
    }

    #[test]
    fn test_split_story_out_of_order() {
        assert_eq!(
            split_story("Paragraph 3 x Paragraph 2 y"),
            Err(NarrativeSplitError::OutOfOrder)
        );
    }

    #[test]
    fn test_split_story_empty_sections() {
        assert_eq!(
            split_story("Paragraph 2 Paragraph 3"),
            Err(NarrativeSplitError::EmptySection(Phase::Past))
        );
        assert_eq!(
            split_story("Paragraph 2 (Present): now 2 GW. Paragraph 3 (Future): 3 GW."),
            Err(NarrativeSplitError::EmptySection(Phase::Past))
        );
        assert_eq!(
            split_story("Paragraph 1 (Past): 1 GW. Paragraph 2 (Present): Paragraph 3: 3 GW."),
            Err(NarrativeSplitError::EmptySection(Phase::Present))
        );
        assert_eq!(
            split_story("Paragraph 1: 1 GW. Paragraph 2: 2 GW. Paragraph 3 (Future):\n**References**\n– a.pdf p.1"),
            Err(NarrativeSplitError::EmptySection(Phase::Future))
        );
    }

    #[test]
    fn test_placeholder() {
        let p = NarrativeSections::placeholder();
        assert_eq!(p.past, SPLIT_PLACEHOLDER);
        assert_eq!(p.future, SPLIT_PLACEHOLDER);
    }

    #[test]
    fn test_strip_references() {
        assert_eq!(
            strip_references("Linked story.\n\n**References**\n– a.pdf p.2"),
            "Linked story."
        );
        assert_eq!(strip_references("x **REFERENCES** y"), "x");
        assert_eq!(strip_references(" no refs "), "no refs");
    }

    #[test]
    fn test_find_comparison_either_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_comparison(dir.path(), "Energy", "Climate").is_none());

        std::fs::write(dir.path().join("Climate_vs_Energy.txt"), "x").unwrap();
        let found = find_comparison(dir.path(), "Energy", "Climate").unwrap();
        assert!(found.ends_with("Climate_vs_Energy.txt"));
        let found = find_comparison(dir.path(), "Climate", "Energy").unwrap();
        assert!(found.ends_with("Climate_vs_Energy.txt"));
    }
}
