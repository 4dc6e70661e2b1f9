//! Page text repair and sentence segmentation.

use std::sync::LazyLock;

use regex::Regex;
use storylab_types::SentenceRecord;
use tracing::{debug, warn};

use crate::scanner::SourceDocument;

// Hyphenated word wrapped at the line end: "eco-\n nomic" → "economic"
static RE_HYPHEN_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\s*\n\s*").unwrap());

// Sentence boundary: terminal punctuation followed by whitespace
static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Join the lines of one page into a single run of text.
///
/// 1. hyphen + line break is removed so the word rejoins,
/// 2. a bare line break between two letters is deleted,
/// 3. every remaining line break becomes one space.
pub fn repair_page_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let dehyphenated = RE_HYPHEN_BREAK.replace_all(&unified, "");

    let chars: Vec<char> = dehyphenated.chars().collect();
    let mut out = String::with_capacity(dehyphenated.len());
    for (i, &c) in chars.iter().enumerate() {
        if c != '\n' {
            out.push(c);
            continue;
        }
        let prev_alpha = i > 0 && chars[i - 1].is_alphabetic();
        let next_alpha = chars.get(i + 1).is_some_and(|n| n.is_alphabetic());
        if !(prev_alpha && next_alpha) {
            out.push(' ');
        }
    }
    out
}

/// Split on `.`, `!` or `?` followed by whitespace; the punctuation stays
/// with the sentence it ends. Empty pieces are dropped, the rest trimmed.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(text) {
        // the punctuation mark is a single ASCII byte
        push_trimmed(&mut sentences, &text[start..m.start() + 1]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, piece: &'a str) {
    let s = piece.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

/// Turn the pages of one document into sentence records (pages are 1-based).
/// Pages with no text are skipped silently.
pub fn extract_sentences(source_id: &str, pages: &[String]) -> Vec<SentenceRecord> {
    let mut rows = Vec::new();
    for (idx, raw) in pages.iter().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let page = idx as u32 + 1;
        let text = repair_page_text(raw);
        rows.extend(
            split_sentences(&text)
                .into_iter()
                .map(|s| SentenceRecord::new(source_id, page, s)),
        );
    }
    rows
}

/// Extract every document in order. A document that cannot be read is
/// logged and skipped; it never aborts the batch.
pub fn extract_documents(docs: &[SourceDocument]) -> Vec<SentenceRecord> {
    let mut rows = Vec::new();
    for doc in docs {
        match doc.pages() {
            Ok(pages) => {
                let before = rows.len();
                rows.extend(extract_sentences(&doc.source_id, &pages));
                debug!(
                    source = %doc.source_id,
                    pages = pages.len(),
                    sentences = rows.len() - before,
                    "extracted document"
                );
            }
            Err(e) => warn!(source = %doc.source_id, error = %e, "skipping unreadable document"),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── repair_page_text ─────────────────────────────────────────────

    #[test]
    fn test_hyphen_break_rejoins_word() {
        assert_eq!(repair_page_text("eco-\nnomic growth"), "economic growth");
        assert_eq!(repair_page_text("eco-  \n   nomic"), "economic");
    }

    #[test]
    fn test_mid_word_break_deleted() {
        assert_eq!(repair_page_text("correla\ntion"), "correlation");
    }

    #[test]
    fn test_other_breaks_become_spaces() {
        assert_eq!(repair_page_text("end.\nNext"), "end. Next");
        assert_eq!(repair_page_text("rose 4\n5 times"), "rose 4 5 times");
        assert_eq!(repair_page_text("line\r\n\r\nnext"), "line  next");
    }

    // ── split_sentences ──────────────────────────────────────────────

    #[test]
    fn test_split_on_terminal_punctuation() {
        let s = split_sentences("Prices rose. Did wages follow?  Yes!   Finally");
        assert_eq!(s, vec!["Prices rose.", "Did wages follow?", "Yes!", "Finally"]);
    }

    #[test]
    fn test_no_split_inside_decimal() {
        let s = split_sentences("Output grew 1.5 percent. Next.");
        assert_eq!(s, vec!["Output grew 1.5 percent.", "Next."]);
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_sentences("   ").is_empty());
    }

    // ── extract_sentences ────────────────────────────────────────────

    #[test]
    fn test_extract_sentences_pages_are_one_based() {
        let pages = vec![
            "First page. Second sen-\ntence here.".to_string(),
            String::new(),
            "Third\npage text.".to_string(),
        ];
        let rows = extract_sentences("doc.pdf", &pages);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], SentenceRecord::new("doc.pdf", 1, "First page."));
        assert_eq!(rows[1], SentenceRecord::new("doc.pdf", 1, "Second sentence here."));
        assert_eq!(rows[2].page, 3);
        assert_eq!(rows[2].text, "Thirdpage text.");
    }

    #[test]
    fn test_extract_sentences_no_text() {
        assert!(extract_sentences("img.pdf", &["  \n ".to_string()]).is_empty());
        assert!(extract_sentences("none.pdf", &[]).is_empty());
    }
}
