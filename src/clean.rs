//! Number formatting repair for extracted sentences.

use std::sync::LazyLock;

use regex::Regex;
use storylab_types::SentenceRecord;

// Digit, comma, exactly three digits: a thousands separator
static RE_THOUSANDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d),(\d{3})").unwrap());

/// Normalize number formatting in one sentence.
///
/// Thousands separators are stripped until none are left ("1,234,567" →
/// "1234567"), then every remaining comma becomes a decimal point
/// ("18,3" → "18.3"). The output contains no commas, so applying this
/// twice gives the same result as applying it once.
pub fn fix_commas(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = RE_THOUSANDS.replace_all(&current, "${1}${2}").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current.replace(',', ".")
}

/// Rewrite the `text` column of every record in place.
pub fn clean_sentences(rows: &mut [SentenceRecord]) {
    for row in rows {
        row.text = fix_commas(&row.text);
    }
}
