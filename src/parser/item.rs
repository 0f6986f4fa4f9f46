//! Item-name extraction
//!
//! Removes matched amount spans and filler words from a clause to
//! isolate the described item.

use lazy_static::lazy_static;
use regex::Regex;

/// Sentinel returned when nothing usable survives the cleanup.
pub const UNKNOWN_ITEM: &str = "Không xác định";

/// Temporal fillers and verbs of consuming/purchasing, with and without
/// diacritics. Matched per whitespace-delimited word.
const STOPWORDS: &[&str] = &[
    "nay", "hôm nay", "hom nay", "vừa", "vua", "mới", "moi", "làm", "lam",
    "ăn", "an", "uống", "uong", "mua", "chi", "tiêu", "tieu", "ngon", "quá", "qua",
];

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"\d+").expect("digit pattern");
    static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s]").expect("punctuation pattern");
}

/// Remove all matched spans from the clause, highest offset first so
/// earlier spans keep valid indices. Spans may overlap when several
/// amount patterns hit the same region; clamped to the shrinking string.
fn strip_spans(text: &str, spans: &[(usize, usize)]) -> String {
    let mut cleaned = text.to_string();

    let mut ordered: Vec<(usize, usize)> = spans.to_vec();
    ordered.sort_by(|a, b| b.0.cmp(&a.0));

    for (start, end) in ordered {
        if start >= cleaned.len() {
            continue;
        }
        let mut end = end.min(cleaned.len());
        while end > start && !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.replace_range(start..end, "");
    }

    cleaned
}

/// Extract the item description from a clause given the amount spans the
/// lexer matched. Falls back to the text before the earliest amount when
/// the cleanup was too aggressive, then to [`UNKNOWN_ITEM`].
pub fn extract_item_name(text: &str, spans: &[(usize, usize)]) -> String {
    let cleaned = strip_spans(text, spans);
    let cleaned = cleaned.trim();

    let kept: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    let mut item_name = DIGITS.replace_all(&kept.join(" "), "").trim().to_string();

    // Cleanup too aggressive: recover from the text before the earliest
    // amount span instead.
    if item_name.chars().count() < 2 {
        if let Some(first_start) = spans.iter().map(|(s, _)| *s).min() {
            let mut cut = first_start.min(text.len());
            while cut > 0 && !text.is_char_boundary(cut) {
                cut -= 1;
            }
            item_name = text[..cut].trim().to_string();
        } else {
            item_name = text.trim().to_string();
        }
    }

    let item_name = PUNCTUATION.replace_all(&item_name, " ");
    let item_name = item_name.split_whitespace().collect::<Vec<_>>().join(" ");

    if item_name.is_empty() {
        UNKNOWN_ITEM.to_string()
    } else {
        item_name
    }
}
