//! Amount lexer
//!
//! Extracts candidate monetary amounts from free-form Vietnamese text
//! using an ordered table of unit-suffix patterns. Every pattern is
//! scanned over the whole clause, so several independent amounts can
//! surface from one line of text.

use crate::models::AmountCandidate;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

fn unit_pattern(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("amount pattern must compile")
}

lazy_static! {
    /// Ordered (pattern, multiplier) table. Order matters only for the
    /// first-match variant used by the bill splitter; the clause lexer
    /// collects candidates from every pattern.
    static ref PATTERNS: Vec<(Regex, f64)> = vec![
        (unit_pattern(r"(\d+(?:\.\d+)?)\s*tr(?:iệu)?"), 1_000_000.0),
        (unit_pattern(r"(\d+(?:\.\d+)?)\s*k(?:ilo)?"), 1_000.0),
        (unit_pattern(r"(\d+(?:\.\d+)?)\s*ng(?:àn)?"), 1_000.0),
        (unit_pattern(r"(\d+(?:\.\d+)?)\s*nghìn"), 1_000.0),
        (unit_pattern(r"(\d+(?:\.\d+)?)\s*000"), 1.0),
        (unit_pattern(r"(\d+(?:\.\d+)?)\s*d(?:ồng)?"), 1.0),
        (unit_pattern(r"(\d+(?:\.\d+)?)\s*đ"), 1.0),
        (unit_pattern(r"(\d{4,})"), 1.0),
    ];
}

/// Scan a clause for all amount candidates. A clause with no digits, or
/// whose digits fail to parse, simply contributes no candidates; failures
/// are swallowed per match, never fatal.
pub fn scan(text: &str) -> Vec<AmountCandidate> {
    let mut candidates = Vec::new();

    for (pattern, multiplier) in PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let number: f64 = match caps[1].parse() {
                Ok(n) => n,
                Err(_) => continue,
            };
            let value = (number * multiplier) as i64;

            candidates.push(AmountCandidate {
                value,
                span: (whole.start(), whole.end()),
            });
        }
    }

    candidates
}

/// Tie-break policy: when one clause yields several candidates, the
/// single largest value wins, not the first occurrence. Clauses often
/// carry number-like noise next to the real price ("xăng 200k 2 lít")
/// and the price is the biggest number in practice.
pub fn best(candidates: &[AmountCandidate]) -> Option<i64> {
    candidates.iter().map(|c| c.value).max().filter(|v| *v > 0)
}

/// First-match variant used by the bill splitter: patterns are tried in
/// table order and the first hit wins.
pub fn first_match(text: &str) -> Option<i64> {
    for (pattern, multiplier) in PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(number) = caps[1].parse::<f64>() {
                let value = (number * multiplier) as i64;
                if value > 0 {
                    return Some(value);
                }
            }
        }
    }
    None
}
