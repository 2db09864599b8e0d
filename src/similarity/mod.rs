//! Multi-signal text similarity engine.
//!
//! Computes a bounded [0, 1] similarity between two strings as a weighted
//! sum of six independent signals:
//!
//! - **Error-type match**: the two texts mention the same error category
//! - **Longest common substring**: contiguous case-sensitive overlap
//! - **Edit distance**: character Levenshtein for short inputs, word-token
//!   Levenshtein for long ones
//! - **Key-phrase match**: shared entries from a fixed catalog of canonical
//!   debugging phrases
//! - **Word overlap**: shared significant tokens, with prefix matching for
//!   near-identical words
//! - **Identifier match**: shared quoted literals and call-like identifiers
//!
//! Each signal is clamped to [0, 1] before weighting and the total is capped
//! at 1.0. The functions are pure; the search layer owns all state.

mod error_type;

pub use error_type::{extract_error_type, ErrorCategory, ErrorMention};

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Weight of the error-type signal.
const ERROR_TYPE_WEIGHT: f64 = 0.2;
/// Weight of the longest-common-substring signal.
const COMMON_SUBSTRING_WEIGHT: f64 = 0.2;
/// Weight of the edit-distance signal.
const EDIT_DISTANCE_WEIGHT: f64 = 0.15;
/// Weight of the key-phrase signal.
const KEY_PHRASE_WEIGHT: f64 = 0.15;
/// Weight of the word-overlap signal.
const WORD_OVERLAP_WEIGHT: f64 = 0.2;
/// Weight of the identifier signal.
const IDENTIFIER_WEIGHT: f64 = 0.1;

/// Score for the same error category extracted with different surface forms.
const ERROR_TYPE_FAMILY_SCORE: f64 = 0.55;
/// Common substrings shorter than this contribute nothing.
const MIN_COMMON_SUBSTRING: usize = 5;
/// Inputs longer than this (in characters) switch Levenshtein to word tokens
/// to keep the computation near-linear.
const EDIT_DISTANCE_CHAR_LIMIT: usize = 200;
/// Tokens at or below this length are dropped from word overlap.
const SHORT_TOKEN_CUTOFF: usize = 2;
/// Minimum token length for prefix matching in word overlap.
const MIN_PREFIX_LEN: usize = 4;

/// Compute the similarity of `pattern` against `content`, in [0, 1].
///
/// Identical strings score exactly 1.0; this includes two empty strings,
/// treated as a degenerate identical case. An empty string against a
/// non-empty one scores 0.0.
pub fn similarity(pattern: &str, content: &str) -> f64 {
    if pattern == content {
        return 1.0;
    }
    if pattern.is_empty() || content.is_empty() {
        return 0.0;
    }

    let total = ERROR_TYPE_WEIGHT * error_type_score(pattern, content)
        + COMMON_SUBSTRING_WEIGHT * common_substring_score(pattern, content)
        + EDIT_DISTANCE_WEIGHT * edit_distance_score(pattern, content)
        + KEY_PHRASE_WEIGHT * key_phrase_score(pattern, content)
        + WORD_OVERLAP_WEIGHT * word_overlap_score(pattern, content)
        + IDENTIFIER_WEIGHT * identifier_score(pattern, content);

    total.min(1.0)
}

/// 1.0 for identical extracted mentions, a partial score for the same
/// category in a different surface form, 0 when either side has no
/// extractable type or the categories differ.
fn error_type_score(a: &str, b: &str) -> f64 {
    match (extract_error_type(a), extract_error_type(b)) {
        (Some(x), Some(y)) if x.category == y.category => {
            if x.matched == y.matched {
                1.0
            } else {
                ERROR_TYPE_FAMILY_SCORE
            }
        }
        _ => 0.0,
    }
}

/// Longest contiguous shared substring, scored against the shorter input so
/// a long overlap in long strings is not over-rewarded.
fn common_substring_score(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let longest = longest_common_substring(&a_chars, &b_chars);
    if longest < MIN_COMMON_SUBSTRING {
        return 0.0;
    }
    let shorter = a_chars.len().min(b_chars.len());
    (longest as f64 / shorter as f64).clamp(0.0, 1.0)
}

/// Two-row dynamic program over character slices.
fn longest_common_substring(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    let mut best = 0;
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            best = best.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

/// Normalized Levenshtein similarity: character-level under the length
/// threshold, word-token-level above it.
fn edit_distance_score(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.len().max(b_chars.len()) <= EDIT_DISTANCE_CHAR_LIMIT {
        let max_len = a_chars.len().max(b_chars.len());
        if max_len == 0 {
            return 0.0;
        }
        let distance = levenshtein(&a_chars, &b_chars);
        (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
    } else {
        let a_words: Vec<&str> = a.split_whitespace().collect();
        let b_words: Vec<&str> = b.split_whitespace().collect();
        let max_len = a_words.len().max(b_words.len());
        if max_len == 0 {
            return 0.0;
        }
        let distance = levenshtein(&a_words, &b_words);
        (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
    }
}

/// Classic two-row Levenshtein over any comparable alphabet.
fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Fixed catalog of canonical debugging phrases.
static KEY_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"cannot\s+read\s+propert(?:y|ies)",
        r"is\s+not\s+defined",
        r"is\s+not\s+a\s+function",
        r"maximum\s+call\s+stack",
        r"permission\s+denied",
        r"undefined\s+or\s+null",
        r"connection\s+refused",
        r"out\s+of\s+memory",
    ]
    .iter()
    .map(|pattern| {
        Regex::new(&format!("(?i){}", pattern)).expect("key-phrase catalog pattern is valid")
    })
    .collect()
});

/// Fraction of catalog entries present in both texts.
fn key_phrase_score(a: &str, b: &str) -> f64 {
    let shared = KEY_PHRASES
        .iter()
        .filter(|re| re.is_match(a) && re.is_match(b))
        .count();
    (shared as f64 / KEY_PHRASES.len() as f64).clamp(0.0, 1.0)
}

/// Significant lowercase tokens: split on non-alphanumerics, drop short and
/// purely numeric tokens.
fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > SHORT_TOKEN_CUTOFF)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_lowercase)
        .collect()
}

/// Exact match, or a prefix match between tokens long enough to be
/// near-identical words ("config" vs "configuration").
fn tokens_match(a: &str, b: &str) -> bool {
    a == b
        || (a.len() >= MIN_PREFIX_LEN
            && b.len() >= MIN_PREFIX_LEN
            && (a.starts_with(b) || b.starts_with(a)))
}

/// Shared significant tokens, normalized by the larger token set.
fn word_overlap_score(a: &str, b: &str) -> f64 {
    let a_tokens = tokens(a);
    let b_tokens = tokens(b);
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    let matched = a_tokens
        .iter()
        .filter(|t| b_tokens.iter().any(|u| tokens_match(t, u)))
        .count();
    (matched as f64 / a_tokens.len().max(b_tokens.len()) as f64).clamp(0.0, 1.0)
}

/// Quoted literals (single, double, backtick) and call-like identifiers.
static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'([^']+)'|"([^"]+)"|`([^`]+)`|\b([A-Za-z_][A-Za-z0-9_]*)\s*\("#)
        .expect("identifier pattern is valid")
});

fn identifiers(text: &str) -> HashSet<String> {
    IDENTIFIER_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
        })
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Overlap ratio of the extracted identifier sets.
fn identifier_score(a: &str, b: &str) -> f64 {
    let a_idents = identifiers(a);
    let b_idents = identifiers(b);
    if a_idents.is_empty() || b_idents.is_empty() {
        return 0.0;
    }
    let shared = a_idents.intersection(&b_idents).count();
    (shared as f64 / a_idents.len().max(b_idents.len()) as f64).clamp(0.0, 1.0)
}
