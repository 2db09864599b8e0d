//! Error-type classifier.
//!
//! Extracts a normalized error category from free text by matching a small
//! fixed vocabulary of suffix patterns ("type error", "reference error",
//! ...) regardless of spacing, case, or position in the string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical error categories recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// "type error" / "TypeError"
    Type,
    /// "reference error" / "ReferenceError"
    Reference,
    /// "syntax error" / "SyntaxError"
    Syntax,
    /// "range error" / "RangeError"
    Range,
    /// "eval error" / "EvalError"
    Eval,
    /// "uri error" / "URIError"
    Uri,
}

impl ErrorCategory {
    /// Canonical lowercase token, e.g. `"type error"`.
    pub fn token(self) -> &'static str {
        match self {
            ErrorCategory::Type => "type error",
            ErrorCategory::Reference => "reference error",
            ErrorCategory::Syntax => "syntax error",
            ErrorCategory::Range => "range error",
            ErrorCategory::Eval => "eval error",
            ErrorCategory::Uri => "uri error",
        }
    }

    fn from_family(word: &str) -> Option<Self> {
        match word {
            "type" => Some(ErrorCategory::Type),
            "reference" => Some(ErrorCategory::Reference),
            "syntax" => Some(ErrorCategory::Syntax),
            "range" => Some(ErrorCategory::Range),
            "eval" => Some(ErrorCategory::Eval),
            "uri" => Some(ErrorCategory::Uri),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A classified error mention: the category plus the exact text that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMention {
    /// Normalized category.
    pub category: ErrorCategory,
    /// The matched slice of the input, surface form preserved.
    pub matched: String,
}

static ERROR_TYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(type|reference|syntax|range|eval|uri)\s*error")
        .expect("error-type vocabulary pattern is valid")
});

/// Extract the first error-type mention from `text`, or `None`.
///
/// "TypeError", "Type Error" and "TYPE ERROR" all classify identically;
/// when several types appear, the leftmost occurrence wins.
pub fn extract_error_type(text: &str) -> Option<ErrorMention> {
    let caps = ERROR_TYPE_PATTERN.captures(text)?;
    let family = caps.get(1)?.as_str().to_lowercase();
    let category = ErrorCategory::from_family(&family)?;
    Some(ErrorMention {
        category,
        matched: caps.get(0)?.as_str().to_string(),
    })
}
