//! Locale-aware text normalization for multi-value cells.
//!
//! Raw cells such as `"Astım, Diyabet; astim"` are split on delimiter runs and
//! every fragment is folded to lowercase ASCII: Turkish letters are mapped to
//! their base letter and any remaining combining marks are stripped after
//! canonical decomposition.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static DELIMITERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;,/|]+").expect("Invalid regex: delimiters"));
static NON_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex: identifier filter"));
static NON_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9 +\-]+").expect("Invalid regex: label filter"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace"));
static NON_FEATURE_SAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9+]+").expect("Invalid regex: feature name filter"));

/// How a token is filtered after locale folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStyle {
    /// Keep `[a-z0-9]`, everything else collapses to a single `_`.
    Identifier,
    /// Keep `[a-z0-9 +-]`, everything else collapses to a single space.
    #[default]
    Label,
}

/// Map Turkish letters to ASCII, lowercase, and strip combining marks.
pub fn fold_locale(value: &str) -> String {
    let mapped: String = value
        .chars()
        .map(|c| match c {
            'ı' | 'İ' => 'i',
            'ş' | 'Ş' => 's',
            'ğ' | 'Ğ' => 'g',
            'ç' | 'Ç' => 'c',
            'ö' | 'Ö' => 'o',
            'ü' | 'Ü' => 'u',
            other => other,
        })
        .collect();

    mapped
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Split a raw cell on runs of `;`, `,`, `/` and `|`.
///
/// Fragments are trimmed; empty fragments are dropped.
pub fn split_cell(value: &str) -> Vec<&str> {
    DELIMITERS
        .split(value)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Normalize a single fragment. Returns `None` when nothing survives filtering.
pub fn normalize_token(raw: &str, style: TokenStyle) -> Option<String> {
    let folded = fold_locale(raw.trim());

    let token = match style {
        TokenStyle::Identifier => NON_IDENTIFIER
            .replace_all(&folded, "_")
            .trim_matches('_')
            .to_string(),
        TokenStyle::Label => {
            let filtered = NON_LABEL.replace_all(&folded, " ");
            WHITESPACE_RUN.replace_all(&filtered, " ").trim().to_string()
        }
    };

    if token.is_empty() { None } else { Some(token) }
}

/// Tokenize a raw cell into normalized tokens, preserving source order.
///
/// Null, empty and whitespace-only cells produce no tokens. Duplicates are
/// kept; use [`token_set`] when membership is all that matters.
pub fn tokenize_cell(value: Option<&str>, style: TokenStyle) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };

    split_cell(value)
        .into_iter()
        .filter_map(|part| normalize_token(part, style))
        .collect()
}

/// The distinct tokens of a cell.
pub fn token_set(value: Option<&str>, style: TokenStyle) -> HashSet<String> {
    tokenize_cell(value, style).into_iter().collect()
}

/// Render a token so it can be embedded in a column or file name.
///
/// Anything outside `[a-z0-9+]` collapses to a single `_`.
pub fn feature_safe_name(token: &str) -> String {
    let lower = token.to_lowercase();
    NON_FEATURE_SAFE
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}
