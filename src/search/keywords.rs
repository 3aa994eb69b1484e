//! Keyword token normalization shared by tagging and query parsing.

use std::collections::BTreeSet;

use crate::constants::MIN_TOKEN_LEN;

/// Normalizes a keyword: lowercase, runs of whitespace, `-` or `/` become `_`,
/// anything outside `[a-z0-9_]` is dropped.
///
/// ```
/// use sifter::search::keywords::normalize_token;
///
/// assert_eq!(normalize_token(" Machine Learning "), "machine_learning");
/// assert_eq!(normalize_token("CI/CD"), "ci_cd");
/// assert_eq!(normalize_token("e-commerce!"), "e_commerce");
/// ```
pub fn normalize_token(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator = false;
    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' || c == '/' {
            if !in_separator {
                out.push('_');
                in_separator = true;
            }
            continue;
        }
        in_separator = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            out.push(c);
        }
    }
    out
}

/// Distinct normalized query tokens of at least [`MIN_TOKEN_LEN`] characters.
pub fn tokenize_query(query: &str) -> BTreeSet<String> {
    query
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .collect()
}

/// Normalizes website tags and adds the parts of compound tokens.
///
/// `payment_api` also yields `payment` and `api`; parts shorter than
/// [`MIN_TOKEN_LEN`] are not added.
pub fn expand_tokens<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = BTreeSet::new();
    for token in raw.into_iter().map(|t| normalize_token(t.as_ref())) {
        if token.len() < MIN_TOKEN_LEN {
            continue;
        }
        if token.contains('_') {
            tokens.extend(
                token
                    .split('_')
                    .filter(|part| part.len() >= MIN_TOKEN_LEN)
                    .map(str::to_string),
            );
        }
        tokens.insert(token);
    }
    tokens
}
