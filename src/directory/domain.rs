//! Domain normalization for directory keys.

/// Reduces a URL or host to the directory key: lowercase, no scheme, no path, no
/// trailing dot.
///
/// Returns `None` when nothing usable remains.
///
/// ```
/// use sifter::directory::normalize_domain;
///
/// assert_eq!(
///     normalize_domain(" HTTPS://Docs.Example.com./guide "),
///     Some("docs.example.com".to_string())
/// );
/// assert_eq!(normalize_domain("https:///"), None);
/// ```
pub fn normalize_domain(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let host = without_scheme.split('/').next().unwrap_or_default();
    let host = host.trim_end_matches('.');

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
