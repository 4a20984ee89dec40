//! Utility functions for cleaning and normalizing raw domain tokens.

use crate::error::DomainCheckError;

/// Clean a raw token: drop every whitespace character and lower-case the rest.
///
/// `" My Shop "` becomes `"myshop"`. Idempotent.
pub fn clean_domain_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize a raw token into the domain that gets queried.
///
/// Returns `None` for empty or whitespace-only input. The suffix is appended
/// unless the cleaned token already ends with it, so normalizing a normalized
/// domain is a no-op.
///
/// # Arguments
///
/// * `raw` - Token as supplied by the caller
/// * `suffix` - Top-level suffix without the leading dot (e.g. "com")
pub fn normalize_domain(raw: &str, suffix: &str) -> Option<String> {
    let cleaned = clean_domain_name(raw);
    if cleaned.is_empty() {
        return None;
    }

    let dotted = format!(".{}", suffix);
    if cleaned.ends_with(&dotted) && cleaned.len() > dotted.len() {
        Some(cleaned)
    } else {
        Some(format!("{}{}", cleaned, dotted))
    }
}

/// Normalize a token for a one-off check, rejecting empty input.
pub fn normalize_single(raw: &str, suffix: &str) -> Result<String, DomainCheckError> {
    normalize_domain(raw, suffix)
        .ok_or_else(|| DomainCheckError::invalid_domain(raw, "Domain name cannot be empty"))
}

/// Extract the TLD (last label) of a normalized domain.
pub fn extract_tld(domain: &str) -> Result<String, DomainCheckError> {
    match domain.rsplit_once('.') {
        Some((name, tld)) if !name.is_empty() && !tld.is_empty() => Ok(tld.to_lowercase()),
        _ => Err(DomainCheckError::invalid_domain(
            domain,
            "Domain must contain a name and a TLD",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_domain_name() {
        assert_eq!(clean_domain_name("  Foo  "), "foo");
        assert_eq!(clean_domain_name("My Shop"), "myshop");
        assert_eq!(clean_domain_name("\tA\u{00a0}B\n"), "ab");
        assert_eq!(clean_domain_name("   "), "");
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("foo", "com"), Some("foo.com".to_string()));
        assert_eq!(normalize_domain("  bar  ", "com"), Some("bar.com".to_string()));
        assert_eq!(normalize_domain("Big Idea", "io"), Some("bigidea.io".to_string()));
        assert_eq!(normalize_domain("", "com"), None);
        assert_eq!(normalize_domain(" \t ", "com"), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["foo", " Foo ", "MiXeD Case", "already.com", "x"] {
            let once = normalize_domain(raw, "com").unwrap();
            let twice = normalize_domain(&once, "com").unwrap();
            assert_eq!(once, twice, "normalizing '{}' twice changed it", raw);
        }
    }

    #[test]
    fn test_bare_suffix_still_gets_suffix() {
        // ".com" alone is a label, not a domain carrying the suffix
        assert_eq!(normalize_domain(".com", "com"), Some(".com.com".to_string()));
    }

    #[test]
    fn test_normalize_single_rejects_empty() {
        assert!(normalize_single("  ", "com").is_err());
        assert_eq!(normalize_single("Foo", "com").unwrap(), "foo.com");
    }

    #[test]
    fn test_extract_tld() {
        assert_eq!(extract_tld("example.com").unwrap(), "com");
        assert_eq!(extract_tld("test.co.uk").unwrap(), "uk");
        assert!(extract_tld("example").is_err());
        assert!(extract_tld(".com").is_err());
    }
}
