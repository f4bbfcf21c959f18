//! Storefront identifier normalization
//!
//! Input rosters carry anything from bare hosts to full product URLs; every
//! store is reduced to a lower-cased host before scanning, and an empty
//! result marks the row as skipped.

/// Normalizes a raw roster value to a bare host
///
/// Steps:
/// 1. Trim surrounding whitespace and lower-case
/// 2. Strip a leading `https://` or `http://`
/// 3. Truncate at the first `/`, `?`, or `#`
///
/// Ports survive (`127.0.0.1:8080` stays intact), as do `www.` prefixes.
///
/// # Returns
///
/// * `Some(domain)` - The normalized host
/// * `None` - Nothing was left after normalization
pub fn normalize_domain(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    let host: &str = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domain_passes_through() {
        assert_eq!(
            normalize_domain("example.com"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_strips_https_scheme() {
        assert_eq!(
            normalize_domain("https://example.com"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_strips_http_scheme() {
        assert_eq!(
            normalize_domain("http://example.com"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_strips_path() {
        assert_eq!(
            normalize_domain("https://example.com/collections/all"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_strips_query_without_path() {
        assert_eq!(
            normalize_domain("example.com?utm_source=feed"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_strips_fragment() {
        assert_eq!(
            normalize_domain("example.com#main"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(
            normalize_domain("SHOP.Example.COM"),
            Some("shop.example.com".to_string())
        );
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            normalize_domain("  example.com  "),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_keeps_www_prefix() {
        assert_eq!(
            normalize_domain("www.example.com"),
            Some("www.example.com".to_string())
        );
    }

    #[test]
    fn test_keeps_port() {
        assert_eq!(
            normalize_domain("http://127.0.0.1:8080/products.json"),
            Some("127.0.0.1:8080".to_string())
        );
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("   "), None);
    }

    #[test]
    fn test_scheme_only_is_none() {
        assert_eq!(normalize_domain("https://"), None);
        assert_eq!(normalize_domain("http://"), None);
    }

    #[test]
    fn test_path_only_is_none() {
        assert_eq!(normalize_domain("/collections/all"), None);
    }
}
