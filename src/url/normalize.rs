use crate::UrlError;
use url::Url;

/// Path extensions of resources that are never HTML pages
const ASSET_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".pdf", ".zip", ".gz", ".tar",
    ".rar", ".mp3", ".mp4", ".css", ".js", ".xml", ".json", ".woff", ".woff2", ".ttf", ".eot",
    ".map",
];

/// Normalizes a URL to its canonical page identity
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything but `http` and `https`
/// 3. Lowercase the host (default ports are already dropped by the parser)
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment and query string
///
/// # Examples
///
/// ```
/// use sumi_rank::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/docs/?page=2#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

/// Canonicalizes an already-parsed URL
pub(crate) fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingDomain),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);
    url.set_query(None);

    Ok(url)
}

/// Parses a user-supplied seed, defaulting to `https://` when no scheme is given
///
/// ```
/// use sumi_rank::url::parse_seed;
///
/// let url = parse_seed("example.com/blog/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/blog");
/// ```
pub fn parse_seed(seed: &str) -> Result<Url, UrlError> {
    let seed = seed.trim();
    if seed.is_empty() {
        return Err(UrlError::Malformed("seed URL is empty".to_string()));
    }

    if seed.starts_with("http://") || seed.starts_with("https://") || seed.contains("://") {
        normalize_url(seed)
    } else {
        normalize_url(&format!("https://{}", seed))
    }
}

/// Returns true if the URL path names a static asset rather than a page
pub fn is_asset_path(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_scheme() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_query() {
        let result = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_domain() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_default_port_dropped() {
        let result = normalize_url("https://example.com:443/page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_explicit_port_kept() {
        let result = normalize_url("http://127.0.0.1:8080/page/").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:8080/page");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
        assert!(normalize_url("http://").is_err());
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_parse_seed_adds_scheme() {
        let result = parse_seed("example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_parse_seed_rejects_other_schemes() {
        assert!(parse_seed("ftp://example.com").is_err());
        assert!(parse_seed("   ").is_err());
    }

    #[test]
    fn test_is_asset_path() {
        let image = Url::parse("https://example.com/img/logo.PNG").unwrap();
        let page = Url::parse("https://example.com/about").unwrap();
        let html = Url::parse("https://example.com/index.html").unwrap();
        assert!(is_asset_path(&image));
        assert!(!is_asset_path(&page));
        assert!(!is_asset_path(&html));
    }
}
