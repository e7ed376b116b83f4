use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_rank::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs belong to the same crawlable site
///
/// Two URLs are on the same site when their hosts match case-insensitively and
/// their explicit ports match. The scheme is ignored so an `http` to `https`
/// upgrade stays inside the crawl.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(ha), Some(hb)) => ha == hb && a.port() == b.port(),
        _ => false,
    }
}

/// Returns the path of `url` when it is on the same site as `base`, or the
/// full URL otherwise
pub fn relative_path(url: &Url, base: &Url) -> String {
    if same_site(url, base) {
        url.path().to_string()
    } else {
        url.to_string()
    }
}
