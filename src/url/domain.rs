use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_radius::url::extract_domain;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Tests whether two URLs belong to the same site
///
/// Two URLs are on the same site when their hosts match case-insensitively
/// and they use the same port. The crawl never leaves the seed's site.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_radius::url::same_site;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// let page = Url::parse("https://example.com/about").unwrap();
/// let other = Url::parse("https://other.com/").unwrap();
/// assert!(same_site(&seed, &page));
/// assert!(!same_site(&seed, &other));
/// ```
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(host_a), Some(host_b)) => host_a == host_b && a.port() == b.port(),
        _ => false,
    }
}
