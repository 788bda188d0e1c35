//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Strip surrounding slashes and whitespace from a region path.
pub fn normalize_region_path(region_path: &str) -> String {
    region_path.trim().trim_matches('/').to_string()
}

/// Whether a region path names only plain path segments.
///
/// Rejects anything that would read as a scheme, query, fragment or a
/// parent/current directory reference once appended to the base URL.
pub fn is_plain_region_path(region_path: &str) -> bool {
    let region = normalize_region_path(region_path);
    !region.contains([':', '?', '#', '\\'])
        && region.split('/').all(|s| !matches!(s, "." | ".."))
}

/// Build the page URL for a region: `<base>/<region>/`.
///
/// The region path is appended as percent-encoded path segments, so the
/// result always stays below the base. Empty, `.` and `..` segments are
/// skipped; exactly one trailing slash is appended.
pub fn region_url(base: &Url, region_path: &str) -> Result<Url, url::ParseError> {
    let region = normalize_region_path(region_path);
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
        segments.pop_if_empty();
        segments.extend(
            region
                .split('/')
                .filter(|s| !matches!(*s, "" | "." | "..")),
        );
        segments.push("");
    }
    Ok(url)
}
