//! URL transport (feature `url`), grounded in `xphyle.urls`: `parse_url`,
//! `open_url`, and `get_url_file_name`'s Content-Disposition handling.

use std::io::Read;

/// A parsed URL's scheme and the rest of the string, good enough to
/// distinguish "this looks like a URL" from "this is a local path".
#[derive(Clone, Debug)]
pub struct UrlParts {
    /// The scheme, e.g. `"https"`.
    pub scheme: String,
    /// The full original URL string.
    pub url: String,
}

/// Parse `s` as a URL if it has both a scheme and a netloc-or-path,
/// mirroring `xphyle.urls.parse_url`'s acceptance rule.
pub fn parse(s: &str) -> Option<UrlParts> {
    let (scheme, rest) = s.split_once("://")?;
    if scheme.is_empty() || rest.is_empty() {
        return None;
    }
    if !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') {
        return None;
    }
    Some(UrlParts {
        scheme: scheme.to_string(),
        url: s.to_string(),
    })
}

/// Open `url` as a readable binary stream.
pub fn open(url: &str) -> std::io::Result<Box<dyn Read + Send>> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(Box::new(response.into_reader()))
}

/// Derive a filename for `url` from a Content-Disposition header if given,
/// else from the URL's own path component.
pub fn derive_name(content_disposition: Option<&str>, parts: &UrlParts) -> Option<String> {
    if let Some(cd) = content_disposition {
        if let Some(name) = extract_filename(cd) {
            return Some(name);
        }
    }
    parts
        .url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn extract_filename(content_disposition: &str) -> Option<String> {
    let idx = content_disposition.find("filename=")?;
    let rest = &content_disposition[idx + "filename=".len()..];
    let value = rest.split(';').next().unwrap_or(rest).trim();
    Some(value.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_http_url() {
        let parts = parse("https://example.com/a/b.gz").unwrap();
        assert_eq!(parts.scheme, "https");
    }

    #[test]
    fn rejects_local_paths() {
        assert!(parse("/tmp/a.gz").is_none());
        assert!(parse("relative/path").is_none());
    }

    #[test]
    fn derives_name_from_content_disposition() {
        let parts = parse("https://example.com/download").unwrap();
        let name = derive_name(Some("attachment; filename=\"report.csv.gz\""), &parts);
        assert_eq!(name.as_deref(), Some("report.csv.gz"));
    }

    #[test]
    fn falls_back_to_url_path() {
        let parts = parse("https://example.com/a/b.gz").unwrap();
        let name = derive_name(None, &parts);
        assert_eq!(name.as_deref(), Some("b.gz"));
    }
}
