//! URL path helpers shared by the matcher, the binder and the middleware.

use std::collections::HashMap;

/// Removes the trailing slash from a path, except for the root path.
pub fn clean_path(path: &str) -> &str {
    if path == "/" {
        return path;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Normalizes a path to a single leading slash and no trailing slash.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

/// Splits a URL path into its percent-decoded segments.
///
/// ```
/// use oxide_glob_router::url::split_path;
///
/// assert_eq!(split_path("/foo/bar%20baz/"), vec!["foo", "bar baz"]);
/// assert!(split_path("/").is_empty());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(percent_decode).collect()
}

/// Decodes a path segment by segment, keeping encoded slashes as `%2F` so
/// the path has the segments [`split_path`] returns.
///
/// ```
/// use oxide_glob_router::url::decode_path;
///
/// assert_eq!(decode_path("/a%20b/c%2Fd"), "/a b/c%2Fd");
/// ```
pub fn decode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| percent_decode(segment).replace('/', "%2F"))
        .collect::<Vec<_>>()
        .join("/")
}

/// Decodes `%XX` escapes. Invalid escapes are kept as they are.
pub fn percent_decode(s: &str) -> String {
    decode(s, false)
}

/// Decodes a form-encoded component (`+` means space).
pub fn form_decode(s: &str) -> String {
    decode(s, true)
}

fn decode(s: &str, plus_as_space: bool) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' if plus_as_space => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parses a query string (or form body) into a key/value map.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (form_decode(key), form_decode(value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("/foo/"), "/foo");
        assert_eq!(clean_path("/foo//"), "/foo");
        assert_eq!(clean_path("//"), "/");
        assert_eq!(clean_path("/foo"), "/foo");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("foo/bar/"), "/foo/bar");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/foo/bar/zet"), vec!["foo", "bar", "zet"]);
        assert_eq!(split_path("/foo?x=1"), vec!["foo"]);
        assert!(split_path("").is_empty());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("New%20York"), "New York");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("a+b"), "a+b");
    }

    #[test]
    fn test_query_string_parsing() {
        let query = parse_query_string("name=John+Doe&age=30&city=New%20York&flag");
        assert_eq!(query.get("name"), Some(&"John Doe".to_string()));
        assert_eq!(query.get("age"), Some(&"30".to_string()));
        assert_eq!(query.get("city"), Some(&"New York".to_string()));
        assert_eq!(query.get("flag"), Some(&String::new()));
    }
}
