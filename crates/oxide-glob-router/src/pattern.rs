//! Glob route patterns with method filters.
//!
//! A route key is a shell-like glob followed by optional method filters:
//!
//! ```text
//! /users/#/edit +GET +POST
//! /files/** -DELETE
//! ```
//!
//! Glob syntax:
//! - `?` matches one character other than `/`
//! - `*` matches any run of characters other than `/`
//! - `/**` matches the rest of the path, including nothing at all
//! - `#` matches one or more digits
//! - `[a-d]` is a character class, `[!a-d]` its negation
//! - `{png,gif}` matches one of the listed literals
//!
//! Everything else matches literally. Unterminated groups and classes that
//! do not form a valid class are matched literally instead of failing.

use std::fmt;

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::request::Method;
use crate::url::decode_path;

/// A compiled route key.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    /// The original key, including method filters.
    key: String,
    /// The glob part of the key.
    path: String,
    /// Anchored regex the glob compiles to.
    regex: Regex,
    /// Methods from `+METHOD` tokens.
    include: Vec<Method>,
    /// Methods from `-METHOD` tokens.
    exclude: Vec<Method>,
}

impl RoutePattern {
    /// Compiles a route key.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_glob_router::{Method, RoutePattern};
    ///
    /// let pattern = RoutePattern::compile("/foo/* +GET -OPTIONS").unwrap();
    /// assert!(pattern.matches_path("/foo/bar"));
    /// assert!(!pattern.matches_path("/foo/bar/zet"));
    /// assert!(pattern.matches_method(Some(Method::Get)));
    /// assert!(!pattern.matches_method(Some(Method::Post)));
    /// ```
    pub fn compile(key: &str) -> Result<Self> {
        let (path, include, exclude) = split_key(key)?;

        let path = if path == "/" {
            path
        } else {
            path.trim_end_matches('/')
        };

        Ok(Self {
            key: key.to_string(),
            path: path.to_string(),
            regex: compile_glob(path).map_err(|err| invalid_key(key, &err.to_string()))?,
            include,
            exclude,
        })
    }

    /// Returns the original route key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the glob without method filters.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the explicitly allowed methods.
    pub fn included_methods(&self) -> &[Method] {
        &self.include
    }

    /// Returns the explicitly refused methods.
    pub fn excluded_methods(&self) -> &[Method] {
        &self.exclude
    }

    /// Checks whether the URL path matches the glob.
    ///
    /// The URL is percent-decoded before it is compared. An encoded slash
    /// stays part of its segment.
    pub fn matches_path(&self, url: &str) -> bool {
        self.regex.is_match(&decode_path(url))
    }

    /// Checks whether the method passes the filters.
    ///
    /// `None` asks whether the pattern could match any method at all and
    /// always passes.
    pub fn matches_method(&self, method: Option<Method>) -> bool {
        method.map_or(true, |m| {
            (self.include.is_empty() || self.include.contains(&m)) && !self.exclude.contains(&m)
        })
    }

    /// Checks both the path and the method.
    pub fn matches(&self, url: &str, method: Option<Method>) -> bool {
        self.matches_path(url) && self.matches_method(method)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Matches a URL against a glob pattern without method filters.
pub fn fnmatch(pattern: &str, url: &str) -> bool {
    compile_glob(pattern).is_ok_and(|regex| regex.is_match(&decode_path(url)))
}

fn split_key(key: &str) -> Result<(&str, Vec<Method>, Vec<Method>)> {
    if key.trim().is_empty() {
        return Err(RouterError::EmptyPattern);
    }
    if key.starts_with(char::is_whitespace) {
        return Err(invalid_key(key, "missing path before method filters"));
    }

    let mut tokens = key.split_whitespace();
    let path = tokens.next().unwrap_or_default();
    let mut include = Vec::new();
    let mut exclude = Vec::new();

    for token in tokens {
        let (list, name) = if let Some(name) = token.strip_prefix('+') {
            (&mut include, name)
        } else if let Some(name) = token.strip_prefix('-') {
            (&mut exclude, name)
        } else {
            return Err(invalid_key(
                key,
                &format!("expected '+METHOD' or '-METHOD', found '{token}'"),
            ));
        };

        let method = Method::parse(name)
            .ok_or_else(|| invalid_key(key, &format!("unknown method '{name}'")))?;
        if !list.contains(&method) {
            list.push(method);
        }
    }

    Ok((path, include, exclude))
}

fn invalid_key(key: &str, reason: &str) -> RouterError {
    RouterError::InvalidRouteKey {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Compiles a glob to an anchored regex, falling back to a literal match
/// when the translation is not a valid regex.
fn compile_glob(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let pattern = decode_path(pattern);
    Regex::new(&format!("^{}$", glob_to_regex(&pattern)))
        .or_else(|_| Regex::new(&format!("^{}$", regex::escape(&pattern))))
}

/// Translates a glob to an (unanchored) regex.
///
/// ```
/// use oxide_glob_router::pattern::glob_to_regex;
///
/// assert_eq!(glob_to_regex("/foo/*"), "/foo/[^/]*");
/// assert_eq!(glob_to_regex("/foo/**"), "/foo(?:/.*)?");
/// assert_eq!(glob_to_regex("/#.{png,gif}"), r"/\d+\.(?:png|gif)");
/// ```
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '/' if chars.get(i + 1) == Some(&'*') && chars.get(i + 2) == Some(&'*') => {
                out.push_str("(?:/.*)?");
                i += 3;
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '#' => {
                out.push_str(r"\d+");
                i += 1;
            }
            '[' => match closing(&chars, i, ']') {
                Some(end) => {
                    out.push_str(&char_class(&chars[i + 1..end]));
                    i = end + 1;
                }
                None => {
                    out.push_str(r"\[");
                    i += 1;
                }
            },
            '{' => match closing(&chars, i, '}') {
                Some(end) => {
                    let group: String = chars[i + 1..end].iter().collect();
                    let alternatives: Vec<String> = group.split(',').map(regex::escape).collect();
                    out.push_str("(?:");
                    out.push_str(&alternatives.join("|"));
                    out.push(')');
                    i = end + 1;
                }
                None => {
                    out.push_str(r"\{");
                    i += 1;
                }
            },
            c => {
                let mut buf = [0; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    out
}

/// Finds the closing delimiter of a non-empty group opened at `start`.
fn closing(chars: &[char], start: usize, close: char) -> Option<usize> {
    let offset = chars[start + 1..].iter().position(|&c| c == close)?;
    (offset > 0).then_some(start + 1 + offset)
}

fn char_class(content: &[char]) -> String {
    let mut out = String::from("[");

    for (idx, &c) in content.iter().enumerate() {
        match c {
            '!' | '^' if idx == 0 => out.push('^'),
            '\\' | '[' | '&' | '~' => {
                out.push('\\');
                out.push(c);
            }
            '^' => out.push_str(r"\^"),
            _ => out.push(c),
        }
    }

    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnmatch_positive() {
        let cases = [
            ("/*", "/foo"),
            ("/foo/*", "/foo/bar"),
            ("/foo/*/bar/*/teta", "/foo/zet/bar/omega/teta"),
            ("/**", "/"),
            ("/**", "/foo/bar/zet"),
            ("/foo/**", "/foo/bar/zet"),
            ("/foo/**", "/foo"),
            ("/#", "/12345"),
            ("/foo/#/bar", "/foo/12345/bar"),
            ("/foo/bar#", "/foo/bar1"),
            ("/foo?/bar", "/foo1/bar"),
            ("/?", "/a"),
            ("/foo[a-d]/foo", "/food/foo"),
            ("/foo[sad]/bar", "/food/bar"),
            ("/foo/bar.{png,gif}", "/foo/bar.png"),
            ("/foo/bar.{png,gif}", "/foo/bar.gif"),
            ("/foo bar", "/foo%20bar"),
        ];

        for (pattern, url) in cases {
            assert!(fnmatch(pattern, url), "{pattern} should match {url}");
        }
    }

    #[test]
    fn test_fnmatch_negative() {
        let cases = [
            ("", "/foo"),
            ("?", "/"),
            ("/*", "/foo/bar"),
            ("/foo/*", "/foo/bar/zet"),
            ("/foo/*/bar", "/foo/zet/teta/bar"),
            ("/#", "/12345foo"),
            ("/#", "/12345/foo"),
            ("/foo/#/bar", "/foo/foo12345/bar"),
            ("/foo?/bar", "/foo12/bar"),
            ("/?", "/ab"),
            ("/foo[a-d]/foo", "/fooe/foo"),
            ("/foo[sad]/bar", "/foosad/bar"),
            ("/foo[!sad]/bar", "/food/bar"),
            ("/foo/bar.{png,gif}", "/foo/bar.pn"),
            ("/foo/bar.{png,gif}", "/foo/bar.if"),
            ("/foo/bar.{png,gif}", "/foo/bar."),
            ("/foo/**", "/foobar"),
        ];

        for (pattern, url) in cases {
            assert!(!fnmatch(pattern, url), "{pattern} should not match {url}");
        }
    }

    #[test]
    fn test_malformed_groups_match_literally() {
        assert!(fnmatch("/foo[bar", "/foo[bar"));
        assert!(fnmatch("/foo{bar", "/foo{bar"));
        assert!(fnmatch("/foo{}", "/foo{}"));
        assert!(fnmatch("/foo[z-a]", "/foo[z-a]"));
        assert!(!fnmatch("/foo[z-a]", "/foob"));
    }

    #[test]
    fn test_encoded_slash_stays_in_segment() {
        assert!(fnmatch("/a/*", "/a/b%2Fc"));
        assert!(!fnmatch("/a/*/*", "/a/b%2Fc"));
        assert!(!fnmatch("/a/b/c", "/a/b%2fc"));
        assert!(fnmatch("/a/**", "/a/b%2Fc/d"));
    }

    #[test]
    fn test_literal_metacharacters() {
        assert!(fnmatch("/a.b", "/a.b"));
        assert!(!fnmatch("/a.b", "/axb"));
        assert!(fnmatch("/a+b(c)", "/a+b(c)"));
        assert!(fnmatch("/{a.b,c}", "/a.b"));
        assert!(!fnmatch("/{a.b,c}", "/axb"));
    }

    #[test]
    fn test_method_filters() {
        let pattern = RoutePattern::compile("/foo +GET -OPTIONS").unwrap();
        assert_eq!(pattern.path(), "/foo");
        assert!(pattern.matches_method(Some(Method::Get)));
        assert!(!pattern.matches_method(Some(Method::Options)));
        assert!(!pattern.matches_method(Some(Method::Post)));
        assert!(pattern.matches_method(None));

        let pattern = RoutePattern::compile("/bar/foo/zet -POST").unwrap();
        assert!(pattern.matches_method(Some(Method::Get)));
        assert!(!pattern.matches_method(Some(Method::Post)));
        assert_eq!(pattern.excluded_methods(), &[Method::Post]);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let pattern = RoutePattern::compile("/foo/").unwrap();
        assert_eq!(pattern.path(), "/foo");
        assert!(pattern.matches_path("/foo"));

        let root = RoutePattern::compile("/").unwrap();
        assert_eq!(root.path(), "/");
        assert!(root.matches_path("/"));
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(
            RoutePattern::compile(""),
            Err(RouterError::EmptyPattern)
        ));
        assert!(matches!(
            RoutePattern::compile("   "),
            Err(RouterError::EmptyPattern)
        ));
        assert!(matches!(
            RoutePattern::compile("/foo +FETCH"),
            Err(RouterError::InvalidRouteKey { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/foo GET"),
            Err(RouterError::InvalidRouteKey { .. })
        ));
        assert!(matches!(
            RoutePattern::compile(" +GET"),
            Err(RouterError::InvalidRouteKey { .. })
        ));
    }
}
