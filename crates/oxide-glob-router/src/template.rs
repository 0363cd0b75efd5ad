//! Route templates and the bind-expression language.
//!
//! A template is the unresolved value stored for a route pattern. String
//! fields starting with `$` or wrapped in `~` are bind-expressions:
//!
//! | Expression | Resolves to |
//! |---|---|
//! | `$2` | the 2nd path segment |
//! | `$2...` | the 2nd and following segments (lists only) |
//! | `$_GET[page]` | query parameter `page` |
//! | `$_POST[name]` | field `name` of the parsed body |
//! | `$_COOKIE[sid]` | cookie `sid` |
//! | `$HTTP_ACCEPT`, `$CONTENT_TYPE` | a request header |
//! | `$2\|default` | the first option that resolves |
//! | `~$1~/~$2~` | the pieces, concatenated |

use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::error::{Result, RouterError};
use crate::pipeline::Handler;

static SUPERGLOBAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\$_(GET|POST|COOKIE)\[([^\[]*)\]$").expect("Invalid superglobal regex")
});

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$(?:HTTP_)?([A-Z_]+)$").expect("Invalid header regex"));

/// An unresolved route value.
#[derive(Clone)]
pub enum RouteTemplate {
    /// A plain value, used as it is.
    Literal(Value),
    /// A bind-expression.
    Expr(BindExpr),
    /// An ordered list. Multi-segment captures are spliced into it.
    List(Vec<RouteTemplate>),
    /// Named fields, in declaration order.
    Map(Vec<(String, RouteTemplate)>),
    /// A request handler, passed through.
    Handler(Handler),
    /// Any other object, passed through.
    Opaque(Arc<dyn Any + Send + Sync>),
}

/// A parsed bind-expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BindExpr {
    /// `$a|$b|c`: the first option that resolves wins.
    Alternatives(Vec<BindOption>),
    /// `~a~b~`: the pieces are bound and joined.
    Concat(Vec<RouteTemplate>),
}

/// One option of an alternatives expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOption {
    /// Text without a `$`.
    Literal(String),
    /// `$N`, 1-indexed.
    Segment(usize),
    /// `$N...`, 1-indexed.
    Segments(usize),
    /// `$_GET[key]`
    Query(String),
    /// `$_POST[key]`
    Body(String),
    /// `$_COOKIE[key]`
    Cookie(String),
    /// `$HEADER_NAME`, holding the derived header name.
    Header(String),
    /// A `$` option that never resolves.
    Unresolvable(String),
}

impl BindOption {
    /// Parses a single (trimmed) option.
    pub fn parse(option: &str) -> Self {
        let Some(rest) = option.strip_prefix('$') else {
            return Self::Literal(option.to_string());
        };

        if let Some(caps) = SUPERGLOBAL.captures(option) {
            let key = caps[2].to_string();
            return match caps[1].to_ascii_lowercase().as_str() {
                "get" => Self::Query(key),
                "post" => Self::Body(key),
                _ => Self::Cookie(key),
            };
        }

        if let Some(caps) = HEADER.captures(option) {
            return Self::Header(header_name(&caps[1]));
        }

        if let Some(index) = rest.strip_suffix("...").and_then(parse_index) {
            return Self::Segments(index);
        }

        match parse_index(rest) {
            Some(index) => Self::Segment(index),
            None => Self::Unresolvable(option.to_string()),
        }
    }
}

impl fmt::Display for BindOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) | Self::Unresolvable(s) => f.write_str(s),
            Self::Segment(n) => write!(f, "${n}"),
            Self::Segments(n) => write!(f, "${n}..."),
            Self::Query(key) => write!(f, "$_GET[{key}]"),
            Self::Body(key) => write!(f, "$_POST[{key}]"),
            Self::Cookie(key) => write!(f, "$_COOKIE[{key}]"),
            Self::Header(name) => write!(f, "$HTTP_{}", name.replace('-', "_").to_uppercase()),
        }
    }
}

/// Parses a positive segment index.
fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}

/// Derives a header name: `CONTENT_TYPE` becomes `Content-Type`.
fn header_name(var: &str) -> String {
    var.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

impl BindExpr {
    /// Parses a string as a bind-expression.
    ///
    /// Returns `None` for strings that are plain text.
    pub fn parse(s: &str) -> Option<Self> {
        if s.starts_with('$') {
            let options = s.split('|').map(|o| BindOption::parse(o.trim())).collect();
            return Some(Self::Alternatives(options));
        }

        if s.len() >= 2 && s.starts_with('~') && s.ends_with('~') {
            let pieces = s[1..s.len() - 1]
                .split('~')
                .map(|piece| RouteTemplate::parse(piece.trim()))
                .collect();
            return Some(Self::Concat(pieces));
        }

        None
    }

    /// Returns true if the expression captures several segments at the top
    /// level, which only works inside a list.
    fn multi_part(&self) -> Option<&BindOption> {
        match self {
            Self::Alternatives(options) => options
                .iter()
                .find(|option| matches!(option, BindOption::Segments(_))),
            Self::Concat(_) => None,
        }
    }
}

impl fmt::Display for BindExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternatives(options) => {
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{option}")?;
                }
                Ok(())
            }
            Self::Concat(pieces) => {
                f.write_str("~")?;
                for (i, piece) in pieces.iter().enumerate() {
                    if i > 0 {
                        f.write_str("~")?;
                    }
                    match piece {
                        RouteTemplate::Expr(expr) => write!(f, "{expr}")?,
                        RouteTemplate::Literal(Value::String(s)) => f.write_str(s)?,
                        other => write!(f, "{}", other.to_json())?,
                    }
                }
                f.write_str("~")
            }
        }
    }
}

impl RouteTemplate {
    /// Creates an empty map template.
    pub const fn map() -> Self {
        Self::Map(Vec::new())
    }

    /// Creates a list template.
    pub fn list(items: impl IntoIterator<Item = impl Into<Self>>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Wraps an object that is passed through binding unchanged.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    /// Parses a string field: a bind-expression or a literal.
    pub fn parse(s: &str) -> Self {
        BindExpr::parse(s).map_or_else(|| Self::Literal(Value::String(s.to_string())), Self::Expr)
    }

    /// Converts JSON to a template. Objects become maps, arrays become lists
    /// and strings are parsed for bind-expressions.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => Self::parse(&s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
            other => Self::Literal(other),
        }
    }

    /// Sets a field of a map template, replacing an existing one.
    ///
    /// Has no effect on other templates.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Self>) -> Self {
        if let Self::Map(fields) = &mut self {
            let key = key.into();
            let value = value.into();
            match fields.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => *existing = value,
                None => fields.push((key, value)),
            }
        }
        self
    }

    /// Gets a field of a map template.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns true for map templates.
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Checks that no map field captures multiple segments.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Map(fields) => fields.iter().try_for_each(|(_, value)| {
                if let Self::Expr(expr) = value {
                    if let Some(option) = expr.multi_part() {
                        return Err(RouterError::MultiPartInMap(option.to_string()));
                    }
                }
                value.validate()
            }),
            Self::List(items) => items.iter().try_for_each(Self::validate),
            _ => Ok(()),
        }
    }

    /// Converts to JSON. Expressions are written back as strings, handlers
    /// and opaque objects become placeholders.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Expr(expr) => Value::String(expr.to_string()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Handler(_) => Value::String("<handler>".to_string()),
            Self::Opaque(_) => Value::String("<object>".to_string()),
        }
    }
}

impl fmt::Debug for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Expr(expr) => write!(f, "Expr({expr})"),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Map(fields) => f
                .debug_map()
                .entries(fields.iter().map(|(k, v)| (k, v)))
                .finish(),
            Self::Handler(_) => f.write_str("Handler"),
            Self::Opaque(_) => f.write_str("Opaque"),
        }
    }
}

impl PartialEq for RouteTemplate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Expr(a), Self::Expr(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => Arc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for RouteTemplate {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for RouteTemplate {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Value> for RouteTemplate {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<Handler> for RouteTemplate {
    fn from(handler: Handler) -> Self {
        Self::Handler(handler)
    }
}

impl From<Vec<RouteTemplate>> for RouteTemplate {
    fn from(items: Vec<RouteTemplate>) -> Self {
        Self::List(items)
    }
}
