//! HTTP request type.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::record::RouteRecord;
use crate::url::parse_query_string;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method
    Get,
    /// HEAD method
    Head,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
    /// OPTIONS method
    Options,
    /// CONNECT method
    Connect,
    /// TRACE method
    Trace,
}

impl Method {
    /// Parses a method name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "OPTIONS" => Some(Self::Options),
            "CONNECT" => Some(Self::Connect),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Returns the method as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An HTTP request.
///
/// Requests are values: the `with_*` methods consume the request and return
/// a modified copy, so middleware hand a new request to `next` instead of
/// mutating a shared one.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Request path, without query string.
    pub path: String,
    /// Query string parameters.
    pub query: HashMap<String, String>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Cookies sent with the request.
    pub cookies: HashMap<String, String>,
    /// Parsed body (form fields or decoded JSON).
    pub parsed_body: Option<Value>,
    /// Raw request body.
    pub body: Vec<u8>,
    route: Option<Arc<RouteRecord>>,
    original_path: Option<String>,
}

impl Request {
    /// Creates a new request.
    ///
    /// The target may carry a query string, which is parsed into `query`.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let target = target.into();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query_string(query)),
            None => (target, HashMap::new()),
        };

        Self {
            method,
            path,
            query,
            headers: HashMap::new(),
            cookies: HashMap::new(),
            parsed_body: None,
            body: Vec::new(),
            route: None,
            original_path: None,
        }
    }

    /// Creates a GET request.
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    /// Creates a POST request.
    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::Post, target)
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets a query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Sets a cookie.
    #[must_use]
    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }

    /// Sets a field of the parsed body, turning it into an object if needed.
    #[must_use]
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let body = self
            .parsed_body
            .get_or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !body.is_object() {
            *body = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = body {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Sets the parsed body.
    #[must_use]
    pub fn parsed_body(mut self, body: Value) -> Self {
        self.parsed_body = Some(body);
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Gets a header value.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        // Case-insensitive header lookup
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Gets a header value, or an empty string when it is absent.
    pub fn header_line(&self, key: &str) -> String {
        self.get_header(key).unwrap_or_default().to_string()
    }

    /// Gets a query parameter.
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Gets a cookie.
    pub fn get_cookie(&self, key: &str) -> Option<&str> {
        self.cookies.get(key).map(String::as_str)
    }

    /// Gets a field of the parsed body.
    pub fn get_body_param(&self, key: &str) -> Option<&Value> {
        self.parsed_body.as_ref()?.get(key).filter(|v| !v.is_null())
    }

    /// Returns the route attached to this request, if any.
    pub fn route(&self) -> Option<&RouteRecord> {
        self.route.as_deref()
    }

    /// Returns a copy of this request carrying the given route.
    #[must_use]
    pub fn with_route(mut self, route: RouteRecord) -> Self {
        self.route = Some(Arc::new(route));
        self
    }

    /// Returns a copy of this request with a different path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Returns a copy of this request without query parameters.
    #[must_use]
    pub fn without_query(mut self) -> Self {
        self.query.clear();
        self
    }

    /// Returns the path before a base path was stripped from it.
    pub fn original_path(&self) -> Option<&str> {
        self.original_path.as_deref()
    }

    /// Returns a copy of this request remembering its original path.
    #[must_use]
    pub fn with_original_path(mut self, path: impl Into<String>) -> Self {
        self.original_path = Some(path.into());
        self
    }

    /// Returns the body as a string.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }
}
