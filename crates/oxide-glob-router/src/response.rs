//! HTTP response type.

use std::collections::HashMap;

/// An HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a new response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Turns this response into a bare status response whose body is the
    /// reason phrase, e.g. `404 Not Found`.
    #[must_use]
    pub fn with_reason(self, status: u16) -> Self {
        let mut res = self.with_status(status);
        let reason = res.status_text();
        res.body = reason.as_bytes().to_vec();
        res
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::default().with_reason(404)
    }

    /// Creates a 405 Method Not Allowed response.
    pub fn method_not_allowed() -> Self {
        Self::default().with_reason(405)
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Returns a copy of this response with another status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends text to the body.
    pub fn write(&mut self, text: &str) {
        self.body.extend_from_slice(text.as_bytes());
    }

    /// Gets a header value.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the body as a string.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Returns true for 4xx and 5xx responses.
    pub const fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Returns the status text for the current status code. Codes without a
    /// registered reason phrase get the name of their class.
    pub const fn status_text(&self) -> &'static str {
        match self.status {
            100 => "Continue",
            101 => "Switching Protocols",
            102 => "Processing",
            103 => "Early Hints",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            206 => "Partial Content",
            207 => "Multi-Status",
            208 => "Already Reported",
            226 => "IM Used",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Content Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Range Not Satisfiable",
            417 => "Expectation Failed",
            418 => "I'm a teapot",
            421 => "Misdirected Request",
            422 => "Unprocessable Content",
            423 => "Locked",
            424 => "Failed Dependency",
            425 => "Too Early",
            426 => "Upgrade Required",
            428 => "Precondition Required",
            429 => "Too Many Requests",
            431 => "Request Header Fields Too Large",
            451 => "Unavailable For Legal Reasons",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            506 => "Variant Also Negotiates",
            507 => "Insufficient Storage",
            508 => "Loop Detected",
            510 => "Not Extended",
            511 => "Network Authentication Required",
            100..=199 => "Informational",
            200..=299 => "Success",
            300..=399 => "Redirection",
            400..=499 => "Client Error",
            500..=599 => "Server Error",
            _ => "Unknown",
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let res = Response::not_found();
        assert_eq!(res.status, 404);
        assert_eq!(res.body_string(), Some("Not Found".to_string()));
        assert!(res.is_error());
    }

    #[test]
    fn test_with_reason_keeps_headers() {
        let res = Response::ok().header("X-Custom", "value").with_reason(405);
        assert_eq!(res.status, 405);
        assert_eq!(res.get_header("x-custom"), Some("value"));
        assert_eq!(res.body_string(), Some("Method Not Allowed".to_string()));
    }

    #[test]
    fn test_reason_phrases() {
        let body = |status| Response::ok().with_reason(status).body_string();
        assert_eq!(body(451), Some("Unavailable For Legal Reasons".to_string()));
        assert_eq!(body(429), Some("Too Many Requests".to_string()));
        assert_eq!(body(499), Some("Client Error".to_string()));
        assert_eq!(body(599), Some("Server Error".to_string()));
        assert_eq!(body(299), Some("Success".to_string()));
        assert_eq!(body(700), Some("Unknown".to_string()));
    }

    #[test]
    fn test_response_builder() {
        let mut res = Response::ok().header("X-Custom", "value").body("Hello");
        res.write(", World");

        assert_eq!(res.status, 200);
        assert_eq!(res.headers.get("X-Custom"), Some(&"value".to_string()));
        assert_eq!(res.body_string(), Some("Hello, World".to_string()));
        assert!(!res.is_error());
    }
}
