use crate::error::{Result, RouterError};
use crate::pipeline::{BoxFuture, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::url::normalize_path;

/// Serves the application below a base path.
///
/// Requests outside the base path get a 404. For the others the base path is
/// removed from the request path, and the full path is kept as
/// [`Request::original_path`].
#[derive(Debug, Clone)]
pub struct BasePath {
    base: String,
}

impl BasePath {
    /// Creates the middleware. The base path must contain at least one
    /// segment.
    pub fn new(base: &str) -> Result<Self> {
        let normalized = normalize_path(base);
        if normalized == "/" {
            return Err(RouterError::InvalidBasePath(base.to_string()));
        }
        Ok(Self { base: normalized })
    }

    /// Returns the normalized base path.
    pub fn base_path(&self) -> &str {
        &self.base
    }

    /// Removes the base path, ignoring case. Returns `None` for paths outside
    /// the base path.
    pub fn strip(&self, path: &str) -> Option<String> {
        let path = normalize_path(path);
        let prefix = path.get(..self.base.len())?;
        let rest = &path[self.base.len()..];

        if !prefix.eq_ignore_ascii_case(&self.base) || !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }

        Some(if rest.is_empty() { "/" } else { rest }.to_string())
    }
}

impl Middleware for BasePath {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        match self.strip(&request.path) {
            Some(path) => {
                let original = normalize_path(&request.path);
                next.run(request.with_path(path).with_original_path(original), response)
            }
            None => Box::pin(async move { Ok(response.with_reason(404)) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler;

    #[test]
    fn test_invalid_base_path() {
        assert!(matches!(BasePath::new(""), Err(RouterError::InvalidBasePath(_))));
        assert!(matches!(BasePath::new("/"), Err(RouterError::InvalidBasePath(_))));
        assert_eq!(BasePath::new("foo/").unwrap().base_path(), "/foo");
    }

    #[test]
    fn test_strip() {
        let base = BasePath::new("/foo").unwrap();
        assert_eq!(base.strip("/foo/bar"), Some("/bar".to_string()));
        assert_eq!(base.strip("/FOO/bar/"), Some("/bar".to_string()));
        assert_eq!(base.strip("/foo"), Some("/".to_string()));
        assert_eq!(base.strip("/foobar"), None);
        assert_eq!(base.strip("/bar/foo"), None);
        assert_eq!(base.strip("/"), None);
    }

    #[tokio::test]
    async fn test_handle() {
        let base = BasePath::new("/app").unwrap();
        let echo = handler(|req: Request, res: Response| async move {
            let original = req.original_path().unwrap_or_default().to_string();
            Ok(res.body(format!("{} {}", req.path, original)))
        });

        let res = base
            .handle(Request::get("/app/users"), Response::ok(), Next::terminal(echo.clone()))
            .await
            .unwrap();
        assert_eq!(res.body_string(), Some("/users /app/users".to_string()));

        let res = base
            .handle(Request::get("/other"), Response::ok(), Next::terminal(echo))
            .await
            .unwrap();
        assert_eq!(res.status, 404);
        assert_eq!(res.body_string(), Some("Not Found".to_string()));
    }
}
