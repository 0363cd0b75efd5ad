use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, RouterError};
use crate::pipeline::BoxFuture;
use crate::request::Request;
use crate::response::Response;

use super::Runner;

/// Executes a script file for a request.
pub type ScriptHandler =
    Arc<dyn Fn(PathBuf, Request, Response) -> BoxFuture<'static, Result<Response>> + Send + Sync>;

/// Runs the script named in the route's `file` field.
///
/// File names are resolved below a root directory. Names starting with `~`
/// or containing `..` or `:` are refused. By default the file contents are
/// sent as the response body; use [`ScriptRunner::with_handler`] to execute
/// the file instead.
///
/// The default handler reads the file with blocking `std::fs` I/O on the
/// task that polls it. Hosts serving large files from a multi-threaded
/// runtime should install a handler that reads asynchronously, e.g. with
/// `tokio::fs::read` or `spawn_blocking`.
#[derive(Clone)]
pub struct ScriptRunner {
    root: PathBuf,
    handler: ScriptHandler,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ScriptRunner {
    /// Creates a runner for scripts below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handler: Arc::new(send_file),
        }
    }

    /// Sets the function that executes a resolved script.
    #[must_use]
    pub fn with_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(PathBuf, Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        let handler: ScriptHandler =
            Arc::new(move |path, req, res| Box::pin(handler(path, req, res)));
        self.handler = handler;
        self
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a file name from a route to an existing file below the root.
    pub fn resolve(&self, file: &str) -> Result<PathBuf> {
        if file.starts_with('~') || file.contains("..") || file.contains(':') {
            return Err(RouterError::Script {
                path: PathBuf::from(file),
                reason: "'~', '..' and ':' not allowed in filename".to_string(),
            });
        }

        let path = self.root.join(file.trim_start_matches('/'));
        if !path.is_file() {
            return Err(RouterError::Script {
                path,
                reason: "file doesn't exist".to_string(),
            });
        }

        Ok(path)
    }
}

/// Default handler: reads the whole file into the body. Blocks while reading.
fn send_file(
    path: PathBuf,
    _request: Request,
    response: Response,
) -> BoxFuture<'static, Result<Response>> {
    Box::pin(async move {
        let body = std::fs::read(&path).map_err(|err| RouterError::Script {
            path,
            reason: err.to_string(),
        })?;
        Ok(response.body(body))
    })
}

impl Runner for ScriptRunner {
    fn run<'a>(
        &'a self,
        request: Request,
        response: Response,
    ) -> BoxFuture<'a, Result<Response>> {
        let path = match request.route().and_then(|route| route.get_str("file")) {
            Some(file) => self.resolve(file),
            None => Err(RouterError::InvalidAction {
                field: "file",
                reason: "should be a path".to_string(),
            }),
        };

        match path {
            Ok(path) => (self.handler)(path, request, response),
            Err(err) => Box::pin(async move { Err(err) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RouteRecord, RouteValue};

    fn script_request(file: &str) -> Request {
        let record = RouteRecord::new(
            [("file".to_string(), RouteValue::from(file))]
                .into_iter()
                .collect(),
        );
        Request::get("/").with_route(record)
    }

    #[test]
    fn test_refuses_unsafe_names() {
        let runner = ScriptRunner::new("/srv");
        for file in ["~/secret.php", "../etc/passwd", "a/../../b", "c:/boot.ini"] {
            assert!(
                matches!(runner.resolve(file), Err(RouterError::Script { .. })),
                "{file} should be refused"
            );
        }
    }

    #[tokio::test]
    async fn test_serves_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "Hello").unwrap();
        let runner = ScriptRunner::new(dir.path());

        let res = runner
            .run(script_request("/hello.txt"), Response::ok())
            .await
            .unwrap();
        assert_eq!(res.body_string(), Some("Hello".to_string()));

        let err = runner
            .run(script_request("missing.txt"), Response::ok())
            .await
            .unwrap_err();
        assert!(err.is_runner_fault());
    }

    #[tokio::test]
    async fn test_custom_handler() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.php"), "<?php").unwrap();
        let runner = ScriptRunner::new(dir.path()).with_handler(
            |path: PathBuf, _req, res: Response| async move {
                Ok(res.body(path.file_name().unwrap().to_string_lossy().into_owned()))
            },
        );

        let res = runner
            .run(script_request("index.php"), Response::ok())
            .await
            .unwrap();
        assert_eq!(res.body_string(), Some("index.php".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_file_handler() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<h1>Hi</h1>").unwrap();
        let runner = ScriptRunner::new(dir.path()).with_handler(
            |path: PathBuf, _req, res: Response| async move {
                match tokio::fs::read(&path).await {
                    Ok(body) => Ok(res.body(body)),
                    Err(err) => Err(RouterError::Script { path, reason: err.to_string() }),
                }
            },
        );

        let res = runner
            .run(script_request("page.html"), Response::ok())
            .await
            .unwrap();
        assert_eq!(res.body_string(), Some("<h1>Hi</h1>".to_string()));
    }
}
