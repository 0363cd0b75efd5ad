#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use oxide_glob_router::{
    handler, DelegateRunner, Handler, Request, Response, RouteTable, Router, RouterConfig,
};
use serde_json::Value;

pub fn table(routes: Value) -> RouteTable {
    RouteTable::from_json(routes).unwrap_or_else(|e| panic!("Invalid routes: {e}"))
}

/// Looks up a request and returns the bound route as JSON.
pub fn resolve(routes: &RouteTable, request: &Request) -> Option<Value> {
    routes
        .lookup(request)
        .unwrap_or_else(|e| panic!("Failed to bind {}: {e}", request.path))
        .map(|route| route.to_json())
}

/// A handler answering with a fixed body.
pub fn reply(body: &'static str) -> Handler {
    handler(move |_req, res: Response| async move { Ok(res.body(body)) })
}

/// A handler answering with the bound route as JSON.
pub fn echo() -> Handler {
    handler(|req: Request, res: Response| async move {
        let route = req.route().map(|r| r.to_json()).unwrap_or_default();
        Ok(res.body(route.to_string()))
    })
}

/// A handler counting its calls.
pub fn counting(calls: Arc<AtomicUsize>) -> Handler {
    handler(move |_req, res: Response| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(res.body("counted")) }
    })
}

pub fn router_from(json: &str, runner: DelegateRunner) -> Router {
    let config = RouterConfig::from_json(json).unwrap_or_else(|e| panic!("Invalid config: {e}"));
    Router::from_config(config, runner).unwrap_or_else(|e| panic!("Invalid router: {e}"))
}

pub async fn call(router: &Router, request: Request) -> Response {
    router
        .handle(request, Response::ok())
        .await
        .unwrap_or_else(|e| panic!("Request failed: {e}"))
}

pub fn body(response: &Response) -> String {
    response.body_string().unwrap_or_default()
}
