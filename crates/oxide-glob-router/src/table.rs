//! Ordered route table.

use std::mem;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;
use tracing::debug;

use crate::binding::bind_record;
use crate::error::{Result, RouterError};
use crate::pattern::RoutePattern;
use crate::record::RouteRecord;
use crate::request::{Method, Request};
use crate::template::RouteTemplate;
use crate::url::{clean_path, split_path};

/// A route: a compiled pattern and its template.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: RoutePattern,
    template: RouteTemplate,
}

impl RouteEntry {
    /// Returns the compiled pattern.
    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Returns the template.
    pub const fn template(&self) -> &RouteTemplate {
        &self.template
    }
}

/// Routes in declaration order.
///
/// Lookup returns the first route whose pattern matches, so more specific
/// routes must be declared before more general ones:
///
/// ```
/// use oxide_glob_router::{Request, RouteTable};
/// use serde_json::json;
///
/// let table = RouteTable::from_json(json!({
///     "/users/new": {"controller": "user-form"},
///     "/users/*": {"controller": "user", "id": "$2"},
/// }))
/// .unwrap();
///
/// let route = table.lookup(&Request::get("/users/new")).unwrap().unwrap();
/// assert_eq!(route.get_str("controller"), Some("user-form"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
}

impl RouteTable {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Creates a table from `(key, template)` pairs, in order.
    pub fn from_routes<K, T>(routes: impl IntoIterator<Item = (K, T)>) -> Result<Self>
    where
        K: AsRef<str>,
        T: Into<RouteTemplate>,
    {
        let mut table = Self::new();
        for (key, template) in routes {
            table.insert(key.as_ref(), template)?;
        }
        Ok(table)
    }

    /// Creates a table from a JSON object mapping route keys to templates.
    pub fn from_json(routes: Value) -> Result<Self> {
        match routes {
            Value::Object(routes) => Self::from_routes(routes),
            other => Err(RouterError::InvalidTemplate {
                key: String::new(),
                reason: format!("routes should be an object, got {other}"),
            }),
        }
    }

    /// Adds a route, or replaces the template of an existing key in place.
    ///
    /// Returns the replaced template.
    pub fn insert(
        &mut self,
        key: &str,
        template: impl Into<RouteTemplate>,
    ) -> Result<Option<RouteTemplate>> {
        let pattern = RoutePattern::compile(key)?;
        let template = template.into();

        if !template.is_map() {
            return Err(RouterError::InvalidTemplate {
                key: key.to_string(),
                reason: "a route should be a map of fields".to_string(),
            });
        }
        template.validate()?;

        match self.position(key) {
            Some(i) => Ok(Some(mem::replace(&mut self.routes[i].template, template))),
            None => {
                self.routes.push(RouteEntry { pattern, template });
                Ok(None)
            }
        }
    }

    /// Removes a route, returning its template.
    pub fn remove(&mut self, key: &str) -> Result<Option<RouteTemplate>> {
        if key.trim().is_empty() {
            return Err(RouterError::EmptyPattern);
        }
        Ok(self.position(key).map(|i| self.routes.remove(i).template))
    }

    /// Gets the template of a route.
    pub fn get(&self, key: &str) -> Option<&RouteTemplate> {
        self.position(key).map(|i| &self.routes[i].template)
    }

    /// Returns true if a route with this key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Replaces all routes, returning the previous table.
    pub fn exchange(&mut self, routes: Self) -> Self {
        mem::replace(self, routes)
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over the routes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.routes.iter().position(|r| r.pattern.key() == key)
    }

    /// Finds the first route matching the path and method.
    ///
    /// With `None` as method, any route matching the path is returned.
    pub fn find(&self, path: &str, method: Option<Method>) -> Option<&RouteEntry> {
        let path = clean_path(path);
        self.routes
            .iter()
            .find(|route| route.pattern.matches(path, method))
    }

    /// Returns true if a route matches the path and method.
    pub fn exists(&self, path: &str, method: Option<Method>) -> bool {
        self.find(path, method).is_some()
    }

    /// Returns true if a route matches the request, checking its method only
    /// when `with_method` is set.
    pub fn has_route(&self, request: &Request, with_method: bool) -> bool {
        self.exists(&request.path, with_method.then_some(request.method))
    }

    /// Finds the route for a request and binds it.
    ///
    /// Returns `Ok(None)` when no route matches.
    pub fn lookup(&self, request: &Request) -> Result<Option<RouteRecord>> {
        let Some(route) = self.find(&request.path, Some(request.method)) else {
            return Ok(None);
        };

        debug!(
            method = %request.method,
            path = %request.path,
            pattern = %route.pattern,
            "Route matched"
        );

        let segments = split_path(clean_path(&request.path));
        bind_record(&route.template, request, &segments).map(Some)
    }
}

/// A route table shared between requests.
///
/// Each request works on the snapshot it loaded; updates swap in a new table
/// without blocking readers.
#[derive(Debug, Clone, Default)]
pub struct SharedRoutes {
    table: Arc<ArcSwap<RouteTable>>,
}

impl SharedRoutes {
    /// Shares a table.
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(table)),
        }
    }

    /// Returns the current snapshot.
    pub fn load(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Swaps in a new table, returning the previous one.
    pub fn replace(&self, table: RouteTable) -> Arc<RouteTable> {
        self.table.swap(Arc::new(table))
    }

    /// Applies a change to a copy of the current table and swaps it in.
    ///
    /// Nothing is swapped if the change fails.
    pub fn update<F>(&self, mut change: F) -> Result<()>
    where
        F: FnMut(&mut RouteTable) -> Result<()>,
    {
        let mut failure = None;
        self.table.rcu(|current| {
            let mut table = RouteTable::clone(current);
            match change(&mut table) {
                Ok(()) => {
                    failure = None;
                    Arc::new(table)
                }
                Err(err) => {
                    failure = Some(err);
                    Arc::clone(current)
                }
            }
        });
        failure.map_or(Ok(()), Err)
    }
}

impl From<RouteTable> for SharedRoutes {
    fn from(table: RouteTable) -> Self {
        Self::new(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> RouteTable {
        RouteTable::from_json(json!({
            "/": {"controller": "home"},
            "/users/new +GET": {"controller": "user-form"},
            "/users/* +GET": {"controller": "user", "id": "$2"},
            "/users/* +POST": {"controller": "user-save", "id": "$2"},
            "/files/**": {"file": "files.php", "path": ["$2..."]},
        }))
        .unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let table = table();
        let route = table.lookup(&Request::get("/users/new")).unwrap().unwrap();
        assert_eq!(route.get_str("controller"), Some("user-form"));

        let route = table.lookup(&Request::get("/users/42/")).unwrap().unwrap();
        assert_eq!(route.get_str("controller"), Some("user"));
        assert_eq!(route.get_str("id"), Some("42"));

        let route = table.lookup(&Request::post("/users/42")).unwrap().unwrap();
        assert_eq!(route.get_str("controller"), Some("user-save"));
    }

    #[test]
    fn test_lookup_miss() {
        let table = table();
        assert!(table.lookup(&Request::get("/nope")).unwrap().is_none());
        assert!(table
            .lookup(&Request::new(Method::Delete, "/users/1"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_exists_with_and_without_method() {
        let table = table();
        let delete = Request::new(Method::Delete, "/users/1");
        assert!(table.has_route(&delete, false));
        assert!(!table.has_route(&delete, true));
        assert!(!table.exists("/nope", None));
        assert!(table.exists("/", Some(Method::Get)));
    }

    #[test]
    fn test_splices_tail_segments() {
        let route = table()
            .lookup(&Request::get("/files/a/b/c.txt"))
            .unwrap()
            .unwrap();
        assert_eq!(route.to_json()["path"], json!(["a", "b", "c.txt"]));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = table();
        let old = table
            .insert("/users/new +GET", json!({"controller": "signup"}))
            .unwrap();
        assert!(old.is_some());
        assert_eq!(table.len(), 5);
        assert_eq!(table.iter().nth(1).map(|r| r.pattern().key()), Some("/users/new +GET"));

        assert!(table.remove("/").unwrap().is_some());
        assert!(!table.contains("/"));
        assert!(table.remove("/").unwrap().is_none());
    }

    #[test]
    fn test_rejects_invalid_routes() {
        let mut table = RouteTable::new();
        assert!(matches!(
            table.insert("  ", json!({"controller": "x"})),
            Err(RouterError::EmptyPattern)
        ));
        assert!(matches!(
            table.insert("/foo", json!("bar")),
            Err(RouterError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            table.insert("/foo/*", json!({"check": "$1..."})),
            Err(RouterError::MultiPartInMap(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_exchange() {
        let mut table = table();
        let old = table.exchange(RouteTable::new());
        assert_eq!(old.len(), 5);
        assert!(table.is_empty());
    }

    #[test]
    fn test_shared_routes_update() {
        let shared = SharedRoutes::new(table());
        let snapshot = shared.load();

        shared
            .update(|table| table.insert("/about", json!({"controller": "about"})).map(drop))
            .unwrap();
        assert!(shared.load().contains("/about"));
        assert!(!snapshot.contains("/about"));

        let failed = shared.update(|table| table.insert("", json!({})).map(drop));
        assert!(failed.is_err());
        assert_eq!(shared.load().len(), 6);
    }
}
