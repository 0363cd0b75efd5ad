use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};

use crate::error::{Result, RouterError};
use crate::pipeline::{BoxFuture, Handler};
use crate::record::RouteAction;
use crate::request::Request;
use crate::response::Response;

use super::Runner;

static WORD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|(\w)-)(\w)").expect("Invalid word regex"));

static CLASS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]\w*::)*[A-Za-z_]\w*$").expect("Invalid class name regex")
});

/// Converts a kebab-case name to StudlyCase: `user-profile` becomes
/// `UserProfile`.
fn studly_case(name: &str) -> String {
    WORD_START
        .replace_all(&name.to_lowercase(), |caps: &Captures<'_>| {
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            format!("{prefix}{}", caps[2].to_uppercase())
        })
        .into_owned()
}

/// Derives a controller name from route segments.
///
/// ```
/// use oxide_glob_router::runner::controller_class;
///
/// assert_eq!(controller_class(&["user-profile"]), "UserProfileController");
/// assert_eq!(controller_class(&["foo", "BAR", "zoo"]), "Foo::Bar::ZooController");
/// ```
pub fn controller_class<S: AsRef<str>>(segments: &[S]) -> String {
    let path: Vec<String> = segments.iter().map(|s| studly_case(s.as_ref())).collect();
    format!("{}Controller", path.join("::"))
}

/// A registry of controllers by name.
#[derive(Clone, Default)]
pub struct ControllerFactory {
    controllers: HashMap<String, Handler>,
}

impl ControllerFactory {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, controller: Handler) -> Self {
        self.insert(name, controller);
        self
    }

    /// Registers a controller.
    pub fn insert(&mut self, name: impl Into<String>, controller: Handler) {
        self.controllers.insert(name.into(), controller);
    }

    /// Returns the number of registered controllers.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns true if no controller is registered.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Gets the controller for route segments.
    pub fn create<S: AsRef<str>>(&self, segments: &[S]) -> Result<Handler> {
        let name = controller_class(segments);

        if !CLASS_NAME.is_match(&name) {
            return Err(RouterError::InvalidController(name));
        }

        if let Some(controller) = self.controllers.get(&name) {
            return Ok(Arc::clone(controller));
        }

        let reason = self
            .controllers
            .keys()
            .find(|registered| registered.eq_ignore_ascii_case(&name))
            .map_or_else(
                || "controller not registered".to_string(),
                |registered| format!("case mismatch with '{registered}'"),
            );

        Err(RouterError::ControllerNotFound { name, reason })
    }
}

/// Runs the controller named in the route's `controller` field.
///
/// A route without a controller runs `DefaultController`.
#[derive(Clone, Default)]
pub struct ControllerRunner {
    factory: Arc<ControllerFactory>,
}

impl ControllerRunner {
    /// Creates a runner for the registered controllers.
    pub fn new(factory: ControllerFactory) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Returns the controller registry.
    pub fn factory(&self) -> &ControllerFactory {
        &self.factory
    }
}

impl Runner for ControllerRunner {
    fn run<'a>(
        &'a self,
        request: Request,
        response: Response,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin(async move {
            let name = match request.route().map(|route| route.action()) {
                Some(Ok(RouteAction::Controller(name))) => name,
                Some(Err(err)) if !matches!(err, RouterError::NoAction) => return Err(err),
                _ => vec!["default".to_string()],
            };

            let controller = self.factory.create(&name)?;
            controller(request, response).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler;
    use crate::record::{RouteRecord, RouteValue};

    fn ok_handler(body: &'static str) -> Handler {
        handler(move |_req, res: Response| async move { Ok(res.body(body)) })
    }

    #[test]
    fn test_studly_case() {
        assert_eq!(studly_case("foo"), "Foo");
        assert_eq!(studly_case("foo-bar"), "FooBar");
        assert_eq!(studly_case("FOO-BAR"), "FooBar");
        assert_eq!(studly_case("foo--bar-zoo"), "Foo--barZoo");
    }

    #[test]
    fn test_controller_class() {
        assert_eq!(controller_class(&["foo"]), "FooController");
        assert_eq!(controller_class(&["foo-bar"]), "FooBarController");
        assert_eq!(controller_class(&["foo", "BAR", "zoo"]), "Foo::Bar::ZooController");
    }

    #[test]
    fn test_factory_errors() {
        let factory = ControllerFactory::new().register("Foo::BarController", ok_handler("bar"));

        assert!(factory.create(&["foo", "bar"]).is_ok());
        assert!(matches!(
            factory.create(&["foo--bar"]),
            Err(RouterError::InvalidController(name)) if name == "Foo--barController"
        ));
        assert!(matches!(
            factory.create(&["zoo"]),
            Err(RouterError::ControllerNotFound { reason, .. }) if reason == "controller not registered"
        ));

        let factory = ControllerFactory::new().register("FOOController", ok_handler("foo"));
        let err = factory.create(&["foo"]).err().unwrap();
        assert_eq!(
            err.to_string(),
            "can't route to controller 'FooController': case mismatch with 'FOOController'"
        );
    }

    #[tokio::test]
    async fn test_default_controller() {
        let runner = ControllerRunner::new(
            ControllerFactory::new().register("DefaultController", ok_handler("default")),
        );
        let req = Request::get("/").with_route(RouteRecord::default());

        let res = runner.run(req, Response::ok()).await.unwrap();
        assert_eq!(res.body_string(), Some("default".to_string()));
    }

    #[tokio::test]
    async fn test_controller_segments() {
        let runner = ControllerRunner::new(
            ControllerFactory::new().register("Admin::UserController", ok_handler("admin")),
        );
        let record = RouteRecord::new(
            [(
                "controller".to_string(),
                RouteValue::List(vec!["admin".into(), "user".into()]),
            )]
            .into_iter()
            .collect(),
        );

        let res = runner
            .run(Request::get("/").with_route(record), Response::ok())
            .await
            .unwrap();
        assert_eq!(res.body_string(), Some("admin".to_string()));
    }
}
