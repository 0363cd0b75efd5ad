//! Bound routes.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, RouterError};
use crate::pipeline::Handler;

/// A value in a bound route.
#[derive(Clone)]
pub enum RouteValue {
    /// Plain data: strings, numbers, booleans, null, or JSON from the body.
    Value(Value),
    /// An ordered list.
    List(Vec<RouteValue>),
    /// A map of named fields.
    Map(BTreeMap<String, RouteValue>),
    /// A request handler, passed through unchanged.
    Handler(Handler),
    /// Any other object, passed through unchanged.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl RouteValue {
    /// The null value.
    pub const fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// Returns true for null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// Returns the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(v) => v.as_str(),
            _ => None,
        }
    }

    /// Returns the plain data, if this is plain data.
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the items, if this is a list.
    pub fn as_list(&self) -> Option<&[RouteValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the fields, if this is a map.
    pub const fn as_map(&self) -> Option<&BTreeMap<String, RouteValue>> {
        match self {
            Self::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the handler, if this is one.
    pub const fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    /// Downcasts an opaque value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(obj) => obj.downcast_ref(),
            _ => None,
        }
    }

    /// Returns the text used when the value is concatenated.
    ///
    /// Only scalars have a textual form.
    pub fn to_text(&self) -> Option<String> {
        match self.as_value()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Converts to JSON. Handlers and opaque objects become placeholders.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
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

    /// Returns true when the value counts as set for action selection.
    fn is_present(&self) -> bool {
        match self {
            Self::Value(Value::Null) => false,
            Self::Value(Value::String(s)) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Debug for RouteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Map(fields) => f.debug_map().entries(fields).finish(),
            Self::Handler(_) => f.write_str("Handler"),
            Self::Opaque(_) => f.write_str("Opaque"),
        }
    }
}

impl PartialEq for RouteValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => Arc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for RouteValue {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_string()))
    }
}

impl From<String> for RouteValue {
    fn from(s: String) -> Self {
        Self::Value(Value::String(s))
    }
}

impl From<Value> for RouteValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Vec<RouteValue>> for RouteValue {
    fn from(items: Vec<RouteValue>) -> Self {
        Self::List(items)
    }
}

/// A route with every bind-expression resolved.
///
/// This is what the dispatcher attaches to the request and hands to the
/// runner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteRecord {
    fields: BTreeMap<String, RouteValue>,
}

impl RouteRecord {
    /// Creates a record from its fields.
    pub const fn new(fields: BTreeMap<String, RouteValue>) -> Self {
        Self { fields }
    }

    /// Gets a field.
    pub fn get(&self, key: &str) -> Option<&RouteValue> {
        self.fields.get(key)
    }

    /// Gets a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(RouteValue::as_str)
    }

    /// Returns true if the field is present.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns an iterator over the fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the fields.
    pub fn into_fields(self) -> BTreeMap<String, RouteValue> {
        self.fields
    }

    /// Converts to a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Determines what the route should run.
    pub fn action(&self) -> Result<RouteAction> {
        RouteAction::from_record(self)
    }
}

/// What a route runs.
#[derive(Clone)]
pub enum RouteAction {
    /// A controller, named by one or more kebab-case segments.
    Controller(Vec<String>),
    /// A handler stored in the route.
    Callback(Handler),
    /// A script file.
    Script(PathBuf),
}

impl RouteAction {
    /// Selects the action from the `controller`, `fn` and `file` fields.
    ///
    /// The first field that is set wins, in that order.
    pub fn from_record(route: &RouteRecord) -> Result<Self> {
        let field = |name| route.get(name).filter(|v| v.is_present());

        if let Some(controller) = field("controller") {
            return controller_name(controller).map(Self::Controller);
        }

        if let Some(callback) = field("fn") {
            return callback
                .as_handler()
                .cloned()
                .map(Self::Callback)
                .ok_or_else(|| RouterError::InvalidAction {
                    field: "fn",
                    reason: "should be a callable".to_string(),
                });
        }

        if let Some(file) = field("file") {
            return file
                .as_str()
                .map(|path| Self::Script(PathBuf::from(path)))
                .ok_or_else(|| RouterError::InvalidAction {
                    field: "file",
                    reason: "should be a path".to_string(),
                });
        }

        Err(RouterError::NoAction)
    }
}

impl fmt::Debug for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller(name) => f.debug_tuple("Controller").field(name).finish(),
            Self::Callback(_) => f.write_str("Callback"),
            Self::Script(path) => f.debug_tuple("Script").field(path).finish(),
        }
    }
}

fn controller_name(value: &RouteValue) -> Result<Vec<String>> {
    let invalid = || RouterError::InvalidAction {
        field: "controller",
        reason: "should be a name or a list of names".to_string(),
    };

    match value {
        RouteValue::List(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        other => other
            .as_str()
            .map(|name| vec![name.to_string()])
            .ok_or_else(invalid),
    }
}
