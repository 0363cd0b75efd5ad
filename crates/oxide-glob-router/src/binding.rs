//! Variable binding.
//!
//! Binding walks a [`RouteTemplate`] depth-first and resolves every
//! bind-expression against the matched URL segments and the request.
//!
//! Null results are handled differently per container:
//! - in a map, a field that resolves to null is left out;
//! - in a list, it is kept as null so positions are preserved.
//!
//! Literal null fields are skipped in both.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, RouterError};
use crate::record::{RouteRecord, RouteValue};
use crate::request::Request;
use crate::template::{BindExpr, BindOption, RouteTemplate};

/// Binds a template to a request.
///
/// `segments` are the decoded segments of the matched path, see
/// [`split_path`](crate::url::split_path).
pub fn bind(template: &RouteTemplate, request: &Request, segments: &[String]) -> Result<RouteValue> {
    let binder = Binder { request, segments };
    match template {
        RouteTemplate::Map(fields) => binder.bind_map(fields).map(RouteValue::Map),
        RouteTemplate::List(items) => binder.bind_list(items).map(RouteValue::List),
        other => match binder.bind_field(other, Container::List)? {
            Bound::Skip => Ok(RouteValue::null()),
            Bound::One(value) => Ok(value),
            Bound::Splice(values) => Ok(RouteValue::List(values)),
        },
    }
}

/// Binds a map template to a request, producing a route record.
pub fn bind_record(
    template: &RouteTemplate,
    request: &Request,
    segments: &[String],
) -> Result<RouteRecord> {
    match bind(template, request, segments)? {
        RouteValue::Map(fields) => Ok(RouteRecord::new(fields)),
        _ => Err(RouterError::InvalidTemplate {
            key: String::new(),
            reason: "a route should be a map of fields".to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Map,
    List,
}

/// The result of binding one field.
enum Bound {
    /// Nothing to add.
    Skip,
    /// A single value.
    One(RouteValue),
    /// Several values, spliced into a list.
    Splice(Vec<RouteValue>),
}

struct Binder<'a> {
    request: &'a Request,
    segments: &'a [String],
}

impl Binder<'_> {
    fn bind_map(&self, fields: &[(String, RouteTemplate)]) -> Result<BTreeMap<String, RouteValue>> {
        let mut values = BTreeMap::new();

        for (key, template) in fields {
            match self.bind_field(template, Container::Map)? {
                Bound::One(value) if !value.is_null() => {
                    values.insert(key.clone(), value);
                }
                Bound::Splice(_) => return Err(RouterError::MultiPartInMap(key.clone())),
                _ => {}
            }
        }

        Ok(values)
    }

    fn bind_list(&self, items: &[RouteTemplate]) -> Result<Vec<RouteValue>> {
        let mut values = Vec::with_capacity(items.len());

        for template in items {
            match self.bind_field(template, Container::List)? {
                Bound::Skip => {}
                Bound::One(value) => values.push(value),
                Bound::Splice(more) => values.extend(more),
            }
        }

        Ok(values)
    }

    fn bind_field(&self, template: &RouteTemplate, container: Container) -> Result<Bound> {
        let bound = match template {
            RouteTemplate::Literal(Value::Null) => Bound::Skip,
            RouteTemplate::Literal(value) => Bound::One(RouteValue::Value(value.clone())),
            RouteTemplate::Handler(handler) => Bound::One(RouteValue::Handler(handler.clone())),
            RouteTemplate::Opaque(obj) => Bound::One(RouteValue::Opaque(obj.clone())),
            RouteTemplate::Map(fields) => Bound::One(RouteValue::Map(self.bind_map(fields)?)),
            RouteTemplate::List(items) => Bound::One(RouteValue::List(self.bind_list(items)?)),
            RouteTemplate::Expr(BindExpr::Alternatives(options)) => {
                self.resolve(options, container)?
            }
            RouteTemplate::Expr(BindExpr::Concat(pieces)) => {
                let text: String = self
                    .bind_list(pieces)?
                    .iter()
                    .filter_map(RouteValue::to_text)
                    .collect();
                Bound::One(RouteValue::from(text))
            }
        };

        Ok(bound)
    }

    /// Tries each option in turn; the first one that resolves wins.
    fn resolve(&self, options: &[BindOption], container: Container) -> Result<Bound> {
        for option in options {
            let value = match option {
                BindOption::Literal(text) => Some(RouteValue::from(text.as_str())),
                BindOption::Segment(n) => self.segments.get(n - 1).map(|s| s.as_str().into()),
                BindOption::Segments(n) => {
                    if container == Container::Map {
                        return Err(RouterError::MultiPartInMap(option.to_string()));
                    }
                    let tail = self.segments.get(n - 1..).unwrap_or_default();
                    return Ok(Bound::Splice(
                        tail.iter().map(|s| RouteValue::from(s.as_str())).collect(),
                    ));
                }
                BindOption::Query(key) => self.request.get_query(key).map(RouteValue::from),
                BindOption::Body(key) => self
                    .request
                    .get_body_param(key)
                    .map(|v| RouteValue::Value(v.clone())),
                BindOption::Cookie(key) => self.request.get_cookie(key).map(RouteValue::from),
                BindOption::Header(name) => self.request.get_header(name).map(RouteValue::from),
                BindOption::Unresolvable(source) => {
                    debug!(option = %source, "Bind option can't be resolved");
                    None
                }
            };

            if let Some(value) = value {
                return Ok(Bound::One(value));
            }
        }

        Ok(Bound::One(RouteValue::null()))
    }
}
