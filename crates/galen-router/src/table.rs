//! The route table and path matching.
//!
//! This module maps virtual sub-requests to operation IDs using path
//! templates with parameter extraction.
//!
//! # Architecture
//!
//! Resolution works in two stages:
//!
//! 1. **Path Resolution**: Match method + path to an `operationId`
//! 2. **Capability Dispatch**: Look up and invoke the operation for that ID
//!    (the dispatcher's job, not this crate's)
//!
//! The table is assembled once at startup through [`RouteTable::builder`]
//! and is immutable afterwards. Registrations are scanned in registration
//! order and the first full match wins; keeping the registration set
//! unambiguous is the registrant's responsibility.
//!
//! # Example
//!
//! ```rust
//! use galen_router::RouteTable;
//! use http::Method;
//!
//! let table = RouteTable::builder()
//!     .route(Method::GET, "/{resourceType}/{id}", "read")
//!     .route(Method::POST, "/{resourceType}", "create")
//!     .build();
//!
//! let result = table.match_route(&Method::GET, "/Patient/1");
//! assert!(result.is_some());
//!
//! let m = result.unwrap();
//! assert_eq!(m.operation_id(), "read");
//! assert_eq!(m.params().get("resourceType"), Some("Patient"));
//! assert_eq!(m.params().get("id"), Some("1"));
//! ```

use http::Method;

use crate::params::Params;

/// A matched route with extracted path parameters.
///
/// Returned by [`RouteTable::match_route`] when a route is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The operation ID of the matched registration
    operation_id: String,

    /// Extracted path parameters (e.g., `id` from `/{resourceType}/{id}`)
    params: Params,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, params: Params) -> Self {
        Self {
            operation_id: operation_id.into(),
            params,
        }
    }

    /// Returns the operation ID for this route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Consumes the match and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Params) {
        (self.operation_id, self.params)
    }
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// A literal segment (e.g., "Patient")
    Literal(String),

    /// A parameter segment (e.g., "{id}")
    Param(String),
}

/// A registered route with its pattern and operation ID.
#[derive(Debug, Clone)]
struct Route {
    /// HTTP method for this route
    method: Method,

    /// Parsed path segments
    segments: Vec<PathSegment>,

    /// Operation ID this route dispatches to
    operation_id: String,

    /// Original path pattern for diagnostics
    pattern: String,
}

impl Route {
    /// Creates a new route from a method, path pattern, and operation ID.
    fn new(method: Method, pattern: &str, operation_id: impl Into<String>) -> Self {
        let segments = Self::parse_segments(pattern);
        Self {
            method,
            segments,
            operation_id: operation_id.into(),
            pattern: pattern.to_string(),
        }
    }

    /// Parses a path pattern into segments.
    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') {
                    // Parameter segment: extract name without braces
                    let name = &s[1..s.len() - 1];
                    PathSegment::Param(name.to_string())
                } else {
                    PathSegment::Literal(s.to_string())
                }
            })
            .collect()
    }

    /// Returns the declared parameter names, in pattern order.
    fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                PathSegment::Param(name) => Some(name.as_str()),
                PathSegment::Literal(_) => None,
            })
            .collect()
    }

    /// Attempts to match this route against a path.
    ///
    /// Returns extracted parameters if the route matches.
    fn match_path(&self, path: &str) -> Option<Params> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // Must have same number of segments
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();

        for (pattern, actual) in self.segments.iter().zip(path_segments.iter()) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != *actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.push(name.clone(), (*actual).to_string());
                }
            }
        }

        Some(params)
    }
}

/// Builder for [`RouteTable`].
///
/// Collects registrations in declaration order; [`RouteTableBuilder::build`]
/// freezes them into an immutable table.
#[derive(Debug, Clone, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method for this route
    /// * `pattern` - Path pattern (e.g., "/{resourceType}/{id}")
    /// * `operation_id` - ID of the operation capability to dispatch to
    #[must_use]
    pub fn route(
        mut self,
        method: Method,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
    ) -> Self {
        self.routes
            .push(Route::new(method, pattern.as_ref(), operation_id));
        self
    }

    /// Freezes the registrations into an immutable [`RouteTable`].
    #[must_use]
    pub fn build(self) -> RouteTable {
        RouteTable {
            routes: self.routes,
        }
    }
}

/// Immutable table of route registrations.
///
/// Built once during initialization; no runtime mutation. Matching scans
/// registrations in registration order and returns the first full match.
///
/// # Example
///
/// ```rust
/// use galen_router::RouteTable;
/// use http::Method;
///
/// let table = RouteTable::builder()
///     .route(Method::GET, "/{resourceType}/{id}", "read")
///     .route(Method::PUT, "/{resourceType}/{id}", "update")
///     .build();
///
/// // Matching request
/// let m = table.match_route(&Method::PUT, "/Patient/42").unwrap();
/// assert_eq!(m.operation_id(), "update");
/// assert_eq!(m.params().get("id"), Some("42"));
///
/// // Non-matching method
/// assert!(table.match_route(&Method::POST, "/Patient/42").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    /// Registered routes, in registration order
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates a new route table builder.
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Matches a virtual request to a route.
    ///
    /// Returns `Some(RouteMatch)` if a matching registration is found,
    /// or `None` if no registration matches. The table itself never errors;
    /// what an unmatched request means is the caller's policy.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        // Registrations are checked in order; first full match wins
        for route in &self.routes {
            if route.method == *method {
                if let Some(params) = route.match_path(path) {
                    return Some(RouteMatch::new(&route.operation_id, params));
                }
            }
        }

        None
    }

    /// Checks if a specific operation ID is registered.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }

    /// Returns all registered operation IDs, in registration order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.operation_id.as_str())
    }

    /// Returns (method, pattern, operation id, parameter names) for every
    /// registration, for diagnostics and startup logging.
    pub fn registrations(&self) -> impl Iterator<Item = (&Method, &str, &str, Vec<&str>)> {
        self.routes.iter().map(|r| {
            (
                &r.method,
                r.pattern.as_str(),
                r.operation_id.as_str(),
                r.param_names(),
            )
        })
    }
}
