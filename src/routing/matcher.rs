//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path, exactly or by prefix
//! - Match the request method against a route's allowed set
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive plain string comparison; no patterns,
//!   so match cost stays O(path length)
//! - An empty method set means any method
//! - Prefix matching is a pure string prefix, "/recipe" also covers
//!   "/recipe/image"

use axum::body::Body;
use axum::http::{Method, Request};

/// How a route's path is compared against the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatcher {
    Exact(String),
    Prefix(String),
}

impl PathMatcher {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => path == expected,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Combined path and method condition for one installed route.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    path: PathMatcher,
    methods: Vec<Method>,
}

impl RouteMatcher {
    pub fn new(path: PathMatcher, methods: Vec<Method>) -> Self {
        Self { path, methods }
    }

    pub fn matches(&self, request: &Request<Body>) -> bool {
        self.allows_method(request.method()) && self.path.matches(request.uri().path())
    }

    fn allows_method(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}
