//! Request predicates attached to route items.
//!
//! Items registered on the same path are tried in order and the first one whose filter accepts
//! the request handles it. Predicates combine with [`all_filter`] and [`any_filter`]:
//!
//! ```
//! use micro_pipeline::router::filter::{any_filter, get_method, head_method};
//!
//! let mut read_only = any_filter();
//! read_only.or(get_method()).or(head_method());
//! ```

use crate::RequestContext;
use http::Method;

/// Decides whether a route item accepts a request.
pub trait Filter: Send + Sync {
    fn matches(&self, req: &RequestContext) -> bool;
}

/// Accepts a request when any of its filters does; with no filters it accepts everything.
pub fn any_filter() -> AnyFilter {
    AnyFilter { filters: vec![] }
}

/// Accepts a request only when every one of its filters does.
pub fn all_filter() -> AllFilter {
    AllFilter { filters: vec![] }
}

pub struct AnyFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AnyFilter {
    pub fn or<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Filter for AnyFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter.matches(req))
    }
}

pub struct AllFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AllFilter {
    pub fn and<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Filter for AllFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.filters.iter().all(|filter| filter.matches(req))
    }
}

/// Matches one request method.
#[derive(Debug, Clone)]
pub struct MethodFilter(Method);

impl Filter for MethodFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        *req.method() == self.0
    }
}

pub fn get_method() -> MethodFilter {
    MethodFilter(Method::GET)
}

pub fn head_method() -> MethodFilter {
    MethodFilter(Method::HEAD)
}

pub fn post_method() -> MethodFilter {
    MethodFilter(Method::POST)
}
