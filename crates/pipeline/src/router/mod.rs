pub mod filter;

use crate::PathParams;
use crate::error::PipelineError;
use crate::handler::RequestHandler;

use filter::{AllFilter, Filter};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

type RouterFilter = dyn Filter + Send + Sync + 'static;
type InnerRouter<T> = matchit::Router<T>;

/// Route table: each path maps to an ordered list of filtered handlers.
pub struct Router {
    inner_router: InnerRouter<Vec<RouterItem>>,
}

/// A handler guarded by a filter
pub struct RouterItem {
    filter: Box<RouterFilter>,
    handler: Box<dyn RequestHandler>,
}

/// Result of matching a route, containing matched items and path parameters
pub struct RouteResult<'router, 'req> {
    router_items: &'router [RouterItem],
    params: PathParams<'router, 'req>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Matches a path against the router's routes.
    ///
    /// An unknown path yields an empty [`RouteResult`].
    pub fn at<'router, 'req>(&'router self, path: &'req str) -> RouteResult<'router, 'req> {
        self.inner_router
            .at(path)
            .map(|matched| RouteResult { router_items: matched.value.as_slice(), params: matched.params.into() })
            .unwrap_or_else(|e| {
                trace!(path, cause = %e, "no route matched");
                RouteResult::empty()
            })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

impl RouterItem {
    pub fn filter(&self) -> &RouterFilter {
        self.filter.as_ref()
    }

    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }
}

impl<'router, 'req> RouteResult<'router, 'req> {
    fn empty() -> Self {
        Self { router_items: &[], params: PathParams::empty() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.router_items.is_empty()
    }

    pub fn params(&self) -> &PathParams<'router, 'req> {
        &self.params
    }

    pub fn router_items(&self) -> &'router [RouterItem] {
        self.router_items
    }
}

pub struct RouterBuilder {
    data: HashMap<String, Vec<RouterItemBuilder>>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { data: HashMap::new() }
    }

    /// Adds an item to `route`; items of the same route are tried in insertion order.
    pub fn route(mut self, route: impl Into<String>, item_builder: RouterItemBuilder) -> Self {
        let vec = self.data.entry(route.into()).or_default();
        vec.push(item_builder);
        self
    }

    pub fn build(self) -> Result<Router, PipelineError> {
        let mut inner_router = InnerRouter::new();

        for (path, items) in self.data {
            let router_items = items.into_iter().map(RouterItemBuilder::build).collect::<Vec<_>>();

            inner_router.insert(path.as_str(), router_items).map_err(|source| PipelineError::Route { path, source })?;
        }

        Ok(Router { inner_router })
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder").field("routes", &self.data.keys().collect::<Vec<_>>()).finish()
    }
}

/// An item without method restriction; narrow it with [`RouterItemBuilder::with`].
pub fn any_method<H: RequestHandler + 'static>(handler: H) -> RouterItemBuilder {
    RouterItemBuilder { filters: filter::all_filter(), handler: Box::new(handler) }
}

/// An item that only accepts GET requests.
pub fn get<H: RequestHandler + 'static>(handler: H) -> RouterItemBuilder {
    any_method(handler).with(filter::get_method())
}

/// An item that only accepts POST requests.
pub fn post<H: RequestHandler + 'static>(handler: H) -> RouterItemBuilder {
    any_method(handler).with(filter::post_method())
}

pub struct RouterItemBuilder {
    filters: AllFilter,
    handler: Box<dyn RequestHandler>,
}

impl RouterItemBuilder {
    #[must_use]
    pub fn with<F: Filter + Send + Sync + 'static>(mut self, filter: F) -> Self {
        self.filters.and(filter);
        self
    }

    fn build(self) -> RouterItem {
        RouterItem { filter: Box::new(self.filters), handler: self.handler }
    }
}

impl fmt::Debug for RouterItemBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterItemBuilder").finish_non_exhaustive()
    }
}
