//! The shared handler pipeline.
//!
//! A [`Pipeline`] is a route table wrapped by an ordered stack of decorators:
//!
//! ```text
//! request -> decorator(999) -> decorator(10) -> routing -> route item | default handler
//! ```
//!
//! Decorators are applied in ascending priority, so the highest priority ends up outermost
//! and sees the request first. Modules register themselves through [`PipelineBuilder::module`].

use crate::body::BoxError;
use crate::decorator::{Decorator, decorator_fn};
use crate::error::PipelineError;
use crate::handler::{NotFoundHandler, RequestHandler};
use crate::module::Module;
use crate::router::{Router, RouterBuilder, RouterItem, RouterItemBuilder};
use crate::{OptionReqBody, PathParams, RequestContext, ResponseBody};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body as HttpBody;
use std::fmt;
use tracing::{debug, info, trace};

type BoxedHandler = Box<dyn RequestHandler>;
type BoxedDecorator = Box<dyn Decorator<BoxedHandler, Out = BoxedHandler> + Send + Sync>;

pub struct Pipeline {
    handler: BoxedHandler,
}

impl Pipeline {
    /// Starts an empty pipeline: no routes, no decorators, and a 404 default handler.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs one request through the decorator stack and the route table.
    pub async fn call<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let params = PathParams::empty();
        let req = RequestContext::new(&parts, &params);

        self.handler.invoke(&req, OptionReqBody::new(body)).await
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

/// The innermost handler: matches the route and runs the first item whose filter accepts the request.
struct RoutingHandler {
    router: Router,
    default_handler: BoxedHandler,
}

#[async_trait]
impl RequestHandler for RoutingHandler {
    async fn invoke<'server, 'req>(
        &self,
        req: &RequestContext<'server, 'req>,
        req_body: OptionReqBody,
    ) -> Response<ResponseBody> {
        let path = req.uri().path();
        let route_result = self.router.at(path);
        let req = RequestContext::new(req.head(), route_result.params());

        let handler = route_result
            .router_items()
            .iter()
            .find(|item| item.filter().matches(&req))
            .map(RouterItem::handler)
            .unwrap_or(self.default_handler.as_ref());

        trace!(method = %req.method(), path, routed = !route_result.is_empty(), "dispatching request");
        handler.invoke(&req, req_body).await
    }
}

pub struct PipelineBuilder {
    router: RouterBuilder,
    decorators: Vec<(i32, BoxedDecorator)>,
    default_handler: Option<BoxedHandler>,
}

impl PipelineBuilder {
    fn new() -> Self {
        Self { router: Router::builder(), decorators: vec![], default_handler: None }
    }

    /// Adds a route item; see [`crate::router::RouterBuilder::route`] for ordering.
    #[must_use]
    pub fn route(mut self, route: impl Into<String>, item_builder: RouterItemBuilder) -> Self {
        self.router = self.router.route(route, item_builder);
        self
    }

    /// Wraps the whole pipeline, routing included, with `decorator`.
    #[must_use]
    pub fn decorator<D>(mut self, priority: i32, decorator: D) -> Self
    where
        D: Decorator<BoxedHandler> + Send + Sync + 'static,
        D::Out: RequestHandler + 'static,
    {
        let erased: BoxedDecorator =
            Box::new(decorator_fn(move |handler: BoxedHandler| -> BoxedHandler { Box::new(decorator.decorate(handler)) }));
        self.decorators.push((priority, erased));
        self
    }

    /// Replaces the not found handler used when no route item matches.
    #[must_use]
    pub fn default_handler(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.default_handler = Some(Box::new(handler));
        self
    }

    /// Lets `module` add its routes and decorators, logging its name.
    #[must_use]
    pub fn module<M: Module + ?Sized>(self, module: &M) -> Self {
        info!(module = module.name(), "registering module");
        module.register(self)
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let router = self.router.build()?;
        let default_handler: BoxedHandler = match self.default_handler {
            Some(handler) => handler,
            None => Box::new(NotFoundHandler),
        };

        let mut decorators = self.decorators;
        decorators.sort_by_key(|(priority, _)| *priority);

        let routing: BoxedHandler = Box::new(RoutingHandler { router, default_handler });
        let handler = decorators.iter().fold(routing, |handler, (_, decorator)| decorator.decorate(handler));

        debug!(decorators = decorators.len(), "pipeline built");
        Ok(Pipeline { handler })
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("router", &self.router)
            .field("decorators", &self.decorators.iter().map(|(priority, _)| priority).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
