//! Canonical trailing slashes: GET requests for the other spelling of a path get a 301.
//!
//! ```text
//! no_slash: GET /about/  -> 301 Location: /about
//! slash:    GET /about   -> 301 Location: /about/
//! ```
//!
//! The root path `/` and every non GET request pass through untouched.

use crate::config::TrailslashSection;
use async_trait::async_trait;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, Response, StatusCode};
use micro_pipeline::decorator::Decorator;
use micro_pipeline::{Module, OptionReqBody, PipelineBuilder, RequestContext, RequestHandler, ResponseBody};
use tracing::{trace, warn};

/// Decorators run in ascending priority, so 999 puts slash handling ahead of everything else.
pub const PRIORITY: i32 = 999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailSlash {
    trail: bool,
}

impl TrailSlash {
    /// Every path ends with a slash.
    pub fn slash() -> Self {
        Self { trail: true }
    }

    /// No path ends with a slash.
    pub fn no_slash() -> Self {
        Self { trail: false }
    }

    pub fn is_trailing(&self) -> bool {
        self.trail
    }
}

impl From<&TrailslashSection> for TrailSlash {
    fn from(section: &TrailslashSection) -> Self {
        Self { trail: section.trail }
    }
}

/// Returns the canonical spelling of `path`, or `None` if it already is canonical.
pub fn rewrite(path: &str, trail: bool) -> Option<String> {
    if path.len() <= 1 {
        return None;
    }

    match (trail, path.ends_with('/')) {
        (true, false) => Some(format!("{path}/")),
        (false, true) => Some(path[..path.len() - 1].to_owned()),
        _ => None,
    }
}

impl<H: RequestHandler> Decorator<H> for TrailSlash {
    type Out = TrailSlashHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        TrailSlashHandler { trail: self.trail, handler: raw }
    }
}

impl Module for TrailSlash {
    fn name(&self) -> &'static str {
        "trailslash"
    }

    fn register(&self, builder: PipelineBuilder) -> PipelineBuilder {
        builder.decorator(PRIORITY, *self)
    }
}

#[derive(Debug)]
pub struct TrailSlashHandler<H> {
    trail: bool,
    handler: H,
}

impl<H> TrailSlashHandler<H> {
    fn redirect(location: &str) -> Option<Response<ResponseBody>> {
        let location_value = match HeaderValue::from_str(location) {
            Ok(value) => value,
            Err(e) => {
                warn!(location, cause = %e, "unable to redirect to rewritten path");
                return None;
            }
        };

        let body = format!("<a href=\"{}\">Moved Permanently</a>.\n", htmlescape::encode_minimal(location));
        let mut response = Response::new(ResponseBody::from(body));
        *response.status_mut() = StatusCode::MOVED_PERMANENTLY;

        let headers = response.headers_mut();
        headers.insert(LOCATION, location_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        Some(response)
    }
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for TrailSlashHandler<H> {
    async fn invoke<'server, 'req>(
        &self,
        req: &RequestContext<'server, 'req>,
        req_body: OptionReqBody,
    ) -> Response<ResponseBody> {
        if *req.method() == Method::GET
            && let Some(path) = rewrite(req.uri().path(), self.trail)
        {
            let location = match req.uri().query() {
                Some(query) => format!("{path}?{query}"),
                None => path,
            };

            trace!(from = req.uri().path(), to = %location, "redirecting to canonical path");
            if let Some(response) = Self::redirect(&location) {
                return response;
            }
        }

        self.handler.invoke(req, req_body).await
    }
}
