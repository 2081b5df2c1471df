use crate::body::ResponseBody;
use crate::responder::Responder;
use crate::{OptionReqBody, RequestContext};
use async_trait::async_trait;
use http::{Response, StatusCode};

/// A unit of request processing.
///
/// Route handlers, decorated handlers and the pipeline's default handler all share this trait.
/// Failures are turned into responses by the handler itself.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke<'server, 'req>(
        &self,
        req: &RequestContext<'server, 'req>,
        req_body: OptionReqBody,
    ) -> Response<ResponseBody>;
}

#[async_trait]
impl RequestHandler for Box<dyn RequestHandler> {
    async fn invoke<'server, 'req>(
        &self,
        req: &RequestContext<'server, 'req>,
        req_body: OptionReqBody,
    ) -> Response<ResponseBody> {
        (**self).invoke(req, req_body).await
    }
}

/// The fallback used when no route item matches.
#[derive(Debug, Default, Copy, Clone)]
pub struct NotFoundHandler;

#[async_trait]
impl RequestHandler for NotFoundHandler {
    async fn invoke<'server, 'req>(
        &self,
        req: &RequestContext<'server, 'req>,
        _req_body: OptionReqBody,
    ) -> Response<ResponseBody> {
        (StatusCode::NOT_FOUND, "404 not found").response_to(req)
    }
}

#[cfg(test)]
mod tests {
    use crate::handler::{NotFoundHandler, RequestHandler};
    use crate::{OptionReqBody, PathParams, RequestContext};
    use http::{Request, StatusCode};

    fn assert_is_handler<T: RequestHandler>(_handler: &T) {
        // no op
    }

    #[test]
    fn boxed_handler_is_handler() {
        let handler: Box<dyn RequestHandler> = Box::new(NotFoundHandler);
        assert_is_handler(&handler);
    }

    #[tokio::test]
    async fn not_found_handler_returns_404() {
        let (parts, ()) = Request::get("/missing").body(()).unwrap().into_parts();
        let params = PathParams::empty();
        let req = RequestContext::new(&parts, &params);

        let response = NotFoundHandler.invoke(&req, OptionReqBody::empty()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
