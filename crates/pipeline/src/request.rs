use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use matchit::Params;

/// What a handler can see of the request besides its body.
///
/// Decorators run before routing, so they always get empty [`PathParams`].
#[derive(Debug)]
pub struct RequestContext<'server: 'req, 'req> {
    head: &'req Parts,
    params: &'req PathParams<'server, 'req>,
}

impl<'server, 'req> RequestContext<'server, 'req> {
    pub fn new(head: &'req Parts, params: &'req PathParams<'server, 'req>) -> Self {
        Self { head, params }
    }

    /// The full request head, for handlers that forward the request elsewhere.
    pub fn head(&self) -> &'req Parts {
        self.head
    }

    pub fn method(&self) -> &'req Method {
        &self.head.method
    }

    pub fn uri(&self) -> &'req Uri {
        &self.head.uri
    }

    pub fn headers(&self) -> &'req HeaderMap {
        &self.head.headers
    }

    pub fn path_params(&self) -> &PathParams<'server, 'req> {
        self.params
    }
}

/// Named segments captured by the matched route, `id` in `/users/{id}`.
#[derive(Debug, Clone)]
pub struct PathParams<'server, 'req>(Option<Params<'server, 'req>>);

impl<'server, 'req> PathParams<'server, 'req> {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn get(&self, name: &str) -> Option<&'req str> {
        self.0.as_ref().and_then(|params| params.get(name))
    }
}

impl<'server, 'req> From<Params<'server, 'req>> for PathParams<'server, 'req> {
    fn from(params: Params<'server, 'req>) -> Self {
        Self(Some(params))
    }
}
