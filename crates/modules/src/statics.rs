//! Serves single files at fixed URLs, e.g. `/robots.txt` from `{directory}/robots.txt`.
//!
//! Each item is registered as its own GET and HEAD route; nothing outside the registered items is
//! reachable, so there is no directory listing and no path traversal. The response itself comes
//! from tower-http's [`ServeFile`]: content type, `Last-Modified`, conditional requests and ranges.

use crate::config::StaticsSection;
use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use micro_pipeline::router::{any_method, filter};
use micro_pipeline::{
    BoxError, Module, OptionReqBody, PipelineBuilder, RequestContext, RequestHandler, Responder, ResponseBody,
};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error};

/// Files most sites serve from their root.
pub const DEFAULTS: [&str; 3] = ["/favicon.ico", "/sitemap.xml", "/robots.txt"];

/// The icon set and manifest produced by common favicon generators.
pub const FAVICONS: [&str; 14] = [
    "/apple-icon-57x57.png",
    "/apple-icon-60x60.png",
    "/apple-icon-72x72.png",
    "/apple-icon-76x76.png",
    "/apple-icon-114x114.png",
    "/apple-icon-120x120.png",
    "/apple-icon-144x144.png",
    "/apple-icon-152x152.png",
    "/apple-icon-180x180.png",
    "/android-icon-192x192.png",
    "/favicon-32x32.png",
    "/favicon-96x96.png",
    "/manifest.json",
    "/ms-icon-144x144.png",
];

#[derive(Error, Debug)]
enum StaticsError {
    #[error("no file at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StaticsError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StaticsError::NotFound { path: path.to_path_buf() }
        } else {
            StaticsError::Io { path: path.to_path_buf(), source }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Statics {
    directory: PathBuf,
    items: Vec<String>,
}

impl Statics {
    /// An empty item list served from the current directory.
    pub fn builder() -> StaticsBuilder {
        StaticsBuilder::new()
    }

    /// Registers one more item; only effective before the module is registered.
    pub fn add(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file served for `item`.
    pub fn file_for(&self, item: &str) -> PathBuf {
        self.directory.join(item.trim_start_matches('/'))
    }
}

impl From<&StaticsSection> for Statics {
    fn from(section: &StaticsSection) -> Self {
        let mut builder = Statics::builder().directory(&section.directory);
        if section.defaults {
            builder = builder.defaults();
        }
        if section.favicons {
            builder = builder.favicons();
        }
        for item in &section.items {
            builder = builder.add(item);
        }
        builder.build()
    }
}

impl Module for Statics {
    fn name(&self) -> &'static str {
        "statics"
    }

    fn register(&self, mut builder: PipelineBuilder) -> PipelineBuilder {
        for item in &self.items {
            let file = self.file_for(item);
            debug!(item = %item, file = %file.display(), "adding static handler");

            let mut read_only = filter::any_filter();
            read_only.or(filter::get_method()).or(filter::head_method());

            builder = builder.route(item.as_str(), any_method(StaticFile::new(file)).with(read_only));
        }
        builder
    }
}

#[derive(Debug)]
pub struct StaticsBuilder {
    directory: PathBuf,
    items: Vec<String>,
}

impl StaticsBuilder {
    fn new() -> Self {
        Self { directory: PathBuf::from("."), items: vec![] }
    }

    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    #[must_use]
    pub fn defaults(mut self) -> Self {
        self.items.extend(DEFAULTS.iter().map(ToString::to_string));
        self
    }

    #[must_use]
    pub fn favicons(mut self) -> Self {
        self.items.extend(FAVICONS.iter().map(ToString::to_string));
        self
    }

    #[must_use]
    pub fn add(mut self, item: impl Into<String>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn build(self) -> Statics {
        Statics { directory: self.directory, items: self.items }
    }
}

/// Serves one file from disk.
#[derive(Debug, Clone)]
pub struct StaticFile {
    path: PathBuf,
    service: ServeFile,
}

impl StaticFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self { service: ServeFile::new(&path), path }
    }

    /// A directory at the item's path counts as missing.
    async fn check(&self) -> Result<(), StaticsError> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| StaticsError::from_io(&self.path, e))?;
        if metadata.is_dir() {
            return Err(StaticsError::NotFound { path: self.path.clone() });
        }
        Ok(())
    }

    async fn serve(&self, req: &RequestContext<'_, '_>) -> Response<ResponseBody> {
        let head = req.head();
        let mut request = Request::new(());
        *request.method_mut() = head.method.clone();
        *request.uri_mut() = head.uri.clone();
        *request.version_mut() = head.version;
        *request.headers_mut() = head.headers.clone();

        let Ok(response) = self.service.clone().oneshot(request).await;
        if response.status().is_server_error() {
            error!(path = %self.path.display(), status = %response.status(), "unable to serve static file");
        }

        response.map(|body| ResponseBody::stream(body.map_err(BoxError::from)))
    }
}

#[async_trait]
impl RequestHandler for StaticFile {
    async fn invoke<'server, 'req>(
        &self,
        req: &RequestContext<'server, 'req>,
        _req_body: OptionReqBody,
    ) -> Response<ResponseBody> {
        match self.check().await {
            Ok(()) => self.serve(req).await,
            Err(StaticsError::NotFound { path }) => {
                debug!(path = %path.display(), "static file missing");
                (StatusCode::NOT_FOUND, "404 not found").response_to(req)
            }
            Err(e) => {
                error!(cause = %e, "unable to serve static file");
                (StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error").response_to(req)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULTS, FAVICONS, Statics};
    use crate::config::ModulesConfig;
    use bytes::Bytes;
    use http::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED, RANGE};
    use http::{Method, Request, Response, StatusCode};
    use http_body_util::{BodyExt, Empty};
    use micro_pipeline::{Pipeline, ResponseBody};
    use std::path::Path;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *\nDisallow:\n").unwrap();
        std::fs::write(dir.path().join("manifest.json"), r#"{"name":"site"}"#).unwrap();
        std::fs::create_dir(dir.path().join("sitemap.xml")).unwrap();
        dir
    }

    fn pipeline(directory: &Path) -> Pipeline {
        let statics = Statics::builder().directory(directory).defaults().add("/manifest.json").build();
        Pipeline::builder().module(&statics).build().unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
        Request::builder().method(method).uri(uri).body(Empty::new()).unwrap()
    }

    async fn body_string(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn builder_collects_items() {
        let mut statics = Statics::builder().directory("/srv/public").defaults().favicons().add("/humans.txt").build();
        statics.add("/ads.txt");

        assert_eq!(statics.items().len(), DEFAULTS.len() + FAVICONS.len() + 2);
        assert_eq!(statics.items()[..3], DEFAULTS);
        assert_eq!(statics.items().last().map(String::as_str), Some("/ads.txt"));
        assert_eq!(statics.file_for("/robots.txt"), Path::new("/srv/public/robots.txt"));
        assert_eq!(statics.directory(), Path::new("/srv/public"));
    }

    #[test]
    fn built_from_config_section() {
        let config: ModulesConfig = r#"
            [statics]
            directory = "/srv/public"
            favicons = true
            items = ["/humans.txt"]
        "#
        .parse()
        .unwrap();

        let statics = Statics::from(config.statics().unwrap());
        assert_eq!(statics.items().len(), FAVICONS.len() + 1);
        assert_eq!(statics.items()[0], "/apple-icon-57x57.png");
        assert_eq!(statics.items()[FAVICONS.len()], "/humans.txt");
    }

    #[tokio::test]
    async fn serves_registered_file() {
        let dir = site();
        let pipeline = pipeline(dir.path());

        let response = pipeline.call(request(Method::GET, "/robots.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[CONTENT_LENGTH], "24");
        assert!(response.headers().contains_key(LAST_MODIFIED));
        assert_eq!(body_string(response).await, "User-agent: *\nDisallow:\n");

        let response = pipeline.call(request(Method::GET, "/manifest.json")).await;
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_string(response).await, r#"{"name":"site"}"#);
    }

    #[tokio::test]
    async fn head_has_headers_but_no_body() {
        let dir = site();
        let response = pipeline(dir.path()).call(request(Method::HEAD, "/robots.txt")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "24");
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn not_modified_since_last_fetch() {
        let dir = site();
        let pipeline = pipeline(dir.path());

        let response = pipeline.call(request(Method::GET, "/robots.txt")).await;
        let last_modified = response.headers()[LAST_MODIFIED].clone();

        let conditional =
            Request::get("/robots.txt").header(IF_MODIFIED_SINCE, last_modified).body(Empty::<Bytes>::new()).unwrap();
        let response = pipeline.call(conditional).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(body_string(response).await, "");

        let stale = Request::get("/robots.txt")
            .header(IF_MODIFIED_SINCE, "Thu, 01 Jan 1970 00:00:00 GMT")
            .body(Empty::<Bytes>::new())
            .unwrap();
        assert_eq!(pipeline.call(stale).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn serves_byte_ranges() {
        let dir = site();
        let ranged = Request::get("/robots.txt").header(RANGE, "bytes=0-3").body(Empty::<Bytes>::new()).unwrap();
        let response = pipeline(dir.path()).call(ranged).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 0-3/24");
        assert_eq!(body_string(response).await, "User");
    }

    #[tokio::test]
    async fn missing_file_or_directory_is_not_found() {
        let dir = site();
        let pipeline = pipeline(dir.path());

        assert_eq!(pipeline.call(request(Method::GET, "/favicon.ico")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(pipeline.call(request(Method::GET, "/sitemap.xml")).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_registered_items_are_reachable() {
        let dir = site();
        std::fs::write(dir.path().join("secret.txt"), "hidden").unwrap();
        let pipeline = pipeline(dir.path());

        assert_eq!(pipeline.call(request(Method::GET, "/secret.txt")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(pipeline.call(request(Method::POST, "/robots.txt")).await.status(), StatusCode::NOT_FOUND);
    }
}
