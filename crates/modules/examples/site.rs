//! Builds a small site from a config file and replays a few requests through it.
//!
//! ```text
//! cargo run -p micro-modules --example site
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{COOKIE, LOCATION, SET_COOKIE};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Empty};
use micro_modules::{ModulesConfig, SecureCookie, Statics, TrailSlash};
use micro_pipeline::router::get;
use micro_pipeline::{OptionReqBody, Pipeline, RequestContext, RequestHandler, Responder, ResponseBody};
use std::collections::HashMap;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Counts visits in an encrypted cookie.
struct Visits {
    cookie: SecureCookie,
}

#[async_trait]
impl RequestHandler for Visits {
    async fn invoke<'server, 'req>(
        &self,
        req: &RequestContext<'server, 'req>,
        _req_body: OptionReqBody,
    ) -> Response<ResponseBody> {
        let visits = self
            .cookie
            .get_values(req.headers(), "visits", &["count"])
            .ok()
            .and_then(|values| values.first().and_then(|count| count.parse::<u32>().ok()))
            .unwrap_or(0)
            + 1;

        let mut response = format!("visit number {visits}").response_to(req);
        let values = HashMap::from([("count".to_string(), visits.to_string())]);
        if let Err(e) = self.cookie.add(response.headers_mut(), "visits", 24, &values) {
            error!(cause = %e, "unable to set visits cookie");
            return (StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error").response_to(req);
        }
        response
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let public = tempfile::tempdir()?;
    std::fs::write(public.path().join("robots.txt"), "User-agent: *\nAllow: /\n")?;

    let config: ModulesConfig = format!(
        r#"
        [statics]
        directory = "{}"
        defaults = true

        [cookie]
        generate = true
        "#,
        public.path().display()
    )
    .parse()?;

    let pipeline = Pipeline::builder()
        .module(&Statics::from(config.statics()?))
        .module(&TrailSlash::from(&config.trailslash()))
        .route("/visits", get(Visits { cookie: SecureCookie::try_from(config.cookie()?)? }))
        .build()?;

    for uri in ["/robots.txt", "/visits/", "/favicon.ico"] {
        let response = pipeline.call(Request::get(uri).body(Empty::<Bytes>::new())?).await;
        info!(uri, status = %response.status(), location = ?response.headers().get(LOCATION), "replayed");
    }

    let first = pipeline.call(Request::get("/visits").body(Empty::<Bytes>::new())?).await;
    let cookie = first.headers().get(SET_COOKIE).and_then(|value| value.to_str().ok()).unwrap_or_default();
    let pair = cookie.split(';').next().unwrap_or_default().to_string();

    let second = pipeline.call(Request::get("/visits").header(COOKIE, pair).body(Empty::<Bytes>::new())?).await;
    let body = second.into_body().collect().await?.to_bytes();
    info!(body = %String::from_utf8_lossy(&body), "second visit");

    Ok(())
}
