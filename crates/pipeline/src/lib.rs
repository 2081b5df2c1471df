//! An in-process handler pipeline for small web applications.
//!
//! Requests travel through a stack of [`decorator::Decorator`]s and then a [`Router`] that
//! selects a [`RequestHandler`] by path and [`router::filter::Filter`]. Optional features plug in
//! through the [`Module`] trait:
//!
//! ```
//! use micro_pipeline::{Pipeline, router::get, handler::NotFoundHandler};
//!
//! let pipeline = Pipeline::builder()
//!     .route("/robots.txt", get(NotFoundHandler))
//!     .build()
//!     .expect("routes are valid");
//! ```

mod body;
mod error;
mod module;
mod pipeline;
mod request;
mod responder;

pub mod decorator;
pub mod handler;
pub mod router;

pub use body::{BodyError, BoxError, OptionReqBody, ReqBody, ResponseBody};
pub use error::PipelineError;
pub use handler::RequestHandler;
pub use module::Module;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use request::{PathParams, RequestContext};
pub use responder::Responder;
pub use router::Router;
