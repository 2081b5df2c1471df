//! Optional modules for a [`micro_pipeline::Pipeline`].
//!
//! - [`cookie`]: signed or encrypted cookies holding a string map
//! - [`sql`]: connection URL assembly and a pinged connection pool
//! - [`statics`]: single files served at fixed URLs
//! - [`trailslash`]: 301 redirects to the canonical trailing slash spelling
//!
//! Each module can be configured in code or from a [`ModulesConfig`] file:
//!
//! ```
//! use micro_modules::{ModulesConfig, statics::Statics, trailslash::TrailSlash};
//! use micro_pipeline::Pipeline;
//!
//! let config: ModulesConfig = r#"
//!     [statics]
//!     directory = "./public"
//!     defaults = true
//! "#.parse()?;
//!
//! let pipeline = Pipeline::builder()
//!     .module(&Statics::from(config.statics()?))
//!     .module(&TrailSlash::from(&config.trailslash()))
//!     .build()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod cookie;
pub mod sql;
pub mod statics;
pub mod trailslash;

pub use config::{ConfigError, ModulesConfig};
pub use cookie::{CookieError, CookieOptions, SecureCookie};
pub use sql::{Database, Driver, SqlError, SqlOptions, SqlOptionsBuilder};
pub use statics::{StaticFile, Statics};
pub use trailslash::TrailSlash;
