//! Jinjet renders a directory of Jinja-flavored templates, Markdown and
//! static files as a local website, with no build step and no routing
//! configuration: the URL is the file path.
//!
//! The crate splits in two layers:
//!
//! * [`core`] holds the whole engine-agnostic pipeline: request path
//!   normalization, file and mode resolution, config loading, template
//!   environment wiring, directory listings, breadcrumbs and error pages.
//! * [`actix`] is the thin HTTP front that feeds Actix Web requests into
//!   the pipeline.
//!
//! # Quickstart
//!
//! ```no_run
//! use actix_web::web::Data;
//! use actix_web::{App, HttpServer};
//! use jinjet::actix::{AppState, configure_routes};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!   let root = std::path::PathBuf::from("site");
//!   let state = Data::new(AppState {
//!     script_root: root.clone(),
//!     public_root: root,
//!   });
//!   HttpServer::new(move || {
//!     App::new().app_data(state.clone()).configure(configure_routes)
//!   })
//!   .bind(("127.0.0.1", 8000))?
//!   .run()
//!   .await
//! }
//! ```

pub mod actix;
pub mod core;
pub mod error;

pub use crate::core::context::RequestContext;
pub use crate::core::pipeline::{self, Response};
pub use crate::error::{JinjetError, Result};
