//! HTTP server for Docket.
//!
//! Exposes documents at `/{db}/{collection}/{id}`. Reads return the stored
//! document with its `ETag`; `PUT` replaces, `PATCH` merges, and
//! `POST /{db}/{collection}` creates. Writes go through the mutation
//! pipeline from `docket-pipeline`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{CollectionConfig, ServerConfig};
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::AppState;
pub use server::DocketServer;
