//! HTTP adapters - REST and streaming endpoints.
//!
//! Each area has its own routes; `app_router` merges them over one
//! [`AppState`].

pub mod chat;
pub mod error;
pub mod headers;
pub mod lead;
pub mod session;

mod router;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use router::app_router;
pub use state::{AppState, StateSettings, Stores};
