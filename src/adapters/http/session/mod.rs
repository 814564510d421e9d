//! HTTP adapter for session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{InitSessionRequest, InitSessionResponse};
pub use routes::session_routes;
