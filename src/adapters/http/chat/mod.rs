//! HTTP adapter for streaming chat.

mod handlers;
mod routes;

pub use routes::chat_routes;
