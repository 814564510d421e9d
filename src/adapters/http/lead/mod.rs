//! HTTP adapter for message processing, lead data and capabilities.

mod dto;
mod handlers;
mod routes;

pub use dto::{CapabilityListResponse, RecordCapabilityRequest, SendMessageRequest};
pub use routes::lead_routes;
