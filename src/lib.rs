//! Leadflow - Conversational lead intelligence.
//!
//! Turns website chat messages into a persisted, incrementally enriched lead
//! profile and a deterministic conversation stage, while streaming generated
//! replies back to the visitor.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
