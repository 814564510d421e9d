//! Capability tracking handlers.

mod record_capability;

pub use record_capability::{
    RecordCapabilityCommand, RecordCapabilityError, RecordCapabilityHandler,
};
