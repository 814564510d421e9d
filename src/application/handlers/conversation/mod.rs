//! Conversation command and query handlers.
//!
//! Handles inbound visitor messages and reading the resulting lead profile.

mod get_lead;
mod process_message;

pub use get_lead::{GetLeadHandler, GetLeadQuery};
pub use process_message::{
    ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler, ProcessMessageResult,
};
