//! Foundation - Identifiers, timestamps and validation errors shared by
//! every other domain module.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{MessageId, SessionId, MAX_SESSION_ID_LENGTH};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
