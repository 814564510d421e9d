//! Session command handlers.

mod init_session;

pub use init_session::{
    resolve_session_id, EnrichmentOutcome, InitSessionCommand, InitSessionError,
    InitSessionHandler, InitSessionResult, DEFAULT_ENRICHMENT_WAIT,
};
