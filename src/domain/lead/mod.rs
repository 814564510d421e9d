//! Lead domain - Stage machine, signal extraction and lead profile.
//!
//! Turns visitor messages into a deterministic conversation stage and an
//! incrementally built lead profile.

mod context;
mod engine;
mod extractor;
mod lead_data;
mod stage;

pub use context::{ContextPatch, ConversationContext, ResearchSnapshot};
pub use engine::{MessageSignals, StageTransition, StageTransitionEngine, TransitionTriggers};
pub use extractor::{
    ai_readiness_score, company_from_email, CompanySize, ExtractionEngine, IndustrySignals,
    KeywordExtractionEngine, PainPoint,
};
pub use lead_data::{LeadData, LeadRecord};
pub use stage::Stage;
