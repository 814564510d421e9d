//! Lead profile accumulated over a conversation.

use serde::{Deserialize, Serialize};

use super::engine::MessageSignals;
use super::extractor::{CompanySize, ExtractionEngine, IndustrySignals, PainPoint};
use super::stage::Stage;
use crate::domain::foundation::{SessionId, Timestamp};

const NAME_POINTS: u32 = 10;
const EMAIL_POINTS: u32 = 15;
const COMPANY_POINTS: u32 = 10;
const PAIN_POINT_POINTS: u32 = 10;
const MAX_PAIN_POINT_POINTS: u32 = 30;
const DECISION_MAKER_POINTS: u32 = 20;
const MAX_READINESS_POINTS: u32 = 15;

/// Structured lead profile for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    /// Canonical tags, deduplicated, in lexicon order.
    pub pain_points: Vec<PainPoint>,
    pub decision_maker: bool,
    /// 0..=100
    pub ai_readiness_score: u8,
    /// 0..=100
    pub lead_score: u8,
}

impl Default for LeadData {
    fn default() -> Self {
        Self {
            name: None,
            email: None,
            company: None,
            pain_points: Vec::new(),
            decision_maker: false,
            ai_readiness_score: super::extractor::ai_readiness_score(&IndustrySignals::default()),
            lead_score: 0,
        }
    }
}

impl LeadData {
    /// Folds the signals of one message into the profile.
    ///
    /// The first extracted name sticks; a newer email replaces the old one.
    /// Pain points accumulate.
    pub fn absorb(&mut self, signals: &MessageSignals) {
        if self.name.is_none() {
            if let Some(name) = &signals.name {
                self.name = Some(name.clone());
            }
        }
        if let Some(email) = &signals.email {
            self.email = Some(email.clone());
        }
        self.add_pain_points(&signals.pain_points);
    }

    /// Adds pain points, keeping the list deduplicated and ordered.
    pub fn add_pain_points(&mut self, points: &[PainPoint]) {
        self.pain_points.extend_from_slice(points);
        self.pain_points.sort();
        self.pain_points.dedup();
    }

    /// Recomputes the derived fields.
    ///
    /// `industry` and `company_size` come from research when available.
    /// Readiness never drops within a session.
    pub fn refresh_scores(
        &mut self,
        extractor: &dyn ExtractionEngine,
        industry: &IndustrySignals,
        company_size: CompanySize,
    ) {
        if self.company.is_none() {
            self.company = self
                .email
                .as_deref()
                .and_then(|email| extractor.company_from_email(email));
        }
        self.decision_maker = self
            .email
            .as_deref()
            .map(|email| extractor.decision_maker_signal(email, company_size))
            .unwrap_or(false);
        self.ai_readiness_score = self
            .ai_readiness_score
            .max(extractor.ai_readiness_score(industry));
        self.lead_score = self.compute_lead_score();
    }

    /// Weighted completeness and fit score, 0..=100.
    pub fn compute_lead_score(&self) -> u8 {
        let mut score = 0u32;
        if self.name.is_some() {
            score += NAME_POINTS;
        }
        if self.email.is_some() {
            score += EMAIL_POINTS;
        }
        if self.company.is_some() {
            score += COMPANY_POINTS;
        }
        score += (self.pain_points.len() as u32 * PAIN_POINT_POINTS).min(MAX_PAIN_POINT_POINTS);
        if self.decision_maker {
            score += DECISION_MAKER_POINTS;
        }
        let readiness_above_baseline = u32::from(self.ai_readiness_score.saturating_sub(50));
        score += readiness_above_baseline * MAX_READINESS_POINTS / 50;
        score.min(100) as u8
    }
}

/// Persisted stage and lead data for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub session_id: SessionId,
    pub stage: Stage,
    pub lead: LeadData,
    pub message_count: u32,
    pub follow_up_requested: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LeadRecord {
    /// Creates a record at GREETING with an empty profile.
    pub fn new(session_id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            stage: Stage::Greeting,
            lead: LeadData::default(),
            message_count: 0,
            follow_up_requested: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
