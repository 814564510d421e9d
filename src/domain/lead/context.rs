//! Conversation context and partial updates.
//!
//! The context holds the visitor's identifiers and the research gathered
//! about them. Research fields can only move from null to a value or from a
//! value to another value: [`ContextPatch`] has no way to express "set to
//! null", so a merge can never erase research.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{SessionId, Timestamp};

/// Everything known about one visitor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub session_id: SessionId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub company_url: Option<String>,
    pub company_context: Option<Value>,
    pub person_context: Option<Value>,
    pub role: Option<String>,
    /// Within `[0, 1]` when present.
    pub role_confidence: Option<f64>,
    pub last_user_message: Option<String>,
    pub capabilities_shown: BTreeSet<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConversationContext {
    /// Creates an empty context.
    pub fn new(session_id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            email: None,
            name: None,
            company_url: None,
            company_context: None,
            person_context: None,
            role: None,
            role_confidence: None,
            last_user_message: None,
            capabilities_shown: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a context from an initial patch.
    pub fn from_patch(session_id: SessionId, patch: ContextPatch) -> Self {
        let mut context = Self::new(session_id);
        context.apply(patch);
        context
    }

    /// Merges a patch. Absent fields are untouched, capabilities are unioned.
    pub fn apply(&mut self, patch: ContextPatch) {
        let ContextPatch {
            email,
            name,
            company_url,
            company_context,
            person_context,
            role,
            role_confidence,
            last_user_message,
            capabilities_shown,
        } = patch;

        merge(&mut self.email, email);
        merge(&mut self.name, name);
        merge(&mut self.company_url, company_url);
        merge(&mut self.company_context, company_context);
        merge(&mut self.person_context, person_context);
        merge(&mut self.role, role);
        merge(&mut self.role_confidence, role_confidence.map(clamp_confidence));
        merge(&mut self.last_user_message, last_user_message);
        self.capabilities_shown.extend(capabilities_shown);
        self.updated_at = Timestamp::now();
    }

    /// Returns true if any research field is populated.
    pub fn has_research_evidence(&self) -> bool {
        self.company_context.is_some()
            || self.person_context.is_some()
            || self.role.is_some()
            || self.role_confidence.is_some()
    }

    /// Research view, or `None` when nothing has been researched yet.
    pub fn research_snapshot(&self) -> Option<ResearchSnapshot> {
        if !self.has_research_evidence() {
            return None;
        }
        Some(ResearchSnapshot {
            company: self.company_context.clone(),
            person: self.person_context.clone(),
            role: self.role.clone(),
            role_confidence: self.role_confidence,
        })
    }

    /// Patch carrying only the identifiers that differ from the stored ones.
    ///
    /// Absent request values never overwrite stored identifiers. Returns
    /// `None` when nothing changed.
    pub fn identity_changes(
        &self,
        email: &str,
        name: Option<&str>,
        company_url: Option<&str>,
    ) -> Option<ContextPatch> {
        let changed = |stored: &Option<String>, requested: Option<&str>| -> Option<String> {
            requested
                .filter(|value| stored.as_deref() != Some(*value))
                .map(str::to_string)
        };

        let patch = ContextPatch {
            email: changed(&self.email, Some(email)),
            name: changed(&self.name, name),
            company_url: changed(&self.company_url, company_url),
            ..Default::default()
        };

        (!patch.is_empty()).then_some(patch)
    }
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if let Some(value) = value {
        *slot = Some(value);
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Partial update of a [`ConversationContext`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub company_url: Option<String>,
    pub company_context: Option<Value>,
    pub person_context: Option<Value>,
    pub role: Option<String>,
    pub role_confidence: Option<f64>,
    pub last_user_message: Option<String>,
    /// Unioned into the stored set.
    pub capabilities_shown: Vec<String>,
}

impl ContextPatch {
    /// Patch with the visitor's identifiers.
    pub fn identity(
        email: impl Into<String>,
        name: Option<String>,
        company_url: Option<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            name,
            company_url,
            ..Default::default()
        }
    }

    /// Patch with research results. Absent parts of the snapshot are untouched.
    pub fn research(snapshot: ResearchSnapshot) -> Self {
        Self {
            company_context: snapshot.company,
            person_context: snapshot.person,
            role: snapshot.role,
            role_confidence: snapshot.role_confidence,
            ..Default::default()
        }
    }

    pub fn with_last_user_message(mut self, message: impl Into<String>) -> Self {
        self.last_user_message = Some(message.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities_shown.push(capability.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Returns true if applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.company_url.is_none()
            && self.company_context.is_none()
            && self.person_context.is_none()
            && self.role.is_none()
            && self.role_confidence.is_none()
            && self.last_user_message.is_none()
            && self.capabilities_shown.is_empty()
    }
}

/// Research view returned to callers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSnapshot {
    pub company: Option<Value>,
    pub person: Option<Value>,
    pub role: Option<String>,
    pub role_confidence: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn researched() -> ConversationContext {
        let mut ctx = ConversationContext::new(SessionId::parse("s-1").unwrap());
        ctx.apply(ContextPatch {
            email: Some("old@x.com".to_string()),
            company_context: Some(json!({"name": "X Corp"})),
            role: Some("CTO".to_string()),
            ..Default::default()
        });
        ctx
    }

    mod merging {
        use super::*;

        #[test]
        fn identifier_update_keeps_research() {
            let mut ctx = researched();
            ctx.apply(ContextPatch::default().with_email("new@x.com"));

            assert_eq!(ctx.email.as_deref(), Some("new@x.com"));
            assert_eq!(ctx.company_context, Some(json!({"name": "X Corp"})));
            assert_eq!(ctx.role.as_deref(), Some("CTO"));
        }

        #[test]
        fn research_can_be_replaced_with_new_values() {
            let mut ctx = researched();
            ctx.apply(ContextPatch::research(ResearchSnapshot {
                role: Some("CEO".to_string()),
                ..Default::default()
            }));
            assert_eq!(ctx.role.as_deref(), Some("CEO"));
            assert!(ctx.company_context.is_some());
        }

        #[test]
        fn capabilities_are_unioned() {
            let mut ctx = researched();
            ctx.apply(ContextPatch::default().with_capability("roi-calculator"));
            ctx.apply(
                ContextPatch::default()
                    .with_capability("roi-calculator")
                    .with_capability("case-study"),
            );
            let caps: Vec<_> = ctx.capabilities_shown.iter().cloned().collect();
            assert_eq!(caps, vec!["case-study", "roi-calculator"]);
        }

        #[test]
        fn role_confidence_is_clamped() {
            let mut ctx = researched();
            ctx.apply(ContextPatch {
                role_confidence: Some(1.7),
                ..Default::default()
            });
            assert_eq!(ctx.role_confidence, Some(1.0));
        }

        #[test]
        fn empty_patch_is_empty() {
            assert!(ContextPatch::default().is_empty());
            assert!(!ContextPatch::default().with_name("a").is_empty());
        }
    }

    mod research {
        use super::*;

        #[test]
        fn fresh_context_has_no_snapshot() {
            let ctx = ConversationContext::new(SessionId::new());
            assert!(!ctx.has_research_evidence());
            assert_eq!(ctx.research_snapshot(), None);
        }

        #[test]
        fn snapshot_reflects_research_fields() {
            let snapshot = researched().research_snapshot().unwrap();
            assert_eq!(snapshot.role.as_deref(), Some("CTO"));
            assert_eq!(snapshot.person, None);
        }

        #[test]
        fn snapshot_serializes_in_camel_case() {
            let snapshot = ResearchSnapshot {
                role_confidence: Some(0.8),
                ..Default::default()
            };
            let value = serde_json::to_value(snapshot).unwrap();
            assert_eq!(value["roleConfidence"], json!(0.8));
        }
    }

    mod identity_changes {
        use super::*;

        #[test]
        fn unchanged_identity_yields_none() {
            let ctx = researched();
            assert_eq!(ctx.identity_changes("old@x.com", None, None), None);
        }

        #[test]
        fn only_changed_fields_are_included() {
            let ctx = researched();
            let patch = ctx
                .identity_changes("old@x.com", Some("Ann"), None)
                .unwrap();
            assert_eq!(patch.email, None);
            assert_eq!(patch.name.as_deref(), Some("Ann"));
            assert_eq!(patch.company_context, None);
        }

        #[test]
        fn absent_values_do_not_clear_stored_ones() {
            let mut ctx = researched();
            ctx.apply(ContextPatch::default().with_name("Ann"));
            let patch = ctx.identity_changes("new@x.com", None, None).unwrap();
            ctx.apply(patch);
            assert_eq!(ctx.name.as_deref(), Some("Ann"));
            assert_eq!(ctx.email.as_deref(), Some("new@x.com"));
        }
    }
}
