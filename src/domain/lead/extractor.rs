//! Signal extraction from visitor messages.
//!
//! Stateless, total and deterministic functions deriving structured signals
//! (name, email, pain points, decision-maker flag, readiness) from raw text.
//! The stage machine only sees the [`ExtractionEngine`] trait, so a
//! model-based implementation can replace the keyword one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// ════════════════════════════════════════════════════════════════════════════════
// Canonical pain point tags
// ════════════════════════════════════════════════════════════════════════════════

/// Canonical pain point tag from the curated lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PainPoint {
    Manual,
    ErrorProne,
    TimeConsuming,
    Repetitive,
    Costly,
    Scaling,
    DataSilos,
    Inefficient,
}

impl PainPoint {
    /// Lexicon order; extraction reports tags in this order.
    pub const ALL: [PainPoint; 8] = [
        PainPoint::Manual,
        PainPoint::ErrorProne,
        PainPoint::TimeConsuming,
        PainPoint::Repetitive,
        PainPoint::Costly,
        PainPoint::Scaling,
        PainPoint::DataSilos,
        PainPoint::Inefficient,
    ];

    /// The canonical tag.
    pub fn tag(&self) -> &'static str {
        match self {
            PainPoint::Manual => "manual",
            PainPoint::ErrorProne => "error-prone",
            PainPoint::TimeConsuming => "time-consuming",
            PainPoint::Repetitive => "repetitive",
            PainPoint::Costly => "costly",
            PainPoint::Scaling => "scaling",
            PainPoint::DataSilos => "data-silos",
            PainPoint::Inefficient => "inefficient",
        }
    }

    /// Lowercase phrases that map to this tag.
    fn phrases(&self) -> &'static [&'static str] {
        match self {
            PainPoint::Manual => &[
                "manual",
                "by hand",
                "spreadsheet",
                "copy-paste",
                "copy paste",
                "paperwork",
            ],
            PainPoint::ErrorProne => &[
                "error-prone",
                "error prone",
                "mistake",
                "errors",
                "inaccurate",
                "typos",
            ],
            PainPoint::TimeConsuming => &[
                "time-consuming",
                "time consuming",
                "takes hours",
                "takes days",
                "takes forever",
                "too long",
                "too slow",
            ],
            PainPoint::Repetitive => &["repetitive", "tedious", "over and over"],
            PainPoint::Costly => &["expensive", "costly", "too much money", "overhead"],
            PainPoint::Scaling => &[
                "can't scale",
                "cannot scale",
                "doesn't scale",
                "scaling",
                "growing pains",
            ],
            PainPoint::DataSilos => &[
                "silo",
                "disconnected",
                "scattered",
                "fragmented",
                "multiple systems",
            ],
            PainPoint::Inefficient => &["inefficient", "bottleneck", "wasting", "clunky"],
        }
    }
}

impl fmt::Display for PainPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Company size and industry signals
// ════════════════════════════════════════════════════════════════════════════════

/// Rough company size, used to weight decision-maker detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Startup,
    Small,
    Medium,
    Enterprise,
    #[default]
    Unknown,
}

impl CompanySize {
    /// Buckets a headcount.
    pub fn from_employee_count(count: u64) -> Self {
        match count {
            0..=10 => CompanySize::Startup,
            11..=50 => CompanySize::Small,
            51..=500 => CompanySize::Medium,
            _ => CompanySize::Enterprise,
        }
    }

    /// Reads a size hint out of researched company context.
    ///
    /// Understands `employeeCount`/`employees` numbers and a `size` label.
    pub fn from_company_context(context: &serde_json::Value) -> Self {
        for key in ["employeeCount", "employee_count", "employees"] {
            if let Some(count) = context.get(key).and_then(|v| v.as_u64()) {
                return Self::from_employee_count(count);
            }
        }
        match context
            .get("size")
            .and_then(|v| v.as_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            Some("startup") => CompanySize::Startup,
            Some("small") => CompanySize::Small,
            Some("medium") | Some("mid-market") => CompanySize::Medium,
            Some("enterprise") | Some("large") => CompanySize::Enterprise,
            _ => CompanySize::Unknown,
        }
    }
}

/// Industry adoption signals, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustrySignals {
    pub tech_adoption: f64,
    pub digital_transformation: f64,
    pub process_automation: f64,
}

impl IndustrySignals {
    /// Creates signals, clamping each component to `[0, 1]`.
    pub fn new(tech_adoption: f64, digital_transformation: f64, process_automation: f64) -> Self {
        Self {
            tech_adoption: clamp_unit(tech_adoption),
            digital_transformation: clamp_unit(digital_transformation),
            process_automation: clamp_unit(process_automation),
        }
    }

    /// Reads signals published by the research provider, if any.
    pub fn from_company_context(context: &serde_json::Value) -> Self {
        let read = |key: &str| context.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
        Self::new(
            read("techAdoption"),
            read("digitalTransformation"),
            read("processAutomation"),
        )
    }

    /// Component-wise maximum of two observations.
    pub fn merge(self, other: IndustrySignals) -> Self {
        Self {
            tech_adoption: self.tech_adoption.max(other.tech_adoption),
            digital_transformation: self.digital_transformation.max(other.digital_transformation),
            process_automation: self.process_automation.max(other.process_automation),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// `50 + techAdoption*20 + digitalTransformation*15 + processAutomation*10`,
/// rounded and clamped to `[0, 100]`.
pub fn ai_readiness_score(signals: &IndustrySignals) -> u8 {
    let raw = 50.0
        + signals.tech_adoption * 20.0
        + signals.digital_transformation * 15.0
        + signals.process_automation * 10.0;
    if raw.is_nan() {
        return 50;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

// ════════════════════════════════════════════════════════════════════════════════
// Extraction engine
// ════════════════════════════════════════════════════════════════════════════════

/// Port-like seam for signal extraction.
pub trait ExtractionEngine: Send + Sync {
    /// Visitor's name, title-cased, if the text introduces one.
    fn extract_name(&self, text: &str) -> Option<String>;

    /// First email address in the text, lowercased.
    fn extract_email(&self, text: &str) -> Option<String>;

    /// Canonical pain point tags, deduplicated, in lexicon order.
    fn extract_pain_points(&self, text: &str) -> Vec<PainPoint>;

    /// Whether the email's local part names a decision-making role.
    fn decision_maker_signal(&self, email: &str, company_size: CompanySize) -> bool;

    /// Adoption signals mentioned in the text.
    fn industry_signals(&self, text: &str) -> IndustrySignals;

    /// Whether the text expresses interest in hearing more.
    fn expresses_interest(&self, text: &str) -> bool;

    /// Readiness score for the given signals.
    fn ai_readiness_score(&self, signals: &IndustrySignals) -> u8 {
        ai_readiness_score(signals)
    }

    /// Company name guessed from a non-free-mail email domain.
    fn company_from_email(&self, email: &str) -> Option<String> {
        company_from_email(email)
    }
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,}")
        .expect("email pattern is valid")
});

/// Introductions that name the visitor whatever the casing.
static EXPLICIT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:my name is|my name's|name is|name's|call me)\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,3})",
    )
    .expect("explicit name pattern is valid")
});

/// Introductions that only name the visitor when followed by capitalized words.
static CASUAL_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^A-Za-z])(?i:i'm|i am|im|this is|it's|it is)\s+([A-Z][A-Za-z'\-]*(?:\s+[A-Z][A-Za-z'\-]*){0,2})",
    )
    .expect("casual name pattern is valid")
});

/// A message that is nothing but one to three capitalized words.
static BARE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Za-z'\-]+(?:\s+[A-Z][A-Za-z'\-]+){0,2})$")
        .expect("bare name pattern is valid")
});

/// Words that end a captured name.
const NAME_TERMINATORS: &[&str] = &[
    "and", "from", "at", "with", "but", "here", "i", "im", "i'm", "the", "of", "in", "for",
    "my", "we", "our", "you", "please", "thanks",
];

/// Words that are never the first word of a name.
const NON_NAME_WORDS: &[&str] = &[
    "hello", "hi", "hey", "yes", "yeah", "yep", "no", "nope", "ok", "okay", "sure", "thanks",
    "thank", "great", "cool", "interesting", "interested", "sounds", "good", "fine", "maybe",
    "what", "why", "how", "who", "when", "where", "not", "just", "looking", "here", "happy",
    "glad", "tell", "more", "please", "the", "a", "an", "we", "our", "my", "i", "good",
];

const FREE_MAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "icloud.com",
    "me.com",
    "aol.com",
    "proton.me",
    "protonmail.com",
    "gmx.com",
    "mail.com",
];

const EXECUTIVE_TITLES: &[&str] = &[
    "ceo", "cto", "cfo", "coo", "cio", "cmo", "chief", "founder", "cofounder", "president",
    "owner", "vp", "svp", "evp",
];
const SENIOR_TITLES: &[&str] = &["director", "head", "gm"];
const MANAGER_TITLES: &[&str] = &["manager", "mgr", "lead"];
const STARTUP_INBOXES: &[&str] = &["info", "hello", "contact", "team", "hi"];

const TECH_KEYWORDS: &[&str] = &[
    "cloud", "api", "saas", "software", "crm", "erp", "platform", "integration", "data",
];
const DIGITAL_KEYWORDS: &[&str] = &[
    "digital", "transformation", "modernize", "modernise", "online", "ecommerce",
];
const AUTOMATION_KEYWORDS: &[&str] = &[
    "automat", "workflow", "rpa", "pipeline", "script", "bot", "ai",
];

const INTEREST_WORDS: &[&str] = &["interesting", "more", "yes"];
const INTEREST_PHRASES: &[&str] = &["sounds good"];

/// Keyword and regex based extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordExtractionEngine;

impl KeywordExtractionEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionEngine for KeywordExtractionEngine {
    fn extract_name(&self, text: &str) -> Option<String> {
        let text = text.trim();

        if let Some(caps) = EXPLICIT_NAME_RE.captures(text) {
            if let Some(name) = caps.get(1).and_then(|m| normalize_name(m.as_str())) {
                return Some(name);
            }
        }

        if let Some(caps) = CASUAL_NAME_RE.captures(text) {
            if let Some(name) = caps.get(1).and_then(|m| normalize_name(m.as_str())) {
                return Some(name);
            }
        }

        let bare = text.trim_end_matches(['.', '!']);
        BARE_NAME_RE
            .captures(bare)
            .and_then(|caps| caps.get(1))
            .and_then(|m| normalize_name(m.as_str()))
    }

    fn extract_email(&self, text: &str) -> Option<String> {
        EMAIL_RE
            .find(text)
            .map(|m| m.as_str().trim_matches('.').to_lowercase())
            .filter(|email| email.contains('@'))
    }

    fn extract_pain_points(&self, text: &str) -> Vec<PainPoint> {
        let lower = text.to_lowercase();
        PainPoint::ALL
            .into_iter()
            .filter(|point| point.phrases().iter().any(|phrase| lower.contains(phrase)))
            .collect()
    }

    fn decision_maker_signal(&self, email: &str, company_size: CompanySize) -> bool {
        let local = email.split('@').next().unwrap_or_default().to_lowercase();
        let tokens: Vec<&str> = local
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut titles: Vec<&str> = EXECUTIVE_TITLES.to_vec();
        match company_size {
            CompanySize::Enterprise => {}
            CompanySize::Medium | CompanySize::Unknown => titles.extend(SENIOR_TITLES),
            CompanySize::Small => {
                titles.extend(SENIOR_TITLES);
                titles.extend(MANAGER_TITLES);
            }
            CompanySize::Startup => {
                titles.extend(SENIOR_TITLES);
                titles.extend(MANAGER_TITLES);
                titles.extend(STARTUP_INBOXES);
            }
        }

        tokens.iter().any(|token| {
            titles
                .iter()
                .any(|title| token == title || (title.len() >= 5 && token.contains(title)))
        })
    }

    fn industry_signals(&self, text: &str) -> IndustrySignals {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let score = |keywords: &[&str]| -> f64 {
            let hits = keywords
                .iter()
                .filter(|kw| {
                    tokens.iter().any(|token| {
                        if kw.len() <= 3 {
                            token == *kw
                        } else {
                            token.starts_with(*kw)
                        }
                    })
                })
                .count();
            hits as f64 / 2.0
        };
        IndustrySignals::new(
            score(TECH_KEYWORDS),
            score(DIGITAL_KEYWORDS),
            score(AUTOMATION_KEYWORDS),
        )
    }

    fn expresses_interest(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        if INTEREST_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            return true;
        }
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| INTEREST_WORDS.contains(&word))
    }
}

/// Cuts a captured name at connector words and title-cases it.
fn normalize_name(raw: &str) -> Option<String> {
    let words: Vec<String> = raw
        .split_whitespace()
        .take_while(|w| !NAME_TERMINATORS.contains(&w.to_lowercase().as_str()))
        .take(3)
        .map(capitalize)
        .collect();

    let first = words.first()?.to_lowercase();
    if NON_NAME_WORDS.contains(&first.as_str()) {
        return None;
    }
    Some(words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Company name from the email domain, skipping free-mail providers.
pub fn company_from_email(email: &str) -> Option<String> {
    let domain = email.rsplit_once('@')?.1.trim().to_lowercase();
    if domain.is_empty() || FREE_MAIL_DOMAINS.contains(&domain.as_str()) {
        return None;
    }

    let mut labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    labels.pop();
    if labels.len() >= 2 && matches!(labels.last(), Some(&"co") | Some(&"com") | Some(&"org")) {
        labels.pop();
    }
    labels.last().map(|label| capitalize(label))
}
