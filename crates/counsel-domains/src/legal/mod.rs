pub mod intake;
pub mod personas;

use counsel_core::orchestrator::PersonaLibrary;
use counsel_core::PersonaKey;
use serde::Serialize;
use tracing::info;

use intake::{extract_capabilities, extract_focus_areas};

/// Minimum word count for a persona to count as fully specified.
const PERSONA_MIN_WORDS: usize = 150;

pub fn persona_text(key: PersonaKey) -> &'static str {
    match key {
        PersonaKey::LitigationExpert => personas::LITIGATION_EXPERT,
        PersonaKey::ValuationSpecialist => personas::VALUATION_SPECIALIST,
        PersonaKey::PatentResearcher => personas::PATENT_RESEARCHER,
    }
}

/// Library holding every built-in persona.
pub fn persona_library() -> PersonaLibrary {
    let library = PersonaKey::ALL
        .into_iter()
        .fold(PersonaLibrary::new(), |lib, key| lib.with(key, persona_text(key)));
    info!(personas = library.len(), "loaded legal personas");
    library
}

/// Entry of the agent listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentProfile {
    #[serde(rename = "type")]
    pub agent_type: String,
    pub name: String,
    pub capabilities: Vec<String>,
    pub focus_areas: Vec<String>,
}

pub fn agent_profiles(library: &PersonaLibrary) -> Vec<AgentProfile> {
    library
        .iter()
        .map(|(key, text)| AgentProfile {
            agent_type: key.as_str().to_string(),
            name: key.display_name().to_string(),
            capabilities: extract_capabilities(text),
            focus_areas: extract_focus_areas(text),
        })
        .collect()
}

/// Self-check of a persona text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaCheck {
    pub has_role_definition: bool,
    pub has_expertise_areas: bool,
    pub has_communication_style: bool,
    pub has_frameworks: bool,
    pub sufficient_length: bool,
    pub word_count: usize,
    pub score: f64,
    pub feedback: Vec<String>,
}

impl PersonaCheck {
    pub fn passed(&self) -> bool {
        self.score >= 0.8
    }
}

/// Score a persona on role, expertise, style, frameworks and length,
/// 0.2 each. The first feedback line is the overall verdict.
pub fn validate_persona(text: &str) -> PersonaCheck {
    let lower = text.to_lowercase();
    let word_count = text.split_whitespace().count();
    let mut feedback = Vec::new();

    let has_role_definition = lower.contains("you are");
    if !has_role_definition {
        feedback.push("Missing role definition".to_string());
    }
    let has_expertise_areas = lower.contains("expertise") || lower.contains("specialize");
    if !has_expertise_areas {
        feedback.push("Missing expertise areas".to_string());
    }
    let has_communication_style = lower.contains("style");
    if !has_communication_style {
        feedback.push("Missing communication style".to_string());
    }
    let has_frameworks = lower.contains("framework") || lower.contains("approach");
    if !has_frameworks {
        feedback.push("Missing analytical frameworks".to_string());
    }
    let sufficient_length = word_count >= PERSONA_MIN_WORDS;
    if !sufficient_length {
        feedback.push(format!(
            "Too short: {word_count} words (minimum {PERSONA_MIN_WORDS})"
        ));
    }

    let passed = [
        has_role_definition,
        has_expertise_areas,
        has_communication_style,
        has_frameworks,
        sufficient_length,
    ]
    .iter()
    .filter(|b| **b)
    .count();
    let score = passed as f64 * 0.2;

    let verdict = if score >= 0.8 {
        "Persona meets quality standards"
    } else {
        "Persona needs improvement"
    };
    feedback.insert(0, verdict.to_string());

    PersonaCheck {
        has_role_definition,
        has_expertise_areas,
        has_communication_style,
        has_frameworks,
        sufficient_length,
        word_count,
        score,
        feedback,
    }
}
