use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::time::Instant;
use tracing::{error, info};

use crate::error::ReportError;
use crate::metrics::MetricsCollector;
use crate::pipeline::SectionPipeline;
use crate::prompt::truncate_chars;
use crate::quality::paragraphs;
use crate::types::{AnalysisReport, PersonaKey, ReportSection, Scenario, SectionType};

/// Stages of every report, in generation order.
pub const SECTION_SEQUENCE: [(SectionType, PersonaKey); 6] = [
    (SectionType::LiabilityAssessment, PersonaKey::LitigationExpert),
    (SectionType::DamageCalculation, PersonaKey::LitigationExpert),
    (SectionType::PriorArtAnalysis, PersonaKey::ValuationSpecialist),
    (SectionType::CompetitiveLandscape, PersonaKey::ValuationSpecialist),
    (SectionType::RiskAssessment, PersonaKey::PatentResearcher),
    (SectionType::StrategicRecommendations, PersonaKey::PatentResearcher),
];

const SUMMARY_MIN_PARAGRAPH_CHARS: usize = 50;
const SUMMARY_EXCERPT_CHARS: usize = 200;

/// Persona system texts keyed by persona.
#[derive(Debug, Clone, Default)]
pub struct PersonaLibrary {
    personas: HashMap<PersonaKey, String>,
}

impl PersonaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: PersonaKey, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    pub fn insert(&mut self, key: PersonaKey, text: impl Into<String>) {
        self.personas.insert(key, text.into());
    }

    pub fn get(&self, key: PersonaKey) -> Result<&str, ReportError> {
        self.personas
            .get(&key)
            .map(String::as_str)
            .ok_or_else(|| ReportError::UnknownPersonaKey(key.as_str().to_string()))
    }

    /// Entries in [`PersonaKey::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (PersonaKey, &str)> {
        PersonaKey::ALL
            .into_iter()
            .filter_map(|k| self.personas.get(&k).map(|t| (k, t.as_str())))
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

/// Runs the six sections in order and assembles the report.
pub struct ReportOrchestrator {
    pipeline: SectionPipeline,
    personas: PersonaLibrary,
    metrics: Arc<MetricsCollector>,
}

impl ReportOrchestrator {
    /// Fails with `UnknownPersonaKey` if any stage's persona is missing.
    pub fn new(
        pipeline: SectionPipeline,
        personas: PersonaLibrary,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self, ReportError> {
        for (_, key) in SECTION_SEQUENCE {
            personas.get(key)?;
        }
        Ok(Self {
            pipeline,
            personas,
            metrics,
        })
    }

    pub fn personas(&self) -> &PersonaLibrary {
        &self.personas
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn pipeline(&self) -> &SectionPipeline {
        &self.pipeline
    }

    pub fn model_name(&self) -> String {
        self.pipeline.generator().model_name()
    }

    /// Generate all sections strictly in sequence. Any section failure
    /// aborts the report; no partial report is returned.
    pub async fn generate_report(&self, scenario: &Scenario) -> Result<AnalysisReport, ReportError> {
        let started = Instant::now();
        info!(case = %scenario.case_name, case_type = %scenario.case_type, "starting analysis");

        let mut sections: Vec<ReportSection> = Vec::with_capacity(SECTION_SEQUENCE.len());
        for (section_type, persona_key) in SECTION_SEQUENCE {
            let persona = self.personas.get(persona_key)?;
            let section = self
                .pipeline
                .generate_section(section_type, persona_key, persona, scenario, &sections)
                .await
                .inspect_err(|e| {
                    error!(case = %scenario.case_name, section = %section_type, error = %e, "analysis aborted");
                })?;
            sections.push(section);
        }

        let confidence_score =
            sections.iter().map(|s| s.quality_score).sum::<f64>() / sections.len() as f64;
        let total_tokens = sections.iter().map(|s| s.tokens_used).sum();
        let total_cost = sections.iter().map(|s| s.cost).sum();
        let executive_summary = build_executive_summary(scenario, &sections, confidence_score);
        let regenerated = sections.iter().filter(|s| s.attempts > 1).count();
        let processing_time = started.elapsed().as_secs_f64();
        self.metrics.record_processing_time(processing_time);

        let mut metadata = BTreeMap::new();
        metadata.insert("model".to_string(), json!(self.model_name()));
        metadata.insert("regenerated_sections".to_string(), json!(regenerated));

        info!(
            case = %scenario.case_name,
            confidence = confidence_score,
            tokens = total_tokens,
            cost = total_cost,
            seconds = processing_time,
            "analysis complete"
        );

        Ok(AnalysisReport {
            scenario: scenario.clone(),
            sections,
            executive_summary,
            total_cost,
            total_tokens,
            processing_time,
            confidence_score,
            timestamp: Utc::now(),
            metadata,
        })
    }
}

/// Header, one excerpt per section with a substantive opening paragraph,
/// and one aggregate line.
pub fn build_executive_summary(
    scenario: &Scenario,
    sections: &[ReportSection],
    confidence: f64,
) -> String {
    let mut s = format!("EXECUTIVE SUMMARY - {}\n", scenario.case_name);
    s.push_str(&"=".repeat(50));
    s.push_str("\n\n");

    for section in sections {
        let Some(paragraph) = paragraphs(&section.content)
            .find(|p| p.chars().count() > SUMMARY_MIN_PARAGRAPH_CHARS)
        else {
            continue;
        };
        s.push_str(&format!(
            "{}:\n{}...\n\n",
            section.title,
            truncate_chars(paragraph, SUMMARY_EXCERPT_CHARS)
        ));
    }

    s.push_str(&format!(
        "Overall Confidence: {:.1}% | Key Issues Identified: {} | Urgency Level: {}",
        confidence * 100.0,
        scenario.key_issues.len(),
        scenario.urgency_level
    ));
    s
}
