use chrono::Utc;
use tracing::info;

use crate::error::ReportError;
use crate::generator::SectionGenerator;
use crate::prompt::{compile_prompt, compile_regeneration_prompt};
use crate::quality::QualityScorer;
use crate::types::{PersonaKey, ReportSection, Scenario, SectionType, TokenUsage};

/// Outcome of the quality gate for one scored draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Regenerate,
}

/// Accept when the score clears `threshold`, or unconditionally once the
/// single regeneration has been spent (`attempt` is zero-based).
pub fn decide(score: f64, attempt: u32, threshold: f64) -> Decision {
    if score >= threshold || attempt >= 1 {
        Decision::Accept
    } else {
        Decision::Regenerate
    }
}

/// Produces one accepted section: compile, generate, score, and at most one
/// feedback-driven regeneration.
pub struct SectionPipeline {
    generator: SectionGenerator,
    scorer: QualityScorer,
}

impl SectionPipeline {
    pub fn new(generator: SectionGenerator, scorer: QualityScorer) -> Self {
        Self { generator, scorer }
    }

    pub fn generator(&self) -> &SectionGenerator {
        &self.generator
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    pub async fn generate_section(
        &self,
        section_type: SectionType,
        persona_key: PersonaKey,
        persona: &str,
        scenario: &Scenario,
        previous_sections: &[ReportSection],
    ) -> Result<ReportSection, ReportError> {
        let section = section_type.as_str();
        let mut prompt = compile_prompt(persona, section, scenario, previous_sections);
        let mut usage = TokenUsage::default();
        let mut cost = 0.0;
        let mut attempt = 0u32;

        loop {
            let draft = self.generator.generate_with_retry(&prompt).await?;
            usage = usage + draft.usage;
            cost += draft.cost;

            let quality = self
                .scorer
                .score(&draft.text, section, section_type.expected_elements());

            match decide(quality.overall, attempt, self.scorer.threshold()) {
                Decision::Accept => {
                    info!(
                        section,
                        persona = %persona_key,
                        attempt = attempt + 1,
                        score = quality.overall,
                        tokens = usage.total_tokens,
                        cost,
                        "section accepted"
                    );
                    return Ok(ReportSection {
                        section_type: section.to_string(),
                        title: section_type.title().to_string(),
                        content: draft.text,
                        agent_type: persona_key.as_str().to_string(),
                        quality_score: quality.overall,
                        tokens_used: usage.total_tokens,
                        cost,
                        timestamp: Utc::now(),
                        attempts: attempt + 1,
                    });
                }
                Decision::Regenerate => {
                    info!(
                        section,
                        persona = %persona_key,
                        score = quality.overall,
                        gaps = quality.feedback.len(),
                        "section below quality threshold, regenerating"
                    );
                    prompt = compile_regeneration_prompt(
                        persona,
                        section,
                        scenario,
                        previous_sections,
                        &quality.feedback,
                    );
                    attempt += 1;
                }
            }
        }
    }
}
