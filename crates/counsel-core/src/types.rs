use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

// ── Section types ────────────────────────────────────────────────────────

/// The six analytical subdivisions of a report.
///
/// Each variant owns its fixed lookup data (title, instruction block, domain
/// vocabulary, expected elements). The tables are compiled in and shared
/// read-only by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    LiabilityAssessment,
    DamageCalculation,
    PriorArtAnalysis,
    CompetitiveLandscape,
    RiskAssessment,
    StrategicRecommendations,
}

impl SectionType {
    pub const ALL: [SectionType; 6] = [
        Self::LiabilityAssessment,
        Self::DamageCalculation,
        Self::PriorArtAnalysis,
        Self::CompetitiveLandscape,
        Self::RiskAssessment,
        Self::StrategicRecommendations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LiabilityAssessment => "liability_assessment",
            Self::DamageCalculation => "damage_calculation",
            Self::PriorArtAnalysis => "prior_art_analysis",
            Self::CompetitiveLandscape => "competitive_landscape",
            Self::RiskAssessment => "risk_assessment",
            Self::StrategicRecommendations => "strategic_recommendations",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::LiabilityAssessment => "Liability Assessment",
            Self::DamageCalculation => "Damage Calculation",
            Self::PriorArtAnalysis => "Prior Art Analysis",
            Self::CompetitiveLandscape => "Competitive Landscape",
            Self::RiskAssessment => "Risk Assessment",
            Self::StrategicRecommendations => "Strategic Recommendations",
        }
    }

    /// Section-specific instruction block appended to the generation prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::LiabilityAssessment => LIABILITY_INSTRUCTION,
            Self::DamageCalculation => DAMAGES_INSTRUCTION,
            Self::PriorArtAnalysis => PRIOR_ART_INSTRUCTION,
            Self::CompetitiveLandscape => COMPETITIVE_INSTRUCTION,
            Self::RiskAssessment => RISK_INSTRUCTION,
            Self::StrategicRecommendations => STRATEGY_INSTRUCTION,
        }
    }

    /// Domain vocabulary used for groundedness keyword coverage.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::LiabilityAssessment => &[
                "liability",
                "negligence",
                "breach",
                "duty",
                "causation",
                "claim",
                "evidence",
                "plaintiff",
                "defendant",
                "infringement",
                "standard of care",
                "proximate cause",
                "damages",
            ],
            Self::DamageCalculation => &[
                "damages",
                "compensation",
                "calculation",
                "quantum",
                "lost profits",
                "royalty",
                "economic",
                "financial",
                "valuation",
                "monetary",
                "price erosion",
                "market share",
            ],
            Self::PriorArtAnalysis => &[
                "prior art",
                "patent",
                "novelty",
                "obviousness",
                "claims",
                "invention",
                "disclosure",
                "reference",
                "validity",
                "prosecution",
                "patent landscape",
                "citation",
            ],
            Self::CompetitiveLandscape => &[
                "competitors",
                "market share",
                "positioning",
                "competitive",
                "industry",
                "advantage",
                "differentiation",
                "licensing",
                "market dynamics",
                "technology",
            ],
            Self::RiskAssessment => &[
                "risk",
                "probability",
                "impact",
                "mitigation",
                "exposure",
                "likelihood",
                "severity",
                "contingency",
                "vulnerability",
                "threat",
                "uncertainty",
            ],
            Self::StrategicRecommendations => &[
                "recommendation",
                "strategy",
                "implementation",
                "action",
                "timeline",
                "priority",
                "resource",
                "objective",
                "milestone",
                "initiative",
                "outcome",
            ],
        }
    }

    /// Elements the quality gate expects a freshly generated section to cover.
    pub fn expected_elements(&self) -> &'static [&'static str] {
        match self {
            Self::LiabilityAssessment => &["claims", "evidence", "probability", "precedent"],
            Self::DamageCalculation => &["damages", "calculation", "amount", "methodology"],
            Self::PriorArtAnalysis => &["patents", "prior art", "validity", "obviousness"],
            Self::CompetitiveLandscape => &["competitors", "market", "position", "licensing"],
            Self::RiskAssessment => &["risks", "probability", "impact", "mitigation"],
            Self::StrategicRecommendations => &["recommendations", "action", "timeline", "resources"],
        }
    }

    /// Elements the post-hoc report audit checks for.
    pub fn audit_elements(&self) -> &'static [&'static str] {
        match self {
            Self::LiabilityAssessment => &["liability", "breach", "duty", "causation"],
            Self::DamageCalculation => &["damages", "calculation", "compensation", "quantum"],
            Self::PriorArtAnalysis => &["prior art", "patent", "novelty", "claims"],
            Self::CompetitiveLandscape => &["competitors", "market", "positioning", "advantage"],
            Self::RiskAssessment => &["risk", "probability", "impact", "mitigation"],
            Self::StrategicRecommendations => &["recommendation", "strategy", "implementation", "timeline"],
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ReportError::UnknownSectionType(s.to_string()))
    }
}

const LIABILITY_INSTRUCTION: &str = "
Analyze liability by:
- Identifying each potential claim
- Evaluating strength of evidence
- Assessing probability of success (use percentages)
- Citing relevant precedents or legal principles
";

const DAMAGES_INSTRUCTION: &str = "
Calculate potential damages by:
- Identifying categories of damages (actual, statutory, punitive)
- Providing specific dollar ranges
- Explaining calculation methodology
- Considering mitigation factors
";

const PRIOR_ART_INSTRUCTION: &str = "
Analyze prior art and precedents by:
- Identifying relevant existing patents/IP
- Assessing validity challenges
- Evaluating obviousness arguments
- Determining freedom to operate
";

const COMPETITIVE_INSTRUCTION: &str = "
Analyze competitive implications by:
- Identifying key competitors affected
- Assessing market position changes
- Evaluating licensing opportunities
- Predicting competitor responses
";

const RISK_INSTRUCTION: &str = "
Assess risks by:
- Identifying legal risks (probability and impact)
- Evaluating business risks
- Analyzing reputational risks
- Providing risk mitigation strategies
";

const STRATEGY_INSTRUCTION: &str = "
Provide strategic recommendations by:
- Outlining 3-5 specific action items
- Prioritizing by impact and urgency
- Estimating resource requirements
- Defining success metrics
";

// ── Personas ─────────────────────────────────────────────────────────────

/// Expert voices available to the report pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaKey {
    LitigationExpert,
    ValuationSpecialist,
    PatentResearcher,
}

impl PersonaKey {
    pub const ALL: [PersonaKey; 3] = [
        Self::LitigationExpert,
        Self::ValuationSpecialist,
        Self::PatentResearcher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LitigationExpert => "litigation_expert",
            Self::ValuationSpecialist => "valuation_specialist",
            Self::PatentResearcher => "patent_researcher",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LitigationExpert => "IP Litigation Expert",
            Self::ValuationSpecialist => "IP Valuation Specialist",
            Self::PatentResearcher => "Patent Researcher",
        }
    }
}

impl fmt::Display for PersonaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ReportError::UnknownPersonaKey(s.to_string()))
    }
}

// ── Case input ───────────────────────────────────────────────────────────

/// One legal case under analysis. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub case_name: String,
    pub complaint_text: String,
    pub case_type: String,
    pub filing_date: String,
    #[serde(default)]
    pub parties_involved: Vec<String>,
    #[serde(default)]
    pub key_issues: Vec<String>,
    #[serde(default = "default_urgency")]
    pub urgency_level: String,
    #[serde(default)]
    pub additional_context: Option<String>,
}

fn default_urgency() -> String {
    "standard".into()
}

// ── Generation accounting ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

impl std::ops::Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage::new(
            self.input_tokens + rhs.input_tokens,
            self.output_tokens + rhs.output_tokens,
        )
    }
}

// ── Quality ──────────────────────────────────────────────────────────────

/// Result of one scoring call. Consumed by the accept/regenerate decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub overall: f64,
    pub coherence: f64,
    pub groundedness: f64,
    pub completeness: f64,
    pub structure: f64,
    pub feedback: Vec<String>,
}

/// Outcome of re-scoring an already assembled report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub overall_score: f64,
    pub passed: bool,
    pub section_scores: BTreeMap<String, f64>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

// ── Report ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section type key; free-form so externally supplied reports can be audited.
    #[serde(rename = "type")]
    pub section_type: String,
    pub title: String,
    pub content: String,
    /// Persona key of the agent that wrote the accepted content.
    pub agent_type: String,
    pub quality_score: f64,
    /// Summed across every generation attempt for this section.
    pub tokens_used: u64,
    /// Summed across every generation attempt for this section.
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_attempts() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub scenario: Scenario,
    /// Generation order; later sections were prompted with earlier ones.
    pub sections: Vec<ReportSection>,
    pub executive_summary: String,
    pub total_cost: f64,
    pub total_tokens: u64,
    /// Seconds.
    pub processing_time: f64,
    pub confidence_score: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}
