use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use tracing::{debug, info};

use crate::types::{AnalysisReport, QualityScore, SectionType, ValidationResult};

/// Overall score a section needs to pass the quality gate.
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.7;

/// Sub-score below which a dimension gets a feedback hint. Independent of
/// the configured pass threshold.
const FEEDBACK_THRESHOLD: f64 = 0.7;

/// Recommendations kept in a [`ValidationResult`].
const MAX_RECOMMENDATIONS: usize = 5;

const WEIGHT_COHERENCE: f64 = 0.30;
const WEIGHT_GROUNDEDNESS: f64 = 0.30;
const WEIGHT_COMPLETENESS: f64 = 0.25;
const WEIGHT_STRUCTURE: f64 = 0.15;

const LOGICAL_CONNECTORS: [&str; 14] = [
    "therefore",
    "however",
    "furthermore",
    "moreover",
    "consequently",
    "additionally",
    "nevertheless",
    "in addition",
    "as a result",
    "accordingly",
    "thus",
    "hence",
    "meanwhile",
    "conversely",
];

const STRUCTURE_MARKERS: [&str; 11] = [
    "first",
    "second",
    "third",
    "finally",
    "next",
    "in conclusion",
    "to summarize",
    "in summary",
    "1.",
    "2.",
    "3.",
];

const REASONING_INDICATORS: [&str; 11] = [
    "based on",
    "because",
    "due to",
    "as a result",
    "evidence suggests",
    "analysis shows",
    "according to",
    "demonstrates",
    "indicates",
    "supported by",
    "given that",
];

const LIST_MARKERS: [&str; 6] = ["•", "-", "*", "1.", "2.", "3."];

const CONCLUSION_INDICATORS: [&str; 5] = ["conclusion", "summary", "therefore", "in summary", "overall"];

const FALLBACK_KEYWORDS: [&str; 3] = ["analysis", "assessment", "conclusion"];

const FALLBACK_AUDIT_ELEMENTS: [&str; 2] = ["analysis", "assessment"];

/// Lexical/structural quality gate for generated sections.
///
/// Scoring is deterministic and has no learned component: the same content,
/// section type and expected elements always produce the same score.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    threshold: f64,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_THRESHOLD)
    }
}

impl QualityScorer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn passes(&self, score: &QualityScore) -> bool {
        score.overall >= self.threshold
    }

    /// Score `content` along coherence, groundedness, completeness and
    /// structure, and produce one feedback hint per weak dimension.
    pub fn score<S: AsRef<str>>(
        &self,
        content: &str,
        section_type: &str,
        expected_elements: &[S],
    ) -> QualityScore {
        let coherence = coherence_score(content);
        let groundedness = groundedness_score(content, section_type, expected_elements);
        let completeness = completeness_score(content, expected_elements);
        let structure = structure_score(content);

        let overall = (coherence * WEIGHT_COHERENCE
            + groundedness * WEIGHT_GROUNDEDNESS
            + completeness * WEIGHT_COMPLETENESS
            + structure * WEIGHT_STRUCTURE)
            .clamp(0.0, 1.0);

        let mut feedback = Vec::new();
        if coherence < FEEDBACK_THRESHOLD {
            feedback.push("Improve logical flow and use more transition phrases".to_string());
        }
        if groundedness < FEEDBACK_THRESHOLD {
            feedback.push(format!(
                "Include more {section_type}-specific terminology and evidence"
            ));
        }
        if completeness < FEEDBACK_THRESHOLD {
            let elements: Vec<&str> = expected_elements.iter().map(AsRef::as_ref).collect();
            feedback.push(format!(
                "Address all expected elements: {}",
                elements.join(", ")
            ));
        }
        if structure < FEEDBACK_THRESHOLD {
            feedback.push("Improve paragraph structure and organization".to_string());
        }

        debug!(
            section = section_type,
            overall,
            coherence,
            groundedness,
            completeness,
            structure,
            "scored section"
        );

        QualityScore {
            overall,
            coherence,
            groundedness,
            completeness,
            structure,
            feedback,
        }
    }

    /// Re-score every section of an assembled report against the audit
    /// element list for its type.
    pub fn validate_report(&self, report: &AnalysisReport) -> ValidationResult {
        let mut section_scores = BTreeMap::new();
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        for section in &report.sections {
            let elements = SectionType::from_str(&section.section_type)
                .map(|t| t.audit_elements())
                .unwrap_or(&FALLBACK_AUDIT_ELEMENTS);
            let quality = self.score(&section.content, &section.section_type, elements);

            section_scores.insert(section.section_type.clone(), quality.overall);

            if quality.overall < self.threshold {
                issues.push(format!(
                    "{}: Score {:.2} below threshold",
                    section.title, quality.overall
                ));
                recommendations.extend(quality.feedback);
            }
        }

        let overall_score = if section_scores.is_empty() {
            0.0
        } else {
            section_scores.values().sum::<f64>() / section_scores.len() as f64
        };
        let passed = overall_score >= self.threshold;
        recommendations.truncate(MAX_RECOMMENDATIONS);

        info!(
            case = %report.scenario.case_name,
            overall_score,
            passed,
            issues = issues.len(),
            "validated report"
        );

        ValidationResult {
            overall_score,
            passed,
            section_scores,
            issues,
            recommendations,
        }
    }
}

// ── Dimensions ───────────────────────────────────────────────────────────

fn coherence_score(content: &str) -> f64 {
    let lower = content.to_lowercase();
    let mut score = paragraph_points(paragraph_count(content));

    score += match count_present(&lower, &LOGICAL_CONNECTORS) {
        n if n >= 3 => 0.2,
        n if n >= 1 => 0.1,
        _ => 0.0,
    };

    score += match count_present(&lower, &STRUCTURE_MARKERS) {
        n if n >= 2 => 0.2,
        1 => 0.1,
        _ => 0.0,
    };

    score += match qualifying_sentences(content).count() {
        n if n >= 8 => 0.3,
        n if n >= 5 => 0.2,
        n if n >= 3 => 0.1,
        _ => 0.0,
    };

    score.clamp(0.0, 1.0)
}

fn groundedness_score<S: AsRef<str>>(
    content: &str,
    section_type: &str,
    expected_elements: &[S],
) -> f64 {
    let lower = content.to_lowercase();
    let keywords = SectionType::from_str(section_type)
        .map(|t| t.keywords())
        .unwrap_or(&FALLBACK_KEYWORDS);

    let keyword_ratio = count_present(&lower, keywords) as f64 / keywords.len() as f64;
    let mut score = (keyword_ratio * 0.6).min(0.4);

    score += match count_present(&lower, &REASONING_INDICATORS) {
        n if n >= 4 => 0.35,
        3 => 0.3,
        2 => 0.2,
        1 => 0.1,
        _ => 0.0,
    };

    if !expected_elements.is_empty() {
        score += element_coverage(&lower, expected_elements) * 0.3;
    }

    score.clamp(0.0, 1.0)
}

fn completeness_score<S: AsRef<str>>(content: &str, expected_elements: &[S]) -> f64 {
    let word_count = content.split_whitespace().count();
    if word_count == 0 {
        return 0.0;
    }

    if expected_elements.is_empty() {
        return match word_count {
            n if n >= 200 => 1.0,
            n if n >= 100 => 0.7,
            n if n >= 50 => 0.5,
            _ => 0.3,
        };
    }

    let coverage = element_coverage(&content.to_lowercase(), expected_elements);
    let length = (word_count as f64 / 200.0).min(1.0);
    (coverage * 0.7 + length * 0.3).clamp(0.0, 1.0)
}

fn structure_score(content: &str) -> f64 {
    let mut score = paragraph_points(paragraph_count(content));

    if LIST_MARKERS.iter().any(|m| content.contains(m)) {
        score += 0.2;
    }

    let has_heading = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .any(|l| is_upper(l) || l.trim_start().starts_with('#'));
    if has_heading {
        score += 0.1;
    }

    let sentences: Vec<&str> = qualifying_sentences(content).collect();
    if sentences.len() >= 3 {
        let lengths: HashSet<usize> = sentences
            .iter()
            .map(|s| s.split_whitespace().count())
            .collect();
        if lengths.len() >= 3 {
            score += 0.2;
        }
    }

    let lower = content.to_lowercase();
    if CONCLUSION_INDICATORS.iter().any(|c| lower.contains(c)) {
        score += 0.2;
    }

    score.clamp(0.0, 1.0)
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Blank-line separated blocks that are non-empty after trimming.
pub(crate) fn paragraphs(content: &str) -> impl Iterator<Item = &str> {
    content.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

fn paragraph_count(content: &str) -> usize {
    paragraphs(content).count()
}

fn paragraph_points(count: usize) -> f64 {
    match count {
        n if n >= 3 => 0.3,
        2 => 0.2,
        1 => 0.1,
        _ => 0.0,
    }
}

/// Period-delimited fragments longer than ten characters once trimmed.
fn qualifying_sentences(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > 10)
}

/// Number of distinct vocabulary terms occurring in already-lowercased text.
fn count_present(lower: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| lower.contains(*t)).count()
}

fn element_coverage<S: AsRef<str>>(lower: &str, elements: &[S]) -> f64 {
    if elements.is_empty() {
        return 0.0;
    }
    let found = elements
        .iter()
        .filter(|e| lower.contains(&e.as_ref().to_lowercase()))
        .count();
    found as f64 / elements.len() as f64
}

/// At least one cased character and no lowercase ones.
fn is_upper(line: &str) -> bool {
    let mut cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReportSection, Scenario};
    use chrono::Utc;

    const NONE: [&str; 0] = [];

    const LIABILITY_TEXT: &str = "The plaintiff asserts liability for negligence and breach of duty. \
        Causation is contested, and the claim rests on evidence of infringement by the defendant. \
        The standard of care and proximate cause determine damages. \
        Based on the record, and because the filings are detailed, the analysis shows liability is likely. \
        The evidence suggests a strong position given that precedent supports it. \
        Claims have a high probability of success.";

    fn well_formed() -> String {
        "LIABILITY OVERVIEW\n\n\
         First, the plaintiff has a strong claim of infringement. The evidence indicates deliberate copying of the protocol. \
         Therefore, liability is likely because the defendant had notice.\n\n\
         Second, causation is supported by internal emails. Furthermore, the standard of care was not met. \
         Moreover, precedent from the Federal Circuit favors the plaintiff in comparable disputes.\n\n\
         - Claims: three independent claims are asserted against the product line\n\
         - Probability: we estimate a 65 percent probability of prevailing at trial\n\n\
         In conclusion, based on the evidence the defendant faces substantial exposure. \
         Overall the position is strong, and damages are likely to be significant in this matter."
            .to_string()
    }

    #[test]
    fn empty_content_scores_zero_everywhere() {
        let scorer = QualityScorer::default();
        for elements in [vec![], vec!["claims", "evidence"]] {
            let q = scorer.score("", "liability_assessment", &elements);
            assert_eq!(q.coherence, 0.0);
            assert_eq!(q.groundedness, 0.0);
            assert_eq!(q.completeness, 0.0);
            assert_eq!(q.structure, 0.0);
            assert_eq!(q.overall, 0.0);
        }
    }

    #[test]
    fn feedback_hints_ignore_pass_threshold() {
        let elements = ["claims", "evidence", "causation"];
        let text = well_formed();
        let default = QualityScorer::default().score(&text, "liability_assessment", &elements);
        let strict = QualityScorer::new(0.99).score(&text, "liability_assessment", &elements);
        let lenient = QualityScorer::new(0.1).score(&text, "liability_assessment", &elements);
        assert_eq!(strict.feedback, default.feedback);
        assert_eq!(lenient.feedback, default.feedback);

        let weak = QualityScorer::new(0.1).score("Short.", "liability_assessment", &elements);
        assert!(weak.feedback.contains(&"Improve logical flow and use more transition phrases".to_string()));
        assert!(weak.feedback.contains(&"Improve paragraph structure and organization".to_string()));
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let scorer = QualityScorer::default();
        let long = well_formed().repeat(20);
        let samples = [
            "",
            "   \n\n  ",
            ".",
            "ALL CAPS HEADING",
            "- - - * * * 1. 2. 3.",
            LIABILITY_TEXT,
            long.as_str(),
            "therefore however furthermore moreover consequently additionally nevertheless thus hence",
        ];
        for content in samples {
            for section in ["liability_assessment", "risk_assessment", "unknown_section"] {
                let q = scorer.score(content, section, &["risk", "impact"]);
                for v in [q.overall, q.coherence, q.groundedness, q.completeness, q.structure] {
                    assert!((0.0..=1.0).contains(&v), "{v} out of range for {content:?}");
                }
            }
        }
    }

    #[test]
    fn liability_groundedness_clamps_to_one() {
        let g = groundedness_score(
            LIABILITY_TEXT,
            "liability_assessment",
            &["claims", "evidence", "probability", "precedent"],
        );
        assert_eq!(g, 1.0);
    }

    #[test]
    fn keyword_coverage_is_capped_at_point_four() {
        // Every liability keyword, no reasoning phrases, no expected elements.
        let text = "liability negligence breach duty causation claim evidence plaintiff \
                    defendant infringement standard of care proximate cause damages";
        let g = groundedness_score(text, "liability_assessment", &NONE);
        assert!((g - 0.4).abs() < 1e-9);
    }

    #[test]
    fn competitive_keywords_scale_over_ten_terms() {
        let text = "competitors market share positioning competitive industry";
        let g = groundedness_score(text, "competitive_landscape", &NONE);
        assert!((g - 0.3).abs() < 1e-9);
        assert_eq!(SectionType::CompetitiveLandscape.keywords().len(), 10);
    }

    #[test]
    fn unknown_section_uses_fallback_keywords() {
        let g = groundedness_score("analysis assessment conclusion", "appeal_outlook", &NONE);
        assert!((g - 0.4).abs() < 1e-9);
        let g = groundedness_score("an analysis only", "appeal_outlook", &NONE);
        assert!((g - 0.2).abs() < 1e-9);
    }

    #[test]
    fn reasoning_tiers() {
        let g = |t: &str| groundedness_score(t, "appeal_outlook", &NONE);
        assert!((g("because") - 0.1).abs() < 1e-9);
        assert!((g("because due to") - 0.2).abs() < 1e-9);
        assert!((g("because due to indicates") - 0.3).abs() < 1e-9);
        assert!((g("because due to indicates demonstrates") - 0.35).abs() < 1e-9);
    }

    #[test]
    fn adding_third_paragraph_never_lowers_coherence() {
        let two = "The first sentence is long enough. The second sentence is also fine.\n\n\
                   Another paragraph with a sentence. And one more sentence here.";
        let three = "The first sentence is long enough.\n\nThe second sentence is also fine.\n\n\
                     Another paragraph with a sentence. And one more sentence here.";
        assert_eq!(paragraph_count(two), 2);
        assert_eq!(paragraph_count(three), 3);
        assert!(coherence_score(three) >= coherence_score(two));
        assert!((coherence_score(three) - coherence_score(two) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn coherence_components() {
        // One paragraph, three connectors, two markers, three sentences.
        let text = "First, the claim is strong. Second, however, damages are unclear. \
                    Therefore and thus the case should settle promptly.";
        let c = coherence_score(text);
        assert!((c - (0.1 + 0.2 + 0.2 + 0.1)).abs() < 1e-9, "got {c}");
    }

    #[test]
    fn completeness_length_gate_without_elements() {
        let words = |n: usize| vec!["word"; n].join(" ");
        assert_eq!(completeness_score(&words(10), &NONE), 0.3);
        assert_eq!(completeness_score(&words(50), &NONE), 0.5);
        assert_eq!(completeness_score(&words(100), &NONE), 0.7);
        assert_eq!(completeness_score(&words(200), &NONE), 1.0);
    }

    #[test]
    fn completeness_blends_coverage_and_length() {
        let mut text = vec!["word"; 98].join(" ");
        text.push_str(" claims evidence");
        let c = completeness_score(&text, &["claims", "evidence", "probability", "precedent"]);
        // 100 words, half the elements: 0.7 * 0.5 + 0.3 * 0.5
        assert!((c - 0.5).abs() < 1e-9, "got {c}");
    }

    #[test]
    fn structure_detects_headings_lists_and_conclusions() {
        assert_eq!(structure_score("# Heading"), 0.1 + 0.1);
        assert_eq!(structure_score("FINDINGS OF FACT"), 0.1 + 0.1);
        let s = structure_score("Plain text with a - dash");
        assert!((s - 0.3).abs() < 1e-9);
        let s = structure_score("In summary the matter is simple");
        assert!((s - 0.3).abs() < 1e-9);
    }

    #[test]
    fn structure_rewards_sentence_variety() {
        let varied = "This one has five words. This sentence has exactly six words. \
                      Here is a sentence that contains eight words";
        let flat = "Four words right here. Four words right there. Four words once more";
        assert!((structure_score(varied) - structure_score(flat) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn feedback_names_weak_dimensions() {
        let scorer = QualityScorer::default();
        let q = scorer.score("Short text.", "risk_assessment", &["risks", "impact"]);
        assert_eq!(q.feedback.len(), 4);
        assert_eq!(q.feedback[0], "Improve logical flow and use more transition phrases");
        assert_eq!(q.feedback[1], "Include more risk_assessment-specific terminology and evidence");
        assert_eq!(q.feedback[2], "Address all expected elements: risks, impact");
        assert_eq!(q.feedback[3], "Improve paragraph structure and organization");
    }

    #[test]
    fn well_formed_section_passes_gate() {
        let scorer = QualityScorer::default();
        let q = scorer.score(
            &well_formed(),
            "liability_assessment",
            SectionType::LiabilityAssessment.expected_elements(),
        );
        assert!(q.coherence >= 0.9, "coherence {}", q.coherence);
        assert!(scorer.passes(&q), "overall {}", q.overall);
    }

    #[test]
    fn overall_is_weighted_sum() {
        let scorer = QualityScorer::default();
        let q = scorer.score(&well_formed(), "liability_assessment", &["claims"]);
        let expected = 0.3 * q.coherence + 0.3 * q.groundedness + 0.25 * q.completeness + 0.15 * q.structure;
        assert!((q.overall - expected).abs() < 1e-12);
    }

    fn report_with(contents: &[(&str, &str)]) -> AnalysisReport {
        let sections = contents
            .iter()
            .map(|(ty, content)| ReportSection {
                section_type: ty.to_string(),
                title: ty.replace('_', " "),
                content: content.to_string(),
                agent_type: "litigation_expert".into(),
                quality_score: 0.0,
                tokens_used: 0,
                cost: 0.0,
                timestamp: Utc::now(),
                attempts: 1,
            })
            .collect();
        AnalysisReport {
            scenario: Scenario {
                case_name: "Acme v. Widget".into(),
                complaint_text: String::new(),
                case_type: "IP".into(),
                filing_date: "2024-01-01".into(),
                parties_involved: vec![],
                key_issues: vec![],
                urgency_level: "standard".into(),
                additional_context: None,
            },
            sections,
            executive_summary: String::new(),
            total_cost: 0.0,
            total_tokens: 0,
            processing_time: 0.0,
            confidence_score: 0.0,
            timestamp: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn validate_report_flags_weak_sections() {
        let scorer = QualityScorer::default();
        let report = report_with(&[
            ("liability_assessment", &well_formed()),
            ("risk_assessment", "Thin."),
        ]);
        let result = scorer.validate_report(&report);
        assert_eq!(result.section_scores.len(), 2);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].starts_with("risk assessment: Score"));
        assert!(result.recommendations.len() <= MAX_RECOMMENDATIONS);
        assert!(!result.recommendations.is_empty());
        let mean = result.section_scores.values().sum::<f64>() / 2.0;
        assert!((result.overall_score - mean).abs() < 1e-12);
        assert_eq!(result.passed, result.overall_score >= 0.7);
    }

    #[test]
    fn validate_empty_report_fails() {
        let result = QualityScorer::default().validate_report(&report_with(&[]));
        assert_eq!(result.overall_score, 0.0);
        assert!(!result.passed);
        assert!(result.section_scores.is_empty());
    }

    #[test]
    fn recommendations_are_capped_at_five() {
        let scorer = QualityScorer::default();
        let report = report_with(&[
            ("liability_assessment", "a"),
            ("damage_calculation", "b"),
            ("custom_section", "c"),
        ]);
        let result = scorer.validate_report(&report);
        assert_eq!(result.issues.len(), 3);
        assert_eq!(result.recommendations.len(), MAX_RECOMMENDATIONS);
    }
}
