//! Heuristic extraction of case metadata from a submitted complaint.
//!
//! These are keyword scans, not entity recognition: they exist to give the
//! prompt a usable issue list and party names when the caller supplies none.

use chrono::Utc;
use counsel_core::Scenario;
use serde::Deserialize;

/// Lines of the complaint scanned for party names.
const PARTY_SCAN_LINES: usize = 10;

const IP_TERMS: [&str; 5] = ["patent", "trademark", "copyright", "trade secret", "infringement"];
const CONTRACT_TERMS: [&str; 4] = ["breach", "performance", "termination", "damages"];

/// Body of an analysis request.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub case_name: String,
    pub complaint_text: String,
    pub case_type: String,
    #[serde(default = "default_urgency")]
    pub urgency: String,
    #[serde(default)]
    pub additional_context: Option<String>,
}

fn default_urgency() -> String {
    "standard".into()
}

/// Assemble the immutable scenario for one request, stamped with the
/// current time as filing date.
pub fn build_scenario(request: AnalysisRequest) -> Scenario {
    let parties_involved = extract_parties(&request.complaint_text);
    let key_issues = extract_key_issues(&request.complaint_text, &request.case_type);
    Scenario {
        case_name: request.case_name,
        complaint_text: request.complaint_text,
        case_type: request.case_type,
        filing_date: Utc::now().to_rfc3339(),
        parties_involved,
        key_issues,
        urgency_level: request.urgency,
        additional_context: request.additional_context,
    }
}

/// The word immediately before each standalone "plaintiff"/"defendant" in
/// the first ten lines.
pub fn extract_parties(complaint: &str) -> Vec<String> {
    let mut parties = Vec::new();
    for line in complaint.lines().take(PARTY_SCAN_LINES) {
        let lower = line.to_lowercase();
        if !lower.contains("plaintiff") && !lower.contains("defendant") {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        for pair in words.windows(2) {
            let role = pair[1].to_lowercase();
            if role == "plaintiff" || role == "defendant" {
                parties.push(pair[0].to_string());
            }
        }
    }
    if parties.is_empty() {
        return vec!["Party A".into(), "Party B".into()];
    }
    parties
}

pub fn extract_key_issues(complaint: &str, case_type: &str) -> Vec<String> {
    let lower = complaint.to_lowercase();
    let case_lower = case_type.to_lowercase();

    let issues: Vec<String> = if case_type.contains("IP") || case_lower.contains("intellectual") {
        IP_TERMS
            .iter()
            .filter(|t| lower.contains(*t))
            .map(|t| format!("{} dispute", title_case(t)))
            .collect()
    } else if case_lower.contains("contract") {
        CONTRACT_TERMS
            .iter()
            .filter(|t| lower.contains(*t))
            .map(|t| format!("Contract {t}"))
            .collect()
    } else {
        Vec::new()
    };

    if issues.is_empty() {
        return vec![
            "Primary legal dispute".into(),
            "Damages assessment".into(),
            "Remedy determination".into(),
        ];
    }
    issues
}

pub fn extract_capabilities(persona: &str) -> Vec<String> {
    let lower = persona.to_lowercase();
    let found: Vec<String> = [
        ("quantitative", "Quantitative analysis"),
        ("strategic", "Strategic planning"),
        ("competitive", "Competitive intelligence"),
        ("risk", "Risk assessment"),
        ("financial", "Financial modeling"),
    ]
    .into_iter()
    .filter(|(needle, _)| lower.contains(needle))
    .map(|(_, label)| label.to_string())
    .collect();

    if found.is_empty() {
        return vec!["Analysis".into(), "Assessment".into(), "Recommendations".into()];
    }
    found
}

/// Framework acronyms are matched case-sensitively.
pub fn extract_focus_areas(persona: &str) -> Vec<String> {
    let lower = persona.to_lowercase();
    let mut found = Vec::new();
    if persona.contains("TAM") || lower.contains("market size") {
        found.push("Market sizing".to_string());
    }
    if persona.contains("Porter") {
        found.push("Industry analysis".to_string());
    }
    if persona.contains("SWOT") {
        found.push("Strategic positioning".to_string());
    }
    if persona.contains("ROI") || persona.contains("NPV") {
        found.push("Financial evaluation".to_string());
    }

    if found.is_empty() {
        return vec!["Business analysis".into(), "Strategic insights".into()];
    }
    found
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
