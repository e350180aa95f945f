use std::str::FromStr;

use crate::types::{ReportSection, Scenario, SectionType};

/// Sections of earlier context included in each prompt.
pub const CONTEXT_SECTIONS: usize = 2;
/// Characters of each earlier section carried forward as context.
pub const CONTEXT_CHARS: usize = 500;
/// Characters of the complaint included in the case details.
pub const COMPLAINT_CHARS: usize = 1500;

const REASONING_INSTRUCTIONS: &str = "
REASONING INSTRUCTIONS:
You must use step-by-step reasoning to analyze this legal case. Structure your analysis as follows:
1. First, identify the key legal issues
2. Second, analyze the relevant facts
3. Third, apply legal principles
4. Finally, provide your conclusions

Think through each step carefully before moving to the next.
";

const GENERIC_INSTRUCTION: &str = "Provide comprehensive analysis for this section.";

/// Build the generation prompt for one section.
///
/// Composes the persona, the chain-of-thought block, context from the last
/// two accepted sections, the case details and the section instruction.
/// Pure: identical inputs always produce a byte-identical prompt.
pub fn compile_prompt(
    persona: &str,
    section_type: &str,
    scenario: &Scenario,
    previous_sections: &[ReportSection],
) -> String {
    let mut s = String::new();

    s.push_str(persona);
    s.push_str("\n\n");
    s.push_str(REASONING_INSTRUCTIONS);

    if !previous_sections.is_empty() {
        s.push_str("\n\nPREVIOUS ANALYSIS:\n");
        let skip = previous_sections.len().saturating_sub(CONTEXT_SECTIONS);
        for section in &previous_sections[skip..] {
            s.push_str(&format!(
                "\n{}:\n{}...\n",
                section.title,
                truncate_chars(&section.content, CONTEXT_CHARS)
            ));
        }
    }

    s.push_str(&format!(
        "\n\nTASK: Provide a {} for the following legal case:\n\n",
        section_type.replace('_', " ")
    ));
    s.push_str(&format!("Case Name: {}\n", scenario.case_name));
    s.push_str(&format!("Case Type: {}\n", scenario.case_type));
    s.push_str(&format!("Key Issues: {}\n", scenario.key_issues.join(", ")));
    s.push_str(&format!("Urgency: {}\n\n", scenario.urgency_level));
    s.push_str(&format!(
        "Complaint Summary:\n{}\n\n",
        truncate_chars(&scenario.complaint_text, COMPLAINT_CHARS)
    ));

    s.push_str(section_instruction(section_type));

    s
}

/// Prompt for the single quality-driven regeneration: the original prompt
/// plus the scorer's feedback as an explicit list of gaps.
pub fn compile_regeneration_prompt(
    persona: &str,
    section_type: &str,
    scenario: &Scenario,
    previous_sections: &[ReportSection],
    feedback: &[String],
) -> String {
    let mut s = compile_prompt(persona, section_type, scenario, previous_sections);
    s.push_str("\n\nQUALITY REVIEW:\nA previous draft of this section did not meet the quality bar. ");
    s.push_str("Address these gaps: ");
    s.push_str(&feedback.join("; "));
    s.push('\n');
    s
}

fn section_instruction(section_type: &str) -> &'static str {
    SectionType::from_str(section_type)
        .map(|t| t.instruction())
        .unwrap_or(GENERIC_INSTRUCTION)
}

/// Longest prefix of `s` holding at most `max` characters.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
