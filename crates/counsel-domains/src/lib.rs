pub mod legal;

pub use legal::intake::{build_scenario, AnalysisRequest};
pub use legal::{agent_profiles, persona_library, validate_persona, AgentProfile, PersonaCheck};
