use crate::errors::ConfigError;
use crate::model::OceanProfile;
use std::sync::Arc;

pub mod narrative;
pub mod ocean_direct;

/// Strategy for encoding a personality profile into prompt text. Same OCEAN
/// profile, different representation.
pub trait InputSystem: Send + Sync {
    /// Identifier matching the job table, e.g. "ocean_direct".
    fn name(&self) -> &'static str;

    /// Personality programming text, prepended (via the system prompt) to
    /// every question in a job.
    fn preamble(&self, profile: &OceanProfile) -> String;
}

pub fn get_input_system(name: &str) -> Result<Arc<dyn InputSystem>, ConfigError> {
    match name {
        "ocean_direct" => Ok(Arc::new(ocean_direct::OceanDirect)),
        "narrative" => Ok(Arc::new(narrative::Narrative)),
        other => Err(ConfigError(format!("unknown input system: {other}"))),
    }
}

pub fn list_input_systems() -> Vec<&'static str> {
    vec!["ocean_direct", "narrative"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_rejects_unknown_names() {
        assert!(get_input_system("ocean_direct").is_ok());
        assert!(get_input_system("tarot").is_err());
    }
}
