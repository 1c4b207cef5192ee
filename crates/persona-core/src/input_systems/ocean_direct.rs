//! Baseline input system: explicit numeric trait scores. Clear,
//! unambiguous, easily reproducible.

use super::InputSystem;
use crate::model::OceanProfile;

pub struct OceanDirect;

impl InputSystem for OceanDirect {
    fn name(&self) -> &'static str {
        "ocean_direct"
    }

    fn preamble(&self, profile: &OceanProfile) -> String {
        format!(
            "You have the following personality traits on a scale of 0-100:\n\
             \n\
             - Openness: {}/100\n\
             - Conscientiousness: {}/100\n\
             - Extraversion: {}/100\n\
             - Agreeableness: {}/100\n\
             - Neuroticism: {}/100\n\
             \n\
             Based on these personality traits, rate the following statement.",
            profile.openness,
            profile.conscientiousness,
            profile.extraversion,
            profile.agreeableness,
            profile.neuroticism
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_carries_all_five_scores() {
        let text = OceanDirect.preamble(&OceanProfile::new(75, 25, 50, 0, 100));
        assert!(text.contains("Openness: 75/100"));
        assert!(text.contains("Agreeableness: 0/100"));
        assert!(text.contains("Neuroticism: 100/100"));
    }
}
