//! Narrative input system: translates OCEAN scores into prose describing
//! the person. Tests whether prose vs numbers affects reliability.

use super::InputSystem;
use crate::model::OceanProfile;

pub struct Narrative;

impl InputSystem for Narrative {
    fn name(&self) -> &'static str {
        "narrative"
    }

    fn preamble(&self, profile: &OceanProfile) -> String {
        let descriptions = [
            describe_openness(profile.openness),
            describe_conscientiousness(profile.conscientiousness),
            describe_extraversion(profile.extraversion),
            describe_agreeableness(profile.agreeableness),
            describe_neuroticism(profile.neuroticism),
        ];
        format!(
            "You are a person with the following personality:\n\n{}\n\n\
             Based on this personality, rate the following statement.",
            descriptions.join(" ")
        )
    }
}

fn describe_openness(score: u8) -> &'static str {
    match score {
        0..=20 => "You are practical and conventional, preferring familiar routines over new experiences. You have little interest in abstract ideas or artistic pursuits.",
        21..=40 => "You tend toward the practical and traditional, though you occasionally appreciate new ideas. You prefer concrete thinking to abstract speculation.",
        41..=60 => "You balance practicality with curiosity. You can appreciate both traditional approaches and new ideas when they seem useful.",
        61..=80 => "You are curious and open to new experiences. You enjoy exploring ideas, art, and unconventional perspectives.",
        _ => "You are highly imaginative and intellectually curious. You actively seek out new experiences, novel ideas, and creative expression. Abstract thinking comes naturally to you.",
    }
}

fn describe_conscientiousness(score: u8) -> &'static str {
    match score {
        0..=20 => "You are spontaneous and flexible, often acting on impulse rather than planning. Schedules and organization feel constraining to you.",
        21..=40 => "You prefer keeping your options open over detailed plans. You get things done, though rarely in an orderly way.",
        41..=60 => "You balance structure with flexibility. You can follow plans when they matter but do not need everything organized.",
        61..=80 => "You are organized and dependable. You set goals, make plans, and follow through on your commitments.",
        _ => "You are extremely disciplined and methodical. You plan carefully, keep everything in order, and hold yourself to high standards of reliability.",
    }
}

fn describe_extraversion(score: u8) -> &'static str {
    match score {
        0..=20 => "You are deeply private and reserved, strongly preferring solitude. Social interaction drains you and you avoid being the center of attention.",
        21..=40 => "You are quiet and prefer small groups or time alone. You speak up when you have something to say but rarely seek out social energy.",
        41..=60 => "You enjoy company in moderation. You are comfortable in groups but equally content on your own.",
        61..=80 => "You are outgoing and energetic around others. You enjoy conversation and tend to seek out social settings.",
        _ => "You are highly sociable and assertive. Being around people energizes you, and you naturally take the lead in group settings.",
    }
}

fn describe_agreeableness(score: u8) -> &'static str {
    match score {
        0..=20 => "You are skeptical of others' motives and put your own interests first. You are blunt, competitive, and untroubled by conflict.",
        21..=40 => "You are guarded with trust and willing to push back hard when you disagree. Cooperation has to earn its keep.",
        41..=60 => "You balance cooperation with self-interest. You get along with most people but will stand your ground when it matters.",
        61..=80 => "You are warm and considerate. You trust others, avoid unnecessary conflict, and enjoy helping people.",
        _ => "You are deeply compassionate and trusting. You put others' needs ahead of your own and go out of your way to avoid hurting anyone.",
    }
}

fn describe_neuroticism(score: u8) -> &'static str {
    match score {
        0..=20 => "You are exceptionally calm and emotionally stable. Stress rarely touches you, and you recover quickly from setbacks.",
        21..=40 => "You are generally relaxed and even-tempered, with only occasional worry under real pressure.",
        41..=60 => "You experience a normal range of emotions. You feel stress in difficult situations but manage it reasonably well.",
        61..=80 => "You are prone to worry and self-doubt. Stressful situations affect you strongly and linger in your thoughts.",
        _ => "You are highly sensitive to stress and frequently anxious. Your moods shift easily, and small problems can feel overwhelming.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_the_full_range() {
        for score in [0u8, 20, 21, 40, 41, 60, 61, 80, 81, 100] {
            let profile = OceanProfile::new(score, score, score, score, score);
            let text = Narrative.preamble(&profile);
            assert!(text.starts_with("You are a person"));
            assert!(text.contains("rate the following statement"));
        }
    }

    #[test]
    fn extremes_read_differently() {
        let low = Narrative.preamble(&OceanProfile::new(0, 0, 0, 0, 0));
        let high = Narrative.preamble(&OceanProfile::new(100, 100, 100, 100, 100));
        assert_ne!(low, high);
        assert!(low.contains("practical and conventional"));
        assert!(high.contains("highly imaginative"));
    }
}
