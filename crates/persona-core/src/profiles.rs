use crate::errors::ConfigError;
use crate::model::OceanProfile;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named collection of personality profiles, loaded from YAML at
/// experiment-creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSet {
    pub name: String,
    pub profiles: Vec<OceanProfile>,
}

pub fn load_profile_set(path: &Path) -> Result<ProfileSet, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read profile set {}: {}", path.display(), e)))?;

    let set: ProfileSet = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse profile set YAML: {e}")))?;

    if set.profiles.is_empty() {
        return Err(ConfigError(format!(
            "profile set '{}' has no profiles",
            set.name
        )));
    }
    for (i, p) in set.profiles.iter().enumerate() {
        for (trait_name, value) in [
            ("openness", p.openness),
            ("conscientiousness", p.conscientiousness),
            ("extraversion", p.extraversion),
            ("agreeableness", p.agreeableness),
            ("neuroticism", p.neuroticism),
        ] {
            if value > 100 {
                return Err(ConfigError(format!(
                    "profile {} has {} = {} (scores are 0-100)",
                    i, trait_name, value
                )));
            }
        }
    }
    Ok(set)
}

pub fn write_sample_profile_set(path: &Path) -> Result<(), ConfigError> {
    let sample = ProfileSet {
        name: "sample_extremes".to_string(),
        profiles: vec![
            OceanProfile::new(50, 50, 50, 50, 50).with_label("baseline"),
            OceanProfile::new(90, 10, 90, 10, 90).with_label("volatile_explorer"),
            OceanProfile::new(10, 90, 10, 90, 10).with_label("steady_cooperator"),
        ],
    };
    let yaml = serde_yaml::to_string(&sample)
        .map_err(|e| ConfigError(format!("failed to serialize sample profiles: {e}")))?;
    std::fs::write(path, yaml)
        .map_err(|e| ConfigError(format!("failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.yaml");
        write_sample_profile_set(&path).unwrap();
        let set = load_profile_set(&path).unwrap();
        assert_eq!(set.name, "sample_extremes");
        assert_eq!(set.profiles.len(), 3);
        assert_eq!(set.profiles[0].label.as_deref(), Some("baseline"));
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "name: bad\nprofiles:\n  - openness: 120\n    conscientiousness: 50\n    extraversion: 50\n    agreeableness: 50\n    neuroticism: 50\n",
        )
        .unwrap();
        assert!(load_profile_set(&path).is_err());
    }

    #[test]
    fn empty_sets_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "name: empty\nprofiles: []\n").unwrap();
        assert!(load_profile_set(&path).is_err());
    }
}
