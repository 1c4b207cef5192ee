use crate::errors::ConfigError;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod gad7;
pub mod levenson;

/// A single instrument question. Order of declaration is part of the
/// experimental design: it determines sequence positions in longitudinal
/// mode.
#[derive(Debug, Clone)]
pub struct Question {
    pub number: u32,
    pub text: String,
    pub factor: String,
    pub is_reversed: bool,
}

impl Question {
    pub fn new(number: u32, text: &str, factor: &str) -> Self {
        Self {
            number,
            text: text.to_string(),
            factor: factor.to_string(),
            is_reversed: false,
        }
    }

    pub fn reversed(number: u32, text: &str, factor: &str) -> Self {
        Self {
            is_reversed: true,
            ..Self::new(number, text, factor)
        }
    }
}

/// Calculated scores from one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentScores {
    pub instrument: String,
    pub total_score: f64,
    pub factor_scores: BTreeMap<String, f64>,
    pub questions_answered: u32,
    pub questions_total: u32,
}

/// A fixed psychometric question set plus its scoring function. Consumed
/// read-only by the runner.
pub trait Instrument: Send + Sync {
    /// Short name matching the job table, e.g. "levenson".
    fn name(&self) -> &'static str;
    fn full_name(&self) -> &'static str;
    fn scale_instructions(&self) -> &'static str;
    /// Fixed, ordered question list.
    fn questions(&self) -> Vec<Question>;
    /// Score a {question number -> raw 1-5 rating} map. Must be total: an
    /// empty map yields a zero-answer result, never an error.
    fn score(&self, responses: &BTreeMap<u32, u8>) -> InstrumentScores;

    fn question_count(&self) -> u32 {
        self.questions().len() as u32
    }

    /// Clinical banding of the 0-100 normalized total, for instruments
    /// that define one.
    fn interpretation(&self, total_score: f64) -> Option<&'static str> {
        let _ = total_score;
        None
    }

    /// Reverse-keyed items flip on the 1-5 scale.
    fn apply_reverse(&self, score: u8, is_reversed: bool) -> u8 {
        if is_reversed {
            6 - score
        } else {
            score
        }
    }
}

pub fn get_instrument(name: &str) -> Result<Arc<dyn Instrument>, ConfigError> {
    match name {
        "levenson" => Ok(Arc::new(levenson::Levenson)),
        "gad7" => Ok(Arc::new(gad7::Gad7)),
        other => Err(ConfigError(format!("unknown instrument: {other}"))),
    }
}

pub fn list_instruments() -> Vec<&'static str> {
    vec!["levenson", "gad7"]
}

/// Factor mean normalized from the 1-5 scale onto 0-100.
pub(crate) fn normalize_mean(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
    (mean - 1.0) / 4.0 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_rejects_unknown_names() {
        assert!(get_instrument("levenson").is_ok());
        assert!(get_instrument("rorschach").is_err());
    }

    #[test]
    fn reverse_scoring_flips_the_scale() {
        let instrument = get_instrument("levenson").unwrap();
        assert_eq!(instrument.apply_reverse(1, true), 5);
        assert_eq!(instrument.apply_reverse(5, true), 1);
        assert_eq!(instrument.apply_reverse(2, false), 2);
    }

    #[test]
    fn normalize_mean_bounds() {
        assert_eq!(normalize_mean(&[]), 0.0);
        assert_eq!(normalize_mean(&[1, 1]), 0.0);
        assert_eq!(normalize_mean(&[5, 5]), 100.0);
        assert_eq!(normalize_mean(&[3]), 50.0);
    }
}
