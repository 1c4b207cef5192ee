//! Generalized Anxiety Disorder 7-item (GAD-7).
//!
//! Reference: Spitzer, Kroenke, Williams & Löwe (2006).

use super::{Instrument, InstrumentScores, Question};
use std::collections::BTreeMap;

pub struct Gad7;

impl Instrument for Gad7 {
    fn name(&self) -> &'static str {
        "gad7"
    }

    fn full_name(&self) -> &'static str {
        "Generalized Anxiety Disorder 7-item (GAD-7)"
    }

    fn scale_instructions(&self) -> &'static str {
        "rate how often you have been bothered by this over the past 2 weeks:\n\
         1 = Not at all\n\
         2 = Several days\n\
         3 = More than half the days\n\
         4 = Nearly every day\n\
         5 = Every day"
    }

    fn questions(&self) -> Vec<Question> {
        vec![
            Question::new(1, "Feeling nervous, anxious, or on edge", "anxiety"),
            Question::new(2, "Not being able to stop or control worrying", "anxiety"),
            Question::new(3, "Worrying too much about different things", "anxiety"),
            Question::new(4, "Trouble relaxing", "anxiety"),
            Question::new(5, "Being so restless that it is hard to sit still", "anxiety"),
            Question::new(6, "Becoming easily annoyed or irritable", "anxiety"),
            Question::new(7, "Feeling afraid as if something awful might happen", "anxiety"),
        ]
    }

    /// Standard GAD-7 severity cut points (raw 5/10/15), expressed on the
    /// normalized 0-100 scale.
    fn interpretation(&self, total_score: f64) -> Option<&'static str> {
        Some(if total_score < 23.8 {
            "minimal"
        } else if total_score < 47.6 {
            "mild"
        } else if total_score < 71.4 {
            "moderate"
        } else {
            "severe"
        })
    }

    fn score(&self, responses: &BTreeMap<u32, u8>) -> InstrumentScores {
        // Standard GAD-7 uses a 0-3 scale; our 1-5 ratings map 1->0 .. 4->3
        // with 5 collapsed onto 3. Raw max is 21, normalized to 0-100.
        let mut total_raw: u32 = 0;
        let mut answered: u32 = 0;

        for &response in responses.values() {
            total_raw += (response.saturating_sub(1)).min(3) as u32;
            answered += 1;
        }

        let total_score = if answered > 0 {
            total_raw as f64 / 21.0 * 100.0
        } else {
            0.0
        };

        InstrumentScores {
            instrument: self.name().to_string(),
            total_score,
            factor_scores: BTreeMap::from([("anxiety".to_string(), total_score)]),
            questions_answered: answered,
            questions_total: self.question_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_collapses_onto_four() {
        let instrument = Gad7;
        let all_fours: BTreeMap<u32, u8> = (1..=7).map(|n| (n, 4)).collect();
        let all_fives: BTreeMap<u32, u8> = (1..=7).map(|n| (n, 5)).collect();
        assert_eq!(
            instrument.score(&all_fours).total_score,
            instrument.score(&all_fives).total_score
        );
        assert_eq!(instrument.score(&all_fives).total_score, 100.0);
    }

    #[test]
    fn minimal_anxiety_scores_zero() {
        let all_ones: BTreeMap<u32, u8> = (1..=7).map(|n| (n, 1)).collect();
        let result = Gad7.score(&all_ones);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.questions_answered, 7);
    }

    #[test]
    fn severity_bands_match_raw_cut_points() {
        let instrument = Gad7;
        // raw 4 -> 19.0, raw 5 -> 23.8: the minimal/mild boundary
        assert_eq!(instrument.interpretation(4.0 / 21.0 * 100.0), Some("minimal"));
        assert_eq!(instrument.interpretation(5.0 / 21.0 * 100.0), Some("mild"));
        assert_eq!(instrument.interpretation(10.0 / 21.0 * 100.0), Some("moderate"));
        assert_eq!(instrument.interpretation(15.0 / 21.0 * 100.0), Some("severe"));
        assert_eq!(instrument.interpretation(100.0), Some("severe"));
    }

    #[test]
    fn empty_map_is_well_defined() {
        let result = Gad7.score(&BTreeMap::new());
        assert_eq!(result.questions_answered, 0);
        assert_eq!(result.total_score, 0.0);
    }
}
