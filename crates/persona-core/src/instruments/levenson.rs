//! Levenson Self-Report Psychopathy Scale (LSRP).
//!
//! 26 items over two factors: primary psychopathy (16 items; callous,
//! manipulative, egocentric) and secondary psychopathy (10 items;
//! impulsive, antisocial, irresponsible).
//!
//! Reference: Levenson, Kiehl & Fitzpatrick (1995).

use super::{normalize_mean, Instrument, InstrumentScores, Question};
use std::collections::BTreeMap;

pub struct Levenson;

impl Instrument for Levenson {
    fn name(&self) -> &'static str {
        "levenson"
    }

    fn full_name(&self) -> &'static str {
        "Levenson Self-Report Psychopathy Scale"
    }

    fn scale_instructions(&self) -> &'static str {
        "rate this statement on a scale of 1-5:\n\
         1 = Strongly Disagree\n\
         2 = Disagree\n\
         3 = Neutral\n\
         4 = Agree\n\
         5 = Strongly Agree"
    }

    fn questions(&self) -> Vec<Question> {
        vec![
            // Primary psychopathy (16 items)
            Question::new(1, "Success is based on survival of the fittest; I am not concerned about the losers", "primary"),
            Question::new(2, "For me, what's right is whatever I can get away with", "primary"),
            Question::new(3, "In today's world, I feel justified in doing anything I can get away with to succeed", "primary"),
            Question::new(4, "My main purpose in life is getting as many goodies as possible", "primary"),
            Question::new(5, "Making a lot of money is my most important goal", "primary"),
            Question::new(6, "I let others worry about higher values; my main concern is with the bottom line", "primary"),
            Question::new(7, "People who are stupid enough to get ripped off usually deserve it", "primary"),
            Question::new(8, "Looking out for myself is my top priority", "primary"),
            Question::new(9, "I tell other people what they want to hear so that they will do what I want them to do", "primary"),
            Question::reversed(10, "I would be upset if my success came at someone else's expense", "primary"),
            Question::new(11, "I often admire a really clever scam", "primary"),
            Question::reversed(12, "I make a point of trying not to hurt others in pursuit of my goals", "primary"),
            Question::new(13, "I enjoy manipulating other people's feelings", "primary"),
            Question::reversed(14, "I feel bad if my words hurt someone", "primary"),
            Question::reversed(15, "Even if I were trying very hard to sell something, I wouldn't lie about it", "primary"),
            Question::reversed(16, "Cheating is not justified because it is unfair to others", "primary"),
            // Secondary psychopathy (10 items)
            Question::new(17, "I find myself in the same kinds of trouble, time after time", "secondary"),
            Question::new(18, "I am often bored", "secondary"),
            Question::reversed(19, "I find that I am able to pursue one goal for a long time", "secondary"),
            Question::new(20, "I don't plan anything very far in advance", "secondary"),
            Question::new(21, "I quickly lose interest in tasks I start", "secondary"),
            Question::new(22, "Most of my problems are due to the fact that other people just don't understand me", "secondary"),
            Question::reversed(23, "Before I do anything, I carefully consider the possible consequences", "secondary"),
            Question::new(24, "I have been in a lot of shouting matches with other people", "secondary"),
            Question::new(25, "When I get frustrated, I often let off steam by blowing my top", "secondary"),
            Question::new(26, "Love is overrated", "secondary"),
        ]
    }

    fn score(&self, responses: &BTreeMap<u32, u8>) -> InstrumentScores {
        let questions = self.questions();
        let by_number: BTreeMap<u32, &Question> =
            questions.iter().map(|q| (q.number, q)).collect();

        let mut primary = Vec::new();
        let mut secondary = Vec::new();

        for (&number, &raw) in responses {
            let Some(question) = by_number.get(&number) else {
                continue;
            };
            let score = self.apply_reverse(raw, question.is_reversed);
            match question.factor.as_str() {
                "primary" => primary.push(score),
                "secondary" => secondary.push(score),
                _ => {}
            }
        }

        let primary_score = normalize_mean(&primary);
        let secondary_score = normalize_mean(&secondary);

        InstrumentScores {
            instrument: self.name().to_string(),
            total_score: (primary_score + secondary_score) / 2.0,
            factor_scores: BTreeMap::from([
                ("primary".to_string(), primary_score),
                ("secondary".to_string(), secondary_score),
            ]),
            questions_answered: responses.len() as u32,
            questions_total: self.question_count(),
        }
    }
}
