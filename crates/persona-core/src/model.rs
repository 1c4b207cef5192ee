use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Five-factor personality profile. Immutable value object; trait scores
/// are on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OceanProfile {
    pub openness: u8,
    pub conscientiousness: u8,
    pub extraversion: u8,
    pub agreeableness: u8,
    pub neuroticism: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl OceanProfile {
    pub fn new(o: u8, c: u8, e: u8, a: u8, n: u8) -> Self {
        Self {
            openness: o,
            conscientiousness: c,
            extraversion: e,
            agreeableness: a,
            neuroticism: n,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for OceanProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "O:{} C:{} E:{} A:{} N:{}",
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pending,
    Retry,
    Locked,
    Running,
    Complete,
    Failed,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pending => "pending",
            TestStatus::Retry => "retry",
            TestStatus::Locked => "locked",
            TestStatus::Running => "running",
            TestStatus::Complete => "complete",
            TestStatus::Failed => "failed",
            TestStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => TestStatus::Pending,
            "retry" => TestStatus::Retry,
            "locked" => TestStatus::Locked,
            "running" => TestStatus::Running,
            "complete" => TestStatus::Complete,
            "failed" => TestStatus::Failed,
            _ => TestStatus::Error,
        }
    }

    /// Terminal rows are never re-claimed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TestStatus::Complete | TestStatus::Failed)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schedulable unit of work: provider x instrument x input-system x
/// personality profile.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub id: i64,
    pub experiment_id: i64,
    pub provider: String,
    pub instrument: String,
    pub input_system: String,
    pub profile: OceanProfile,
    pub status: TestStatus,
    pub attempts: u32,
    pub worker_id: Option<String>,
    pub locked_at: Option<String>,
}

/// One answered question within a test case. Append-only; owned by the
/// test case that produced it.
#[derive(Debug, Clone)]
pub struct Response {
    pub test_case_id: i64,
    pub question_number: u32,
    pub question_text: String,
    pub factor: String,
    pub is_reversed: bool,
    pub raw_response: String,
    pub parsed_score: u8,
    pub score_after_reverse: u8,
    pub response_time_ms: Option<u64>,
    /// Longitudinal mode only: 1-based position in the conversation.
    pub sequence_position: Option<u32>,
    /// Longitudinal mode only: accumulated prompt tokens for this call.
    pub context_tokens: Option<u64>,
}

/// Aggregate outcome of a completed test case. Written exactly once, in the
/// same transaction as the completion status flip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test_case_id: i64,
    pub total_score: f64,
    pub factor_scores: BTreeMap<String, f64>,
    pub questions_answered: u32,
    pub questions_total: u32,
    pub duration_ms: u64,
}

/// Transient value returned by a provider call. Mapped into Response /
/// ResultRecord by the runner, never persisted directly.
#[derive(Debug, Clone, Default)]
pub struct CompletionResult {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What `create` turns into an experiment row plus its Cartesian-product
/// job set.
#[derive(Debug, Clone)]
pub struct ExperimentSpec {
    pub name: String,
    pub description: String,
    pub profile_set: String,
    pub input_systems: Vec<String>,
    pub instruments: Vec<String>,
    pub providers: Vec<String>,
    pub is_longitudinal: bool,
}

impl ExperimentSpec {
    pub fn total_test_cases(&self, profile_count: usize) -> usize {
        self.input_systems.len() * self.instruments.len() * self.providers.len() * profile_count
    }
}

/// Aggregate progress for one experiment.
#[derive(Debug, Clone)]
pub struct ExperimentStatus {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub experiment_number: i64,
    pub is_longitudinal: bool,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub counts: StatusCounts,
}

/// Per-status test case counts, as surfaced by the `status` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: u64,
    pub complete: u64,
    pub failed: u64,
    pub pending: u64,
    pub running: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            TestStatus::Pending,
            TestStatus::Retry,
            TestStatus::Locked,
            TestStatus::Running,
            TestStatus::Complete,
            TestStatus::Failed,
            TestStatus::Error,
        ] {
            assert_eq!(TestStatus::parse(s.as_str()), s);
        }
        assert_eq!(TestStatus::parse("garbage"), TestStatus::Error);
    }

    #[test]
    fn profile_display_is_compact() {
        let p = OceanProfile::new(75, 25, 50, 0, 100);
        assert_eq!(p.to_string(), "O:75 C:25 E:50 A:0 N:100");
    }

    #[test]
    fn terminal_states() {
        assert!(TestStatus::Complete.is_terminal());
        assert!(TestStatus::Failed.is_terminal());
        assert!(!TestStatus::Retry.is_terminal());
        assert!(!TestStatus::Locked.is_terminal());
    }
}
