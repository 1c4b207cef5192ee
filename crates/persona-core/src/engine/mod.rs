pub mod conversation;
pub mod runner;

pub use conversation::ConversationState;
pub use runner::{DrainOptions, ExperimentRunner, RunSummary, RunnerConfig};
