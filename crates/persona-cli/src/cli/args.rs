use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "persona",
    version,
    about = "Personality-programmed psychometric experiments against LLM providers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an experiment and its full test-case matrix
    Create(CreateArgs),
    /// Show aggregate progress, or detail for one experiment
    Status(StatusArgs),
    /// Drain pending test cases with a worker pool
    Run(RunArgs),
    /// One profile, one instrument, no database; sanity-check a provider
    QuickTest(QuickTestArgs),
    /// Write a sample profile-set YAML to get started
    Init(InitArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    /// Required; stored with the experiment for later analysis
    #[arg(long)]
    pub description: String,

    /// Comma-separated provider names (claude, openai, deepseek, gemini, xai, mock)
    #[arg(long, value_delimiter = ',', default_value = "claude")]
    pub providers: Vec<String>,

    /// Comma-separated instrument names (levenson, gad7)
    #[arg(long, value_delimiter = ',', default_value = "levenson")]
    pub instruments: Vec<String>,

    /// Comma-separated input-system names (ocean_direct, narrative)
    #[arg(long, value_delimiter = ',', default_value = "ocean_direct")]
    pub input_systems: Vec<String>,

    /// Profile-set YAML file
    #[arg(long, default_value = "profiles.yaml")]
    pub profiles: PathBuf,

    /// Mark the experiment longitudinal (conversation state kept per test case)
    #[arg(long)]
    pub longitudinal: bool,

    #[arg(long, default_value = "persona.db")]
    pub db: PathBuf,
}

#[derive(Parser, Clone)]
pub struct StatusArgs {
    /// Experiment id; omit for database-wide counts
    pub experiment: Option<i64>,

    #[arg(long, default_value = "persona.db")]
    pub db: PathBuf,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// Restrict to one experiment
    #[arg(long)]
    pub experiment: Option<i64>,

    /// Stop after at most N test cases
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Keep conversation history within each test case
    #[arg(long)]
    pub longitudinal: bool,

    #[arg(long, default_value = "persona.db")]
    pub db: PathBuf,
}

#[derive(Parser, Clone)]
pub struct QuickTestArgs {
    #[arg(long, default_value = "claude")]
    pub provider: String,

    #[arg(long)]
    pub longitudinal: bool,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "profiles.yaml")]
    pub profiles: PathBuf,
}
