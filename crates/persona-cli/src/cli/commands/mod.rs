use super::args::{Cli, Command, InitArgs};
use std::collections::HashMap;

pub mod create;
pub mod quick_test;
pub mod run;
pub mod status;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Create(args) => create::run(args),
        Command::Status(args) => status::run(args),
        Command::Run(args) => run::run(args).await,
        Command::QuickTest(args) => quick_test::run(args).await,
        Command::Init(args) => cmd_init(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if args.profiles.exists() {
        println!("{} already exists, leaving it alone", args.profiles.display());
        return Ok(exit_codes::OK);
    }
    persona_core::profiles::write_sample_profile_set(&args.profiles)?;
    println!("wrote sample profile set to {}", args.profiles.display());
    Ok(exit_codes::OK)
}

/// provider name -> env var holding its API key.
const KEY_ENV_VARS: &[(&str, &str)] = &[
    ("claude", "ANTHROPIC_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("deepseek", "DEEPSEEK_API_KEY"),
    ("gemini", "GEMINI_API_KEY"),
    ("xai", "XAI_API_KEY"),
];

pub fn api_keys_from_env() -> HashMap<String, String> {
    KEY_ENV_VARS
        .iter()
        .filter_map(|(provider, var)| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| (provider.to_string(), v))
        })
        .collect()
}
