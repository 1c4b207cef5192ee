use crate::cli::args::QuickTestArgs;
use crate::cli::commands::{api_keys_from_env, exit_codes};
use persona_core::engine::runner::quick_test;
use persona_core::engine::RunnerConfig;

pub async fn run(args: QuickTestArgs) -> anyhow::Result<i32> {
    let config = RunnerConfig {
        api_keys: api_keys_from_env(),
        longitudinal: args.longitudinal,
        ..RunnerConfig::default()
    };
    quick_test(&config, &args.provider).await?;
    Ok(exit_codes::OK)
}
