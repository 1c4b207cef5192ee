use crate::cli::args::RunArgs;
use crate::cli::commands::{api_keys_from_env, exit_codes};
use persona_core::engine::{DrainOptions, ExperimentRunner, RunnerConfig};
use persona_core::storage::Store;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let store = Store::open(&args.db)?;
    store.init_schema()?;

    let config = RunnerConfig {
        api_keys: api_keys_from_env(),
        longitudinal: args.longitudinal,
        ..RunnerConfig::default()
    };
    let runner = ExperimentRunner::new(store.clone(), config);
    tracing::info!(
        experiment = ?args.experiment,
        workers = args.workers,
        longitudinal = args.longitudinal,
        "starting run"
    );

    let summary = match args.experiment {
        Some(id) => runner.run_experiment(id, args.limit, args.workers).await?,
        None => {
            runner
                .drain(DrainOptions {
                    experiment: None,
                    limit: args.limit,
                    workers: args.workers,
                })
                .await?
        }
    };

    println!(
        "Ran {} test cases: {} complete, {} failed",
        summary.total, summary.complete, summary.failed
    );

    let remaining = store.status_counts(args.experiment)?;
    if remaining.pending > 0 {
        println!("{} test cases still pending", remaining.pending);
    }
    Ok(exit_codes::OK)
}
