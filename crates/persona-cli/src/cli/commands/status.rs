use crate::cli::args::StatusArgs;
use crate::cli::commands::exit_codes;
use persona_core::model::StatusCounts;
use persona_core::storage::Store;

pub fn run(args: StatusArgs) -> anyhow::Result<i32> {
    let store = Store::open(&args.db)?;
    store.init_schema()?;

    match args.experiment {
        Some(id) => {
            let Some(status) = store.experiment_status(id)? else {
                eprintln!("no experiment with id {id}");
                return Ok(exit_codes::CONFIG_ERROR);
            };
            println!(
                "Experiment {} (#{}) - {}",
                status.id, status.experiment_number, status.name
            );
            println!("  status:       {}", status.status);
            println!(
                "  mode:         {}",
                if status.is_longitudinal {
                    "longitudinal"
                } else {
                    "independent"
                }
            );
            if let Some(started) = &status.started_at {
                println!("  started:      {started}");
            }
            if let Some(completed) = &status.completed_at {
                println!("  completed:    {completed}");
            }
            print_counts(&status.counts);
        }
        None => {
            let counts = store.status_counts(None)?;
            println!("All experiments");
            print_counts(&counts);
        }
    }
    Ok(exit_codes::OK)
}

fn print_counts(counts: &StatusCounts) {
    println!("  test cases:   {}", counts.total);
    println!("    complete:   {}", counts.complete);
    println!("    pending:    {}", counts.pending);
    println!("    running:    {}", counts.running);
    println!("    failed:     {}", counts.failed);
}
