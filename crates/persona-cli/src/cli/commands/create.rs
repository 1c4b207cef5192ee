use crate::cli::args::CreateArgs;
use crate::cli::commands::exit_codes;
use persona_core::model::ExperimentSpec;
use persona_core::profiles::load_profile_set;
use persona_core::storage::Store;
use persona_core::{input_systems, instruments, providers};

pub fn run(args: CreateArgs) -> anyhow::Result<i32> {
    // Fail on typos before anything hits the database.
    for provider in &args.providers {
        let _: providers::ProviderKind = provider.parse()?;
    }
    for instrument in &args.instruments {
        instruments::get_instrument(instrument)?;
    }
    for input_system in &args.input_systems {
        input_systems::get_input_system(input_system)?;
    }

    let profile_set = load_profile_set(&args.profiles)?;

    let spec = ExperimentSpec {
        name: args.name,
        description: args.description,
        profile_set: profile_set.name.clone(),
        input_systems: args.input_systems,
        instruments: args.instruments,
        providers: args.providers,
        is_longitudinal: args.longitudinal,
    };

    let store = Store::open(&args.db)?;
    store.init_schema()?;
    let experiment_id = store.create_experiment(&spec, &profile_set.profiles)?;

    let total = spec.total_test_cases(profile_set.profiles.len());
    println!("Created experiment {experiment_id}: {}", spec.name);
    println!(
        "  {} providers x {} instruments x {} input systems x {} profiles = {} test cases",
        spec.providers.len(),
        spec.instruments.len(),
        spec.input_systems.len(),
        profile_set.profiles.len(),
        total,
    );
    if spec.is_longitudinal {
        println!("  mode: longitudinal");
    }
    Ok(exit_codes::OK)
}
