// attitude_sim/src/main.rs

//! Runs one synthetic scenario through the estimators and logs how well they did.
//!
//! `cargo run -p attitude_sim -- --scenario assets/scenarios/tank_steer.toml --verbose`

use attitude_sim::cli::Cli;
use attitude_sim::prelude::*;
use clap::Parser;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> SimResult<()> {
    let config = load_scenario(cli.scenario.as_deref(), cli.seed)?;
    let mut rng = SimulationRng::from_seed_option(config.simulation.seed);

    let report = run_scenario(&config, &mut rng)?;
    info!("{}", report);
    Ok(())
}

fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
