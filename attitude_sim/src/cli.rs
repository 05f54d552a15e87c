// attitude_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Attitude sim: runs synthetic sensor scenarios through the heading estimators.
///
/// This struct defines the command-line arguments of the `attitude_sim` binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run. Without it the built-in
    /// tank-steer scenario runs.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Seed for the noise generator. Overrides the scenario file's seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log every estimate at DEBUG level.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_parse() {
        let cli = Cli::parse_from([
            "attitude_sim",
            "--scenario",
            "assets/scenarios/decay.toml",
            "--seed",
            "3",
            "-v",
        ]);
        assert_eq!(cli.scenario, Some(PathBuf::from("assets/scenarios/decay.toml")));
        assert_eq!(cli.seed, Some(3));
        assert!(cli.verbose);
    }

    #[test]
    fn test_everything_is_optional() {
        let cli = Cli::parse_from(["attitude_sim"]);
        assert!(cli.scenario.is_none());
        assert!(cli.seed.is_none());
        assert!(!cli.verbose);
    }
}
