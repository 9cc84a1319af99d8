use std::path::PathBuf;

/// Simulate an FMU and write the observed variables to CSV.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct DriverOptions {
    /// The FMU archive to simulate.
    pub model: PathBuf,

    /// Simulation start time; defaults to the DefaultExperiment entry of the
    /// model description, or 0.
    #[arg(short = 's', long)]
    pub start_time: Option<f64>,

    /// Simulation stop time; defaults to the DefaultExperiment entry of the
    /// model description, or 1.
    #[arg(short = 'f', long)]
    pub stop_time: Option<f64>,

    /// Communication step size; defaults to the DefaultExperiment entry of
    /// the model description, or 1e-3.
    #[arg(long)]
    pub step_size: Option<f64>,

    /// Variables to record. Defaults to the outputs declared in the model
    /// structure.
    #[arg(short = 'v', long = "variable")]
    pub variables: Vec<String>,

    /// Directory the `<model>_out.csv` file is written to.
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Drive a Model-Exchange FMU behind the co-simulation interface,
    /// integrating with a fixed-step Euler solver.
    #[arg(long)]
    pub model_exchange: bool,

    /// Euler step size used with --model-exchange.
    #[arg(long, default_value_t = 1e-3)]
    pub solver_step: f64,

    /// Enable the FMU's own debug logging.
    #[arg(long)]
    pub logging_on: bool,

    /// Reject runs whose CSV output exceeds 1 MiB.
    #[arg(long)]
    pub fail_on_large_output: bool,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_definition() {
        DriverOptions::command().debug_assert();
    }

    #[test]
    fn test_parse() {
        let options = DriverOptions::parse_from([
            "fmi2-driver",
            "--model-exchange",
            "-v",
            "MotorDiskRev",
            "-v",
            "Phi",
            "--stop-time",
            "12",
            "model.fmu",
        ]);
        assert!(options.model_exchange);
        assert_eq!(options.variables, ["MotorDiskRev", "Phi"]);
        assert_eq!(options.stop_time, Some(12.0));
        assert_eq!(options.step_size, None);
        assert_eq!(options.model.to_string_lossy(), "model.fmu");
    }
}
