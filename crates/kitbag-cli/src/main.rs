mod logging;

use clap::{Parser, ValueEnum};
use kitbag_compose::{CapacityOverrides, ComposeError, ComposeOptions, Domain, Goal, Instance, run};
use kitbag_core::SolverConfig;
use kitbag_highs::HighsSolver;

use crate::logging::LoggingError;

/// Exit status for invalid input.
const EXIT_CONFIG: i32 = 2;
/// Exit status for model or solver failures.
const EXIT_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Pack the camping trip by composing named constraint groups"
)]
struct Cli {
    /// Constraint groups joined by '+' or ',': volume, weight, value, bags, requirements
    selector: String,

    /// Quantity to maximize
    #[arg(long, value_enum, default_value = "value")]
    goal: GoalArg,

    /// Solve the LP relaxation instead of whole item counts
    #[arg(long)]
    relaxed: bool,

    /// Override the volume capacity
    #[arg(long)]
    volume_capacity: Option<f64>,

    /// Override the weight capacity
    #[arg(long)]
    weight_capacity: Option<f64>,

    /// Override the value capacity
    #[arg(long)]
    value_capacity: Option<f64>,

    /// Solver time limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Relative MIP gap at which the solver stops
    #[arg(long)]
    mip_gap: Option<f64>,

    /// Solver thread count
    #[arg(long)]
    threads: Option<u32>,

    /// Show the solver's own log
    #[arg(long)]
    solver_log: bool,

    /// Tracing filter, e.g. `debug` or `kitbag_core=trace` (defaults to KITBAG_TRACE)
    #[arg(long)]
    log_level: Option<String>,

    /// Output format for the report
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum GoalArg {
    Value,
    Volume,
    Weight,
}

impl From<GoalArg> for Goal {
    fn from(goal: GoalArg) -> Self {
        match goal {
            GoalArg::Value => Goal::Value,
            GoalArg::Volume => Goal::Volume,
            GoalArg::Weight => Goal::Weight,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            goal: self.goal.into(),
            domain: if self.relaxed {
                Domain::Relaxed
            } else {
                Domain::Integral
            },
            capacities: CapacityOverrides {
                volume: self.volume_capacity,
                weight: self.weight_capacity,
                value: self.value_capacity,
            },
        }
    }

    fn solver_config(&self) -> SolverConfig {
        let mut config = SolverConfig::new().with_log_to_console(self.solver_log);
        if let Some(limit) = self.time_limit {
            config = config.with_time_limit(limit);
        }
        if let Some(gap) = self.mip_gap {
            config = config.with_mip_gap(gap);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        config
    }
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("{err}");
        std::process::exit(exit_code(err.as_ref()));
    }
}

fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    let instance = Instance::camping();
    let mut solver = HighsSolver::new();
    let report = run(
        &cli.selector,
        &instance,
        &cli.compose_options(),
        &mut solver,
        &cli.solver_config(),
    )?;

    match cli.format {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    if let Some(err) = err.downcast_ref::<ComposeError>() {
        return if err.is_config() {
            EXIT_CONFIG
        } else {
            EXIT_FAILURE
        };
    }
    if err.is::<LoggingError>() {
        return EXIT_CONFIG;
    }
    EXIT_FAILURE
}
