// src/cli.rs
use clap::{Command, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use liftlog_lib::{ChartMetric, Units};

#[derive(Parser, Debug)]
#[command(author, version, about = "Log lifts against a remote exercise store", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Metric,
    Imperial,
}

impl From<UnitsCli> for Units {
    fn from(value: UnitsCli) -> Self {
        match value {
            UnitsCli::Metric => Self::Metric,
            UnitsCli::Imperial => Self::Imperial,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricCli {
    Weight,
    #[value(name = "estimated-1rm")]
    Estimated1Rm,
    Volume,
}

impl From<MetricCli> for ChartMetric {
    fn from(value: MetricCli) -> Self {
        match value {
            MetricCli::Weight => Self::Weight,
            MetricCli::Estimated1Rm => Self::Estimated1Rm,
            MetricCli::Volume => Self::Volume,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List exercises known to the store
    Exercises,
    /// Show the logged history of one exercise as chart points
    History {
        /// Exercise name or key (e.g. "Bench Press" or bench_press)
        exercise: String,
        /// Value plotted for each entry (defaults to the configured metric)
        #[arg(short, long, value_enum)]
        metric: Option<MetricCli>,
        /// Print CSV instead of a table
        #[arg(long)]
        csv: bool,
    },
    /// Show the details of one entry
    Show {
        exercise: String,
        /// Entry id as assigned by the store
        id: String,
    },
    /// Log a new entry
    Add {
        exercise: String,
        #[arg(short, long)]
        weight: String,
        #[arg(short, long)]
        reps: String,
        #[arg(short, long)]
        notes: Option<String>,
        /// Date of the set (YYYY-MM-DD, defaults to now)
        #[arg(short, long, value_parser = clap::value_parser!(chrono::NaiveDate))]
        date: Option<chrono::NaiveDate>,
    },
    /// Delete one entry
    Delete {
        exercise: String,
        id: String,
    },
    /// Check how a new exercise name will be stored
    NewExercise {
        name: String,
    },
    /// Nutrition lookups
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Print the config file location
    ConfigPath,
    /// Set the exercise store base URL
    SetStoreUrl {
        url: String,
    },
    /// Set the weight unit label
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum FoodCommands {
    /// Search branded foods by text
    Search { query: String },
    /// Describe a meal in plain words ("2 eggs and toast")
    Natural { query: String },
    /// Look up a product by barcode
    Barcode {
        upc: String,
        /// Number of servings to total up
        #[arg(short, long, default_value_t = 1.0)]
        servings: f64,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> Command {
    Cli::command()
}
