use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::LevelFilter;

use arraycheck_api::constants::HARNESS_CONFIG_PATH_DEFAULT;

use crate::ARRAYCHECK_VERSION;

#[derive(Parser, Debug)]
#[clap(version = ARRAYCHECK_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Debug)]
    pub verbosity: LevelFilter,

    /// Path to the harness configuration
    #[arg(global = true, short, long, default_value = HARNESS_CONFIG_PATH_DEFAULT)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one scenario against the array service and record its verdict
    ///
    /// The service is terminated afterwards, so each scenario needs its own
    /// invocation.
    Run {
        /// Id of the scenario to run
        #[clap(index = 1)]
        scenario: String,

        /// Directory to write result artifacts to, overriding the configuration
        #[clap(short, long)]
        result_dir: Option<PathBuf>,
    },

    /// List the known scenarios
    List,

    /// Print the effective harness configuration
    #[clap(name = "show-config")]
    ShowConfig,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::List => "list",
            Commands::ShowConfig => "show-config",
        }
    }
}

impl Display for Commands {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}
