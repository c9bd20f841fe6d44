pub mod cli;
pub mod config;
pub mod expectation;
pub mod harness;
pub mod host;
mod logging;
pub mod poscli;
pub mod recorder;
pub mod response;
pub mod scenario;

pub use logging::{
    multilog::MultiLogger,
    scenario_log::{ScenarioLog, ScenarioLogHandle},
};

/// Version reported by `--version`, overridable at build time.
pub const ARRAYCHECK_VERSION: &str = match option_env!("ARRAYCHECK_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
