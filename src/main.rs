use std::process::ExitCode;

use anyhow::{Context, Error};
use clap::Parser;
use log::{error, info, LevelFilter};

use arraycheck::{
    cli::{Cli, Commands},
    config, harness,
    host::{ProcessServiceControl, SysfsDeviceControl},
    poscli::PosCli,
    recorder::ResultRecorder,
    scenario::{self, runner::ScenarioRunner},
    MultiLogger, ScenarioLog, ScenarioLogHandle, ARRAYCHECK_VERSION,
};
use arraycheck_api::error::{HarnessError, HarnessResultExt};

enum ExitKind {
    Passed,
    Failed,
}

fn run_arraycheck(args: &Cli, scenario_log: &ScenarioLogHandle) -> Result<ExitKind, HarnessError> {
    info!("arraycheck version: {ARRAYCHECK_VERSION}");

    let mut config = config::load(&args.config).message("Failed to load harness configuration")?;

    match &args.command {
        Commands::List => {
            for scenario in scenario::catalog() {
                println!("{}\t{}", scenario.id, scenario.description);
            }
            Ok(ExitKind::Passed)
        }

        Commands::ShowConfig => {
            print!("{}", config::render(&config)?);
            Ok(ExitKind::Passed)
        }

        Commands::Run {
            scenario,
            result_dir,
        } => {
            if let Some(result_dir) = result_dir {
                config.result_dir = result_dir.clone();
            }

            let cli = PosCli::new(&config.cli);
            let devices = SysfsDeviceControl::new(
                &config.sysfs_root,
                config
                    .array
                    .data_devices
                    .iter()
                    .chain(config.array.spare_devices.iter()),
                config.settle,
            );
            let service = ProcessServiceControl::new(&config.service_process);
            let mut recorder = ResultRecorder::new(&config.result_dir);
            let runner = ScenarioRunner::new(&cli, &devices, &service, &config.array);

            let verdict = harness::run_one(&runner, scenario, &mut recorder, Some(scenario_log))
                .message(format!("Failed to execute '{}' command", args.command))?;
            println!("{scenario}: {} ({})", verdict.outcome, verdict.code);

            Ok(if verdict.passed() {
                ExitKind::Passed
            } else {
                ExitKind::Failed
            })
        }
    }
}

fn setup_logging(args: &Cli) -> Result<ScenarioLogHandle, Error> {
    let (scenario_log, handle) = ScenarioLog::new();

    MultiLogger::new()
        // Add regular env_logger to output to stderr
        .with_logger(Box::new(
            env_logger::builder()
                .format_timestamp(None)
                .filter_level(args.verbosity)
                .build(),
        ))
        // Keep a full log next to each scenario's artifact
        .with_logger(scenario_log.with_max_level(LevelFilter::Trace).into_logger())
        .init()
        .context("Logger already registered")?;

    Ok(handle)
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    // Initialize the loggers
    let scenario_log = match setup_logging(&args) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:?}");
            return ExitCode::from(2);
        }
    };

    match run_arraycheck(&args, &scenario_log) {
        Ok(ExitKind::Passed) => ExitCode::SUCCESS,
        Ok(ExitKind::Failed) => ExitCode::from(1),
        Err(e) => {
            error!("arraycheck failed: {e:?}");
            ExitCode::from(2)
        }
    }
}
