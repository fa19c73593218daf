//! `cpucheck` command-line entry point.
//!
//! Resolves settings (defaults, then `CPUCHECK_*`, then flags), runs the
//! selected checker until SIGINT or SIGTERM, and prints one summary line.
//!
//! Detected inconsistencies are reported, not failures: the exit status is
//! success for any run that started and drained cleanly.

use std::{env, process::ExitCode};

use cpucheck::{
  StopFlag,
  cli::{self, Command},
  config::{DEFAULT_LOG_FILTER, LOG_ENV, Settings},
  output,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
  // A subscriber installed by an embedding test harness takes precedence.
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

fn main() -> ExitCode {
  init_tracing();

  let mut args = env::args();
  let program = args.next().unwrap_or_else(|| "cpucheck".to_owned());

  let settings = match Settings::from_env().and_then(|base| cli::parse(args, base)) {
    Ok(Command::Run(settings)) => settings,
    Ok(Command::Help) => {
      print!("{}", cli::usage(&program));
      return ExitCode::SUCCESS;
    }
    Err(err) => {
      eprintln!("Error: {err}");
      eprintln!("Run with -h for usage information.");
      return ExitCode::FAILURE;
    }
  };

  info!(
    checker = settings.checker.name,
    table_size = settings.table_size.get(),
    threads = settings.threads.get(),
    seed = ?settings.seed,
    "configuration"
  );

  let stop = StopFlag::new();
  match settings.checker.run(&settings.run_config(), &stop, &output::stderr()) {
    Ok(summary) => {
      println!("{summary}");
      ExitCode::SUCCESS
    }
    Err(err) => {
      eprintln!("Error: {err}");
      ExitCode::FAILURE
    }
  }
}
