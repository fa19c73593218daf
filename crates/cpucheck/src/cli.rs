//! Command-line parsing and usage text.
//!
//! Flags take their value either as the next argument (`-s 1000`) or attached
//! (`-s1000`). Numbers are decimal or `0x`-prefixed hexadecimal.

use core::fmt::Write as _;

use thiserror::Error;

use crate::config::{self, Settings};

/// Configuration errors from flags or environment variables.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CliError {
  #[error("option {flag} requires a value")]
  MissingValue { flag: &'static str },

  #[error("unknown option: {arg}")]
  UnknownOption { arg: String },

  #[error("unexpected argument: {arg}")]
  UnexpectedArgument { arg: String },

  #[error("unknown checker: {name}")]
  UnknownChecker { name: String },

  #[error("invalid {what}: {value:?} is not a number")]
  InvalidNumber { what: &'static str, value: String },

  #[error("invalid {what}: {value:?} must be a positive integer")]
  NotPositive { what: &'static str, value: String },
}

/// What the command line asks for.
#[derive(Clone, Copy, Debug)]
pub enum Command {
  /// Print usage and exit.
  Help,
  /// Run with these settings.
  Run(Settings),
}

/// Apply command-line `args` (without the program name) on top of `base`.
///
/// `-h` wins over everything else, even a malformed flag after it.
///
/// # Errors
///
/// Returns [`CliError`] for an unknown option, a missing or malformed value,
/// or an unknown checker name.
pub fn parse<I>(args: I, base: Settings) -> Result<Command, CliError>
where
  I: IntoIterator,
  I::Item: Into<String>,
{
  let mut settings = base;
  let mut args = args.into_iter().map(Into::into);

  while let Some(arg) = args.next() {
    let (flag, attached) = split_flag(&arg);
    match flag {
      "-h" => return Ok(Command::Help),
      "-c" => {
        let name = value("-c", attached, &mut args)?;
        settings.checker = config::find_checker(&name)?;
      }
      "-s" => {
        let size = value("-s", attached, &mut args)?;
        settings.table_size = config::parse_count("table size", &size)?;
      }
      "-t" => {
        let threads = value("-t", attached, &mut args)?;
        settings.threads = config::parse_count("thread count", &threads)?;
      }
      _ if arg.starts_with('-') && arg.len() > 1 => return Err(CliError::UnknownOption { arg: arg.clone() }),
      _ => return Err(CliError::UnexpectedArgument { arg: arg.clone() }),
    }
  }
  Ok(Command::Run(settings))
}

/// Split `-s100` into `("-s", Some("100"))`; anything else is returned whole.
fn split_flag(arg: &str) -> (&str, Option<&str>) {
  match arg.as_bytes() {
    [b'-', b'c' | b's' | b't', _, ..] => {
      let (flag, rest) = arg.split_at(2);
      (flag, Some(rest))
    }
    _ => (arg, None),
  }
}

fn value(
  flag: &'static str,
  attached: Option<&str>,
  rest: &mut impl Iterator<Item = String>,
) -> Result<String, CliError> {
  match attached {
    Some(value) => Ok(value.to_owned()),
    None => rest.next().ok_or(CliError::MissingValue { flag }),
  }
}

/// Usage text, including the registry listing with defaults in brackets.
#[must_use]
pub fn usage(program: &str) -> String {
  let defaults = Settings::default();
  let mut text = String::new();

  // Writing into a String cannot fail.
  let _ = writeln!(text, "Usage: {program} [-c checker] [-s table_size] [-t threads] [-h]");
  let _ = writeln!(text);
  let _ = writeln!(text, "Runs one checker on every requested thread until SIGINT or SIGTERM, then");
  let _ = writeln!(text, "prints the number of inconsistencies detected.");
  let _ = writeln!(text);
  let _ = writeln!(text, "Options:");
  let _ = writeln!(text, "  -c checker     checker to run [{}]", defaults.checker.name);
  let _ = writeln!(text, "  -s table_size  number of table elements [{}]", defaults.table_size);
  let _ = writeln!(text, "  -t threads     number of worker threads [{}]", defaults.threads);
  let _ = writeln!(text, "  -h             print this help and exit");
  let _ = writeln!(text);
  let _ = writeln!(text, "Checkers:");
  for checker in checkers::CHECKERS {
    let _ = writeln!(text, "  {:<12} {}", checker.name, checker.description);
  }
  let _ = writeln!(text);
  let _ = writeln!(text, "Environment:");
  let _ = writeln!(text, "  {}  checker name", config::CHECKER_ENV);
  let _ = writeln!(text, "  {}  table size", config::TABLE_SIZE_ENV);
  let _ = writeln!(text, "  {}  thread count", config::THREADS_ENV);
  let _ = writeln!(text, "  {}  seed for a reproducible table", config::SEED_ENV);
  let _ = writeln!(text, "  {}  log filter [{}]", config::LOG_ENV, config::DEFAULT_LOG_FILTER);
  let _ = writeln!(text);
  let _ = writeln!(text, "CPU: {}", platform::describe());
  text
}
