//! Environment configuration.
//!
//! Every setting has a built-in default and may be overridden by a
//! `CPUCHECK_*` variable; command-line flags override both.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `CPUCHECK_CHECKER` | registry name | first registry entry |
//! | `CPUCHECK_TABLE_SIZE` | table elements | 65535 |
//! | `CPUCHECK_THREADS` | worker threads | logical cores |
//! | `CPUCHECK_SEED` | RNG seed | OS entropy |
//! | `CPUCHECK_LOG` | tracing filter | `warn` |
//!
//! Unset or blank variables fall through to the default. Set but invalid
//! values are errors, exactly like invalid flags.

use core::num::NonZeroUsize;

use harness::{CheckerDescriptor, DEFAULT_TABLE_SIZE, RunConfig};

use crate::cli::CliError;

pub const CHECKER_ENV: &str = "CPUCHECK_CHECKER";
pub const TABLE_SIZE_ENV: &str = "CPUCHECK_TABLE_SIZE";
pub const THREADS_ENV: &str = "CPUCHECK_THREADS";
pub const SEED_ENV: &str = "CPUCHECK_SEED";
pub const LOG_ENV: &str = "CPUCHECK_LOG";

/// Log filter used when `CPUCHECK_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Fully resolved settings for one run.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
  pub checker: &'static CheckerDescriptor,
  pub table_size: NonZeroUsize,
  pub threads: NonZeroUsize,
  pub seed: Option<u64>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      checker: checkers::default_checker(),
      table_size: DEFAULT_TABLE_SIZE,
      threads: NonZeroUsize::new(platform::logical_cores()).unwrap_or(NonZeroUsize::MIN),
      seed: None,
    }
  }
}

impl Settings {
  /// Defaults overridden by the process environment.
  ///
  /// # Errors
  ///
  /// Returns [`CliError`] for an unknown checker name or a malformed number.
  pub fn from_env() -> Result<Self, CliError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Defaults overridden by whatever `lookup` returns for each variable.
  ///
  /// # Errors
  ///
  /// See [`Settings::from_env`].
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let mut settings = Self::default();

    if let Some(name) = get(CHECKER_ENV) {
      settings.checker = find_checker(name.trim())?;
    }
    if let Some(value) = get(TABLE_SIZE_ENV) {
      settings.table_size = parse_count(TABLE_SIZE_ENV, &value)?;
    }
    if let Some(value) = get(THREADS_ENV) {
      settings.threads = parse_count(THREADS_ENV, &value)?;
    }
    if let Some(value) = get(SEED_ENV) {
      settings.seed = Some(parse_u64(SEED_ENV, &value)?);
    }
    Ok(settings)
  }

  /// The harness configuration for these settings.
  #[must_use]
  pub fn run_config(&self) -> RunConfig {
    let config = RunConfig::new().with_table_size(self.table_size).with_threads(self.threads);
    match self.seed {
      Some(seed) => config.with_seed(seed),
      None => config,
    }
  }
}

/// Resolve a registry name.
///
/// # Errors
///
/// [`CliError::UnknownChecker`] when no checker has that name on this target.
pub fn find_checker(name: &str) -> Result<&'static CheckerDescriptor, CliError> {
  checkers::find(name).ok_or_else(|| CliError::UnknownChecker { name: name.to_owned() })
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer.
pub(crate) fn parse_u64(what: &'static str, value: &str) -> Result<u64, CliError> {
  let trimmed = value.trim();
  let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
    Some(hex) => u64::from_str_radix(hex, 16),
    None => trimmed.parse(),
  };
  parsed.map_err(|_| CliError::InvalidNumber {
    what,
    value: value.to_owned(),
  })
}

/// Parse a strictly positive count.
pub(crate) fn parse_count(what: &'static str, value: &str) -> Result<NonZeroUsize, CliError> {
  let n = parse_u64(what, value)?;
  usize::try_from(n)
    .ok()
    .and_then(NonZeroUsize::new)
    .ok_or_else(|| CliError::NotPositive {
      what,
      value: value.to_owned(),
    })
}
