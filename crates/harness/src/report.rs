//! Run results.

use core::fmt;

use crate::counter::{self, Total};

/// What one worker did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadReport {
  /// Worker index, `0..threads`.
  pub index: usize,
  /// Table index the first pass started at.
  pub start: usize,
  /// Mismatches seen (saturating).
  pub inconsistencies: u64,
  /// Elements checked (saturating).
  pub checks: u64,
  /// Complete sweeps of the table (saturating).
  pub passes: u64,
}

/// The outcome of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
  pub checker: &'static str,
  pub table_size: usize,
  pub seed: u64,
  pub threads: Vec<ThreadReport>,
  pub inconsistencies: Total,
  pub checks: Total,
  pub passes: Total,
  /// Whether the run ended because the stop flag was set.
  pub stopped: bool,
}

impl RunSummary {
  /// Aggregate per-thread reports.
  #[must_use]
  pub fn from_threads(
    checker: &'static str,
    table_size: usize,
    seed: u64,
    threads: Vec<ThreadReport>,
    stopped: bool,
  ) -> Self {
    let inconsistencies = counter::aggregate(threads.iter().map(|t| t.inconsistencies));
    let checks = counter::aggregate(threads.iter().map(|t| t.checks));
    let passes = counter::aggregate(threads.iter().map(|t| t.passes));
    Self {
      checker,
      table_size,
      seed,
      threads,
      inconsistencies,
      checks,
      passes,
      stopped,
    }
  }

  /// True iff no worker saw a mismatch.
  #[inline]
  #[must_use]
  pub fn is_clean(&self) -> bool {
    self.inconsistencies.value() == 0
  }
}

impl fmt::Display for RunSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Detected {} inconsistencies in {} checks",
      self.inconsistencies, self.checks
    )
  }
}
