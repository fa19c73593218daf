//! Saturating counters and their aggregation.
//!
//! Runs are unbounded, so counters cap at `u64::MAX` instead of wrapping. A
//! capped value only says "at least this many"; [`Total`] carries that
//! qualifier into the summary.

use core::fmt;

/// A per-thread counter that stops at `u64::MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SaturatingCounter(u64);

impl SaturatingCounter {
  #[inline]
  #[must_use]
  pub const fn new(value: u64) -> Self {
    Self(value)
  }

  /// Add one, unless already at the ceiling.
  #[inline(always)]
  pub fn increment(&mut self) {
    self.0 = self.0.saturating_add(1);
  }

  #[inline]
  #[must_use]
  pub const fn get(self) -> u64 {
    self.0
  }

  #[inline]
  #[must_use]
  pub const fn is_saturated(self) -> bool {
    self.0 == u64::MAX
  }
}

/// Add `term` to `sum`, capping at `u64::MAX`.
///
/// `sum + min(MAX - sum, term)`; never wraps.
#[inline]
#[must_use]
pub const fn saturating_accumulate(sum: u64, term: u64) -> u64 {
  let room = u64::MAX - sum;
  sum + if term < room { term } else { room }
}

/// An aggregated count that may have hit the ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Total(u64);

impl Total {
  #[inline]
  #[must_use]
  pub const fn value(self) -> u64 {
    self.0
  }

  /// True iff the count reached `u64::MAX`, so the real value is unknown.
  #[inline]
  #[must_use]
  pub const fn is_saturated(self) -> bool {
    self.0 == u64::MAX
  }
}

/// Combine per-thread counts with saturating addition.
#[must_use]
pub fn aggregate(terms: impl IntoIterator<Item = u64>) -> Total {
  Total(terms.into_iter().fold(0, saturating_accumulate))
}

impl fmt::Display for Total {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_saturated() {
      f.write_str("possibly more than ")?;
    }
    write!(f, "{}", self.0)
  }
}
