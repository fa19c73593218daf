//! Run configuration.

use core::num::NonZeroUsize;

use platform::Caps;

/// Default number of table elements.
pub const DEFAULT_TABLE_SIZE: NonZeroUsize = match NonZeroUsize::new(65_535) {
  Some(n) => n,
  None => panic!("default table size must be non-zero"),
};

/// Parameters of one harness run.
///
/// Zero table sizes and thread counts are unrepresentable; callers parsing
/// user input reject them before building a `RunConfig`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
  /// Number of table elements.
  table_size: NonZeroUsize,

  /// Number of worker threads.
  threads: NonZeroUsize,

  /// RNG seed for table contents and start offsets (`None` = OS entropy).
  seed: Option<u64>,

  /// Capabilities to present to the checker instead of the detected ones.
  caps: Option<Caps>,

  /// Whether to stop on SIGINT/SIGTERM for the duration of the run.
  signal_handlers: bool,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      table_size: DEFAULT_TABLE_SIZE,
      threads: NonZeroUsize::new(platform::logical_cores()).unwrap_or(NonZeroUsize::MIN),
      seed: None,
      caps: None,
      signal_handlers: true,
    }
  }
}

impl RunConfig {
  /// Defaults: 65535 elements, one thread per logical core, random seed.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_table_size(mut self, table_size: NonZeroUsize) -> Self {
    self.table_size = table_size;
    self
  }

  #[must_use]
  pub fn with_threads(mut self, threads: NonZeroUsize) -> Self {
    self.threads = threads;
    self
  }

  /// Make table contents and start offsets reproducible.
  #[must_use]
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = Some(seed);
    self
  }

  /// Present at most `caps` to the checker.
  ///
  /// The override is intersected with detection, so it only ever narrows what
  /// a checker believes it may run; used to exercise missing-feature paths on
  /// capable machines.
  #[must_use]
  pub fn with_caps(mut self, caps: Caps) -> Self {
    self.caps = Some(caps);
    self
  }

  /// Enable or disable SIGINT/SIGTERM handling during the run.
  #[must_use]
  pub fn with_signal_handlers(mut self, enabled: bool) -> Self {
    self.signal_handlers = enabled;
    self
  }

  #[inline]
  #[must_use]
  pub fn table_size(&self) -> usize {
    self.table_size.get()
  }

  #[inline]
  #[must_use]
  pub fn threads(&self) -> usize {
    self.threads.get()
  }

  #[inline]
  #[must_use]
  pub fn seed(&self) -> Option<u64> {
    self.seed
  }

  /// Capabilities the checker will see: detection, narrowed by the override.
  #[must_use]
  pub fn effective_caps(&self) -> Caps {
    let detected = platform::caps();
    self.caps.map_or(detected, |caps| caps.intersection(detected))
  }

  #[inline]
  #[must_use]
  pub fn signal_handlers(&self) -> bool {
    self.signal_handlers
  }
}
