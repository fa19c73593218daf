//! The checker contract.
//!
//! A checker is pure data plus operations: it owns no mutable state between
//! calls. Everything it needs lives in three places, each with its own
//! sharing rule:
//!
//! - **Config**: computed once by `init`, then shared read-only by all threads
//! - **Element**: one test vector (inputs + oracle), shared read-only
//! - **Scratch**: per-thread live results, exclusively owned by one worker

use std::io::{self, Write};

use platform::Caps;
use rand::rngs::StdRng;

use crate::InitError;

/// Context handed to [`Checker::init`].
///
/// Carries the capabilities the run may rely on and the run's RNG. Seeding the
/// RNG is the harness's business; checkers only draw from it.
#[derive(Debug)]
pub struct InitContext<'a> {
  caps: Caps,
  rng: &'a mut StdRng,
}

impl<'a> InitContext<'a> {
  #[inline]
  #[must_use]
  pub fn new(caps: Caps, rng: &'a mut StdRng) -> Self {
    Self { caps, rng }
  }

  /// Capabilities of the CPU the run executes on.
  #[inline]
  #[must_use]
  pub fn caps(&self) -> Caps {
    self.caps
  }

  /// Fail with [`InitError::MissingFeature`] unless `required` is available.
  pub fn require(&self, required: Caps, feature: &'static str) -> Result<(), InitError> {
    if self.caps.has(required) {
      Ok(())
    } else {
      Err(InitError::MissingFeature { feature })
    }
  }

  #[inline]
  pub fn rng(&mut self) -> &mut StdRng {
    self.rng
  }

  /// Push `table_size` elements produced by `make` onto `table`.
  ///
  /// The harness reserves the capacity beforehand, so this never reallocates.
  pub fn fill<E>(&mut self, table: &mut Vec<E>, table_size: usize, mut make: impl FnMut(&mut StdRng) -> E) {
    table.extend((0..table_size).map(|_| make(self.rng)));
  }

  /// Like [`fill`](Self::fill), for elements that own fallible allocations.
  ///
  /// Stops at the first error. Elements already pushed stay in `table` and are
  /// released when the harness drops it.
  ///
  /// # Errors
  ///
  /// The first error returned by `make`.
  pub fn try_fill<E>(
    &mut self,
    table: &mut Vec<E>,
    table_size: usize,
    mut make: impl FnMut(&mut StdRng) -> Result<E, InitError>,
  ) -> Result<(), InitError> {
    for _ in 0..table_size {
      table.push(make(self.rng)?);
    }
    Ok(())
  }
}

/// One class of instruction-level correctness checks.
///
/// # Lifecycle
///
/// 1. [`init`](Self::init) runs once, single-threaded, before any check. It
///    must push exactly `table_size` fully initialised elements.
/// 2. [`check`](Self::check) runs concurrently from many threads against the
///    same elements, each thread with its own scratch.
/// 3. [`report`](Self::report) runs only while the caller holds the shared
///    output lock, right after a `check` returned `true`.
/// 4. [`cleanup`](Self::cleanup) runs once after all workers are joined.
///
/// # Implementor Requirements
///
/// - Oracles are computed with portable arithmetic, never with the
///   instruction under test.
/// - `check` compares bit-exactly and leaves every live result in scratch.
/// - `check` must not allocate: the checked path stays as close as possible
///   to the bare instruction.
pub trait Checker: 'static {
  /// Registry name, used by `-c`.
  const NAME: &'static str;

  /// One-line description for the usage listing.
  const DESCRIPTION: &'static str;

  /// Shared read-only configuration computed by `init` (e.g. detected features).
  type Config: Send + Sync;

  /// One table element: instruction inputs plus precomputed oracle outputs.
  type Element: Send + Sync;

  /// Per-thread buffer receiving live instruction outputs.
  type Scratch: Default + Send;

  /// Fill `table` with `table_size` elements and return the shared config.
  ///
  /// Failing here aborts the run before any worker starts.
  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Self::Element>, table_size: usize)
  -> Result<Self::Config, InitError>;

  /// Execute the instructions under test for `element` into `scratch`.
  ///
  /// Returns `true` when the live results diverge from the oracle.
  fn check(scratch: &mut Self::Scratch, config: &Self::Config, element: &Self::Element) -> bool;

  /// Write a human-readable account of a mismatch: inputs, expected, got.
  fn report(
    out: &mut dyn Write,
    config: &Self::Config,
    element: &Self::Element,
    scratch: &Self::Scratch,
  ) -> io::Result<()>;

  /// Release resources owned by individual elements.
  ///
  /// Heap buffers are also released by `Drop`; this hook exists for checkers
  /// that want to release eagerly or account for what they release.
  #[inline]
  fn cleanup(config: &Self::Config, table: &mut [Self::Element]) {
    let _ = (config, table);
  }
}
