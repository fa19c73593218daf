//! The run loop: table construction, the worker pool and aggregation.
//!
//! # Lifecycle
//!
//! ```text
//! new     size checks only, nothing allocated
//! run     seed -> reserve table -> C::init -> start offsets -> spawn workers
//!         -> join -> C::cleanup -> RunSummary
//! ```
//!
//! Every worker first sweeps the table once starting at its own random
//! offset and wrapping around, so threads hit different elements at the same
//! moment. After that it sweeps `0..n` in order until the stop flag is set.

use core::{fmt, marker::PhantomData};
use std::{
  io::{self, Write},
  thread,
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, error, info, warn};
use traits::{Checker, InitContext, InitError};

use crate::{
  HarnessError, RunConfig, RunSummary, SignalGuard, StopFlag, ThreadReport, counter::SaturatingCounter,
  output::DiagnosticOutput,
};

/// Largest allocation the harness will attempt, in bytes.
const MAX_ALLOCATION: usize = isize::MAX as usize;

/// Everything one worker owns exclusively.
struct ThreadState<C: Checker> {
  scratch: C::Scratch,
  start: usize,
  inconsistencies: SaturatingCounter,
  checks: SaturatingCounter,
  passes: SaturatingCounter,
}

impl<C: Checker> ThreadState<C> {
  fn new(start: usize) -> Self {
    Self {
      scratch: C::Scratch::default(),
      start,
      inconsistencies: SaturatingCounter::default(),
      checks: SaturatingCounter::default(),
      passes: SaturatingCounter::default(),
    }
  }

  fn report(&self, index: usize) -> ThreadReport {
    ThreadReport {
      index,
      start: self.start,
      inconsistencies: self.inconsistencies.get(),
      checks: self.checks.get(),
      passes: self.passes.get(),
    }
  }
}

/// A validated run of checker `C`.
pub struct Harness<C: Checker> {
  config: RunConfig,
  _checker: PhantomData<fn() -> C>,
}

impl<C: Checker> fmt::Debug for Harness<C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Harness")
      .field("checker", &C::NAME)
      .field("config", &self.config)
      .finish()
  }
}

impl<C: Checker> Harness<C> {
  /// Validate that the table and the per-thread state fit in memory.
  ///
  /// # Errors
  ///
  /// [`HarnessError::TableTooLarge`] or [`HarnessError::TooManyThreads`] when
  /// the byte size of either would exceed `isize::MAX`.
  pub fn new(config: RunConfig) -> Result<Self, HarnessError> {
    let element_size = size_of::<C::Element>();
    if !fits(config.table_size(), element_size) {
      return Err(HarnessError::TableTooLarge {
        table_size: config.table_size(),
        element_size,
      });
    }

    let state_size = size_of::<ThreadState<C>>();
    if !fits(config.threads(), state_size) {
      return Err(HarnessError::TooManyThreads {
        threads: config.threads(),
        state_size,
      });
    }

    Ok(Self {
      config,
      _checker: PhantomData,
    })
  }

  #[inline]
  #[must_use]
  pub fn config(&self) -> &RunConfig {
    &self.config
  }

  /// Build the table and check it from every worker until `stop` is set.
  ///
  /// Mismatch reports go to `output`. The returned summary carries the
  /// saturating totals over all workers.
  ///
  /// # Errors
  ///
  /// Allocation and `init` failures abort before any worker starts. A failed
  /// spawn or a panicking worker stops the other workers, joins them, and is
  /// returned after cleanup.
  pub fn run(&self, stop: &StopFlag, output: &DiagnosticOutput) -> Result<RunSummary, HarnessError> {
    let table_size = self.config.table_size();
    let seed = self.config.seed().unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    info!(checker = C::NAME, table_size, threads = self.config.threads(), seed, "initialising table");

    let mut table = Vec::new();
    table
      .try_reserve_exact(table_size)
      .map_err(|_| HarnessError::AllocationFailed { what: "table" })?;

    let caps = self.config.effective_caps();
    let config = C::init(&mut InitContext::new(caps, &mut rng), &mut table, table_size)?;
    info!(checker = C::NAME, elements = table.len(), "table initialised");

    let result = self.check_table(&config, &table, &mut rng, seed, stop, output);
    C::cleanup(&config, &mut table);
    result
  }

  fn check_table(
    &self,
    config: &C::Config,
    table: &[C::Element],
    rng: &mut StdRng,
    seed: u64,
    stop: &StopFlag,
    output: &DiagnosticOutput,
  ) -> Result<RunSummary, HarnessError> {
    let table_size = self.config.table_size();
    if table.len() != table_size {
      return Err(InitError::IncompleteTable {
        expected: table_size,
        actual: table.len(),
      }
      .into());
    }

    let threads = self.config.threads();
    let mut states: Vec<ThreadState<C>> = Vec::new();
    states
      .try_reserve_exact(threads)
      .map_err(|_| HarnessError::AllocationFailed { what: "thread state" })?;
    states.extend((0..threads).map(|_| ThreadState::new(rng.gen_range(0..table_size))));

    let guard = if self.config.signal_handlers() {
      Some(SignalGuard::register(stop).map_err(HarnessError::SignalHandler)?)
    } else {
      None
    };

    let outcome = thread::scope(|scope| {
      let mut handles = Vec::with_capacity(threads);
      let mut failure = None;

      for (index, state) in states.iter_mut().enumerate() {
        let spawned = match spawn_failure(index) {
          Some(err) => Err(err),
          None => thread::Builder::new()
            .name(format!("cpucheck-{index}"))
            .spawn_scoped(scope, move || worker::<C>(index, state, config, table, stop, output)),
        };
        match spawned {
          Ok(handle) => handles.push(handle),
          Err(source) => {
            error!(thread = index, %source, "could not spawn worker, stopping the others");
            stop.trigger();
            failure = Some(HarnessError::ThreadSpawn { index, source });
            break;
          }
        }
      }
      if failure.is_none() {
        info!(threads, "workers started");
      }

      for (index, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
          error!(thread = index, "worker panicked");
          stop.trigger();
          failure.get_or_insert(HarnessError::WorkerPanicked { index });
        }
      }
      failure.map_or(Ok(()), Err)
    });
    drop(guard);
    outcome?;
    if stop.is_set() {
      info!("stop requested, all workers drained");
    }

    let reports = states.iter().enumerate().map(|(index, state)| state.report(index)).collect();
    let summary = RunSummary::from_threads(C::NAME, table_size, seed, reports, stop.is_set());
    info!(
      checker = C::NAME,
      inconsistencies = summary.inconsistencies.value(),
      checks = summary.checks.value(),
      passes = summary.passes.value(),
      "run finished"
    );
    Ok(summary)
  }
}

#[cfg(test)]
thread_local! {
  /// Worker index whose spawn fails on this thread's next run.
  static FAIL_SPAWN_AT: core::cell::Cell<Option<usize>> = const { core::cell::Cell::new(None) };
}

#[cfg(test)]
fn spawn_failure(index: usize) -> Option<io::Error> {
  FAIL_SPAWN_AT.with(|at| (at.get() == Some(index)).then(|| io::Error::other("thread limit reached")))
}

#[cfg(not(test))]
#[inline(always)]
fn spawn_failure(_: usize) -> Option<io::Error> {
  None
}

#[inline]
fn fits(count: usize, size: usize) -> bool {
  count.checked_mul(size).is_some_and(|bytes| bytes <= MAX_ALLOCATION)
}

/// Sets the stop flag if the owning worker unwinds.
struct StopOnPanic<'a>(&'a StopFlag);

impl Drop for StopOnPanic<'_> {
  fn drop(&mut self) {
    if thread::panicking() {
      self.0.trigger();
    }
  }
}

fn worker<C: Checker>(
  index: usize,
  state: &mut ThreadState<C>,
  config: &C::Config,
  table: &[C::Element],
  stop: &StopFlag,
  output: &DiagnosticOutput,
) {
  let _stop_on_panic = StopOnPanic(stop);
  let start = state.start;
  debug!(thread = index, start, "worker started");

  let (head, tail) = table.split_at(start);
  let first_pass = sweep::<C>(state, index, config, tail.iter().zip(start..), stop, output)
    && sweep::<C>(state, index, config, head.iter().zip(0..), stop, output);
  if first_pass {
    state.passes.increment();
    while sweep::<C>(state, index, config, table.iter().zip(0..), stop, output) {
      state.passes.increment();
    }
  }

  debug!(
    thread = index,
    checks = state.checks.get(),
    inconsistencies = state.inconsistencies.get(),
    "worker stopped"
  );
}

/// Check `elements` in order. Returns `false` if stopped before the end.
#[inline]
fn sweep<'t, C: Checker>(
  state: &mut ThreadState<C>,
  thread: usize,
  config: &C::Config,
  elements: impl Iterator<Item = (&'t C::Element, usize)>,
  stop: &StopFlag,
  output: &DiagnosticOutput,
) -> bool {
  for (element, index) in elements {
    if stop.is_set() {
      return false;
    }
    if C::check(&mut state.scratch, config, element) {
      state.inconsistencies.increment();
      report_mismatch::<C>(output, thread, index, config, element, &state.scratch);
    }
    state.checks.increment();
  }
  true
}

#[cold]
#[inline(never)]
fn report_mismatch<C: Checker>(
  output: &DiagnosticOutput,
  thread: usize,
  index: usize,
  config: &C::Config,
  element: &C::Element,
  scratch: &C::Scratch,
) {
  debug!(checker = C::NAME, thread, element = index, "mismatch");

  let mut out = output.lock();
  let written = writeln!(
    out,
    "Inconsistency detected: checker {}, element {index}, thread {thread}",
    C::NAME
  )
  .and_then(|()| C::report(&mut **out, config, element, scratch))
  .and_then(|()| out.flush());

  if let Err(err) = written {
    warn!(thread, element = index, %err, "could not write mismatch report");
  }
}
