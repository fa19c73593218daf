//! Harness errors.

use std::io;

use thiserror::Error;
use traits::InitError;

/// Coarse classification of a [`HarnessError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// Size overflow or allocation failure before the run starts.
  Resource,
  /// The checker refused to build its table.
  Initialization,
  /// A worker could not be started, or the run could not be set up.
  ThreadSpawn,
  /// A worker died during the run.
  Runtime,
}

/// Fatal errors of a harness run.
///
/// Detected miscomputations are not errors: they are counted and reported
/// while the run goes on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HarnessError {
  /// `table_size * element_size` does not fit the address space.
  #[error("requested table size is too big: {table_size} elements of {element_size} bytes")]
  TableTooLarge { table_size: usize, element_size: usize },

  /// `threads * state_size` does not fit the address space.
  #[error("requested thread count is too big: {threads} threads of {state_size} bytes of state")]
  TooManyThreads { threads: usize, state_size: usize },

  /// The allocator refused a startup allocation.
  #[error("could not allocate {what}")]
  AllocationFailed { what: &'static str },

  /// The checker's `init` failed.
  #[error("error while initialising table: {0}")]
  Init(#[from] InitError),

  /// Signal handlers could not be installed.
  #[error("could not install signal handler: {0}")]
  SignalHandler(#[source] io::Error),

  /// The OS refused to start a worker; the others were stopped and joined.
  #[error("issue when spawning thread {index}: {source}")]
  ThreadSpawn { index: usize, source: io::Error },

  /// A worker panicked; the others were stopped and joined.
  #[error("worker thread {index} panicked")]
  WorkerPanicked { index: usize },
}

impl HarnessError {
  #[must_use]
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::TableTooLarge { .. } | Self::TooManyThreads { .. } | Self::AllocationFailed { .. } => ErrorKind::Resource,
      Self::Init(_) => ErrorKind::Initialization,
      Self::SignalHandler(_) | Self::ThreadSpawn { .. } => ErrorKind::ThreadSpawn,
      Self::WorkerPanicked { .. } => ErrorKind::Runtime,
    }
  }
}
