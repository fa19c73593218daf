//! Cooperative cancellation.
//!
//! Workers poll a [`StopFlag`] between elements. Signal handlers do nothing
//! but set that flag; all joining and reporting happens on ordinary threads.

use std::{
  io,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use signal_hook::{
  SigId,
  consts::{SIGINT, SIGTERM},
};

/// A shared "please stop" flag.
///
/// Clones observe the same flag. Once set, it stays set.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Request every observer to stop.
  #[inline]
  pub fn trigger(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  /// Cheap poll; a worker may finish its current element before seeing it.
  #[inline(always)]
  #[must_use]
  pub fn is_set(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

/// SIGINT/SIGTERM handlers that set a [`StopFlag`].
///
/// The handlers are removed when the guard is dropped.
#[derive(Debug)]
pub struct SignalGuard {
  ids: Vec<SigId>,
}

impl SignalGuard {
  /// Install handlers for SIGINT and SIGTERM.
  ///
  /// On failure, whatever was installed so far is removed again.
  pub fn register(stop: &StopFlag) -> io::Result<Self> {
    let mut guard = Self { ids: Vec::with_capacity(2) };
    for signal in [SIGINT, SIGTERM] {
      let id = signal_hook::flag::register(signal, Arc::clone(&stop.0))?;
      guard.ids.push(id);
    }
    Ok(guard)
  }
}

impl Drop for SignalGuard {
  fn drop(&mut self) {
    for id in self.ids.drain(..) {
      signal_hook::low_level::unregister(id);
    }
  }
}
