//! Type-erased checker handles for registries.

use core::fmt;

use traits::Checker;

use crate::{Harness, HarnessError, RunConfig, RunSummary, StopFlag, output::DiagnosticOutput};

type RunFn = fn(&RunConfig, &StopFlag, &DiagnosticOutput) -> Result<RunSummary, HarnessError>;

/// A checker's metadata plus a monomorphized entry point into the harness.
///
/// Lets a registry hold heterogeneous checkers in one static slice.
#[derive(Clone, Copy)]
pub struct CheckerDescriptor {
  pub name: &'static str,
  pub description: &'static str,
  pub config_size: usize,
  pub element_size: usize,
  pub scratch_size: usize,
  run: RunFn,
}

impl CheckerDescriptor {
  #[must_use]
  pub const fn of<C: Checker>() -> Self {
    Self {
      name: C::NAME,
      description: C::DESCRIPTION,
      config_size: size_of::<C::Config>(),
      element_size: size_of::<C::Element>(),
      scratch_size: size_of::<C::Scratch>(),
      run: run_with::<C>,
    }
  }

  /// Run the harness for this checker.
  ///
  /// # Errors
  ///
  /// See [`Harness::new`] and [`Harness::run`].
  pub fn run(
    &self,
    config: &RunConfig,
    stop: &StopFlag,
    output: &DiagnosticOutput,
  ) -> Result<RunSummary, HarnessError> {
    (self.run)(config, stop, output)
  }
}

impl fmt::Debug for CheckerDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CheckerDescriptor")
      .field("name", &self.name)
      .field("config_size", &self.config_size)
      .field("element_size", &self.element_size)
      .field("scratch_size", &self.scratch_size)
      .finish_non_exhaustive()
  }
}

fn run_with<C: Checker>(
  config: &RunConfig,
  stop: &StopFlag,
  output: &DiagnosticOutput,
) -> Result<RunSummary, HarnessError> {
  Harness::<C>::new(config.clone())?.run(stop, output)
}
