//! Checker initialisation errors.

use thiserror::Error;

/// Why a checker could not build its table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InitError {
  /// The CPU lacks an instruction the checker exercises.
  #[error("CPU does not support {feature}")]
  MissingFeature { feature: &'static str },

  /// An element-owned buffer could not be allocated.
  #[error("could not allocate {what}")]
  Allocation { what: &'static str },

  /// `init` returned without populating every element.
  #[error("checker initialised {actual} of {expected} table elements")]
  IncompleteTable { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_messages() {
    assert_eq!(
      InitError::MissingFeature { feature: "lzcnt" }.to_string(),
      "CPU does not support lzcnt"
    );
    assert_eq!(
      InitError::Allocation { what: "string buffer" }.to_string(),
      "could not allocate string buffer"
    );
    assert_eq!(
      InitError::IncompleteTable { expected: 4, actual: 3 }.to_string(),
      "checker initialised 3 of 4 table elements"
    );
  }

  #[test]
  fn trait_bounds() {
    fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
    assert_send_sync::<InitError>();
  }
}
