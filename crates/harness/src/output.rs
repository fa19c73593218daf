//! The shared diagnostic sink.
//!
//! Mismatch reports from all workers go to one writer behind one mutex, so a
//! report is always written as a contiguous block.

use std::{
  io::{self, Write},
  sync::Arc,
};

use parking_lot::Mutex;

/// Where mismatch reports go.
pub type DiagnosticOutput = Mutex<Box<dyn Write + Send>>;

/// Reports to standard error.
#[must_use]
pub fn stderr() -> DiagnosticOutput {
  Mutex::new(Box::new(io::stderr()))
}

/// An in-memory sink whose contents stay readable after handing it out.
#[derive(Clone, Debug, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// A diagnostic output writing into this buffer.
  #[must_use]
  pub fn output(&self) -> DiagnosticOutput {
    Mutex::new(Box::new(self.clone()))
  }

  /// Everything written so far, lossily decoded.
  #[must_use]
  pub fn contents(&self) -> String {
    String::from_utf8_lossy(&self.0.lock()).into_owned()
  }
}

impl Write for CapturedOutput {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.lock().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}
