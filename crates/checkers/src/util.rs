//! Helpers shared by checkers: fallible buffers and report formatting.

use std::io::{self, Write};

use traits::InitError;

/// A `len`-byte buffer filled by `byte(i)`.
///
/// Fails with [`InitError::Allocation`] instead of aborting when the memory is
/// not available.
pub(crate) fn try_buffer(
  len: usize,
  what: &'static str,
  byte: impl FnMut(usize) -> u8,
) -> Result<Box<[u8]>, InitError> {
  let mut buf = Vec::new();
  buf.try_reserve_exact(len).map_err(|_| InitError::Allocation { what })?;
  buf.extend((0..len).map(byte));
  Ok(buf.into_boxed_slice())
}

/// `label` followed by `bytes` as space-separated hex, on one line.
pub(crate) fn hex_dump(out: &mut dyn Write, label: &str, bytes: &[u8]) -> io::Result<()> {
  write!(out, "{label} ({} bytes):", bytes.len())?;
  for byte in bytes {
    write!(out, " {byte:02x}")?;
  }
  writeln!(out)
}

#[inline]
pub(crate) const fn yes_no(flag: bool) -> &'static str {
  if flag { "yes" } else { "no" }
}
