//! String comparison with `repz cmps` at every word size.
//!
//! Each element holds two byte strings that differ in a few places. For every
//! word size the oracle lists the indices of the first [`MISMATCH_COUNT`]
//! differing words; the live side finds them by restarting `repz cmps` right
//! after each difference.

use core::arch::asm;
use std::io::{self, Write};

use rand::{Rng, rngs::StdRng};
use traits::{Checker, InitContext, InitError};

use crate::util::{hex_dump, try_buffer, yes_no};

/// Strings are shorter than this.
pub const MAX_LEN: usize = 256;

/// Differences injected per element, and word indices recorded per word size.
pub const MISMATCH_COUNT: usize = 5;

/// Word sizes exercised, in bytes: `cmpsb`, `cmpsw`, `cmpsd`, `cmpsq`.
pub const WORD_SIZES: [usize; 4] = [1, 2, 4, 8];

const WORD_NAMES: [&str; 4] = ["byte", "word", "dword", "qword"];

/// Indices of differing words, `None`-padded.
pub type Mismatches = [Option<usize>; MISMATCH_COUNT];

/// The `cmps` checker.
#[derive(Clone, Copy, Debug)]
pub struct Cmps;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
  pub a: Box<[u8]>,
  pub b: Box<[u8]>,
  /// Oracle per entry of [`WORD_SIZES`].
  pub mismatches: [Mismatches; 4],
}

impl Element {
  /// Compute the oracle for two strings of equal length.
  ///
  /// Strings with more than [`MISMATCH_COUNT`] differing words would make the
  /// live side flag `too_much`, so callers keep the difference count small.
  #[must_use]
  pub fn new(a: Box<[u8]>, b: Box<[u8]>) -> Self {
    let mismatches = WORD_SIZES.map(|size| expected_mismatches(&a, &b, size));
    Self { a, b, mismatches }
  }

  /// A random string pair with up to [`MISMATCH_COUNT`] differences.
  ///
  /// # Errors
  ///
  /// [`InitError::Allocation`] when either string cannot be allocated.
  pub fn random(rng: &mut StdRng) -> Result<Self, InitError> {
    let len = rng.gen_range(0..MAX_LEN);
    let a = try_buffer(len, "cmps string", |_| rng.r#gen())?;
    let mut b = try_buffer(len, "cmps string", |i| a[i])?;

    let mut from = 0;
    for _ in 0..MISMATCH_COUNT {
      if from >= len {
        break;
      }
      let at = from + rng.gen_range(0..len - from);
      b[at] = a[at] ^ rng.gen_range(1..=u8::MAX);
      from = at + 1;
    }
    Ok(Self::new(a, b))
  }
}

/// Portable oracle: first differing word indices at `word_size`.
fn expected_mismatches(a: &[u8], b: &[u8], word_size: usize) -> Mismatches {
  let mut found = [None; MISMATCH_COUNT];
  let differing = a
    .chunks_exact(word_size)
    .zip(b.chunks_exact(word_size))
    .enumerate()
    .filter(|(_, (x, y))| x != y)
    .map(|(index, _)| index);
  for (slot, index) in found.iter_mut().zip(differing) {
    *slot = Some(index);
  }
  found
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub mismatches: [Mismatches; 4],
  /// More than [`MISMATCH_COUNT`] differences were found at some word size.
  pub too_much: bool,
}

macro_rules! repz_cmps {
  ($name:ident, $insn:literal) => {
    /// Compare up to `words` words of the instruction's width.
    ///
    /// Returns the words consumed, including the first differing one, and
    /// whether everything consumed was equal.
    ///
    /// # Safety
    ///
    /// Both pointers must be valid for reads of `words` words.
    #[inline(always)]
    unsafe fn $name(a: *const u8, b: *const u8, words: usize) -> (usize, bool) {
      let mut remaining = words;
      let equal: u8;
      // SAFETY: the caller guarantees both ranges are readable. DF is clear on
      // entry to `asm!`, so the compare walks upwards.
      unsafe {
        asm!(
          concat!("repz ", $insn),
          "setz {equal}",
          equal = out(reg_byte) equal,
          inout("rcx") remaining,
          inout("rsi") a => _,
          inout("rdi") b => _,
          options(att_syntax, readonly, nostack),
        );
      }
      (words.saturating_sub(remaining), equal != 0)
    }
  };
}

repz_cmps!(repz_cmpsb, "cmpsb");
repz_cmps!(repz_cmpsw, "cmpsw");
repz_cmps!(repz_cmpsl, "cmpsl");
repz_cmps!(repz_cmpsq, "cmpsq");

/// Walk both strings at one word size, recording differing word indices.
///
/// Returns `true` if more than [`MISMATCH_COUNT`] were found.
#[inline(always)]
fn scan(
  a: &[u8],
  b: &[u8],
  word_size: usize,
  found: &mut Mismatches,
  compare: unsafe fn(*const u8, *const u8, usize) -> (usize, bool),
) -> bool {
  let words = a.len().min(b.len()) / word_size;
  let mut next = 0;
  let mut recorded = 0;
  let mut too_much = false;
  *found = [None; MISMATCH_COUNT];

  while next < words {
    let offset = next * word_size;
    // SAFETY: `next < words`, so `words - next` whole words remain in both
    // strings starting at `offset`.
    let (consumed, equal) = unsafe { compare(a[offset..].as_ptr(), b[offset..].as_ptr(), words - next) };
    // A corrupted count must not stall the worker.
    next += consumed.max(1);
    if !equal {
      if recorded == MISMATCH_COUNT {
        too_much = true;
      } else {
        found[recorded] = Some(next - 1);
        recorded += 1;
      }
    }
  }
  too_much
}

impl Checker for Cmps {
  const NAME: &'static str = "cmps";
  const DESCRIPTION: &'static str = "Performs string comparisons on different word sizes (cmpsb, cmpsw, cmpsd, cmpsq)";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.try_fill(table, table_size, Element::random)
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    let (a, b) = (&element.a[..], &element.b[..]);
    let [byte, word, dword, qword] = &mut scratch.mismatches;
    let mut too_much = scan(a, b, 1, byte, repz_cmpsb);
    too_much |= scan(a, b, 2, word, repz_cmpsw);
    too_much |= scan(a, b, 4, dword, repz_cmpsl);
    too_much |= scan(a, b, 8, qword, repz_cmpsq);
    scratch.too_much = too_much;

    scratch.too_much || scratch.mismatches != element.mismatches
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    hex_dump(out, "a=", &element.a)?;
    hex_dump(out, "b=", &element.b)?;
    for ((name, expected), got) in WORD_NAMES.iter().zip(&element.mismatches).zip(&scratch.mismatches) {
      writeln!(out, "{name}: expected={}, got={}", render(expected), render(got))?;
    }
    writeln!(out, "too many differences: {}", yes_no(scratch.too_much))
  }

  fn cleanup(_: &(), table: &mut [Element]) {
    for element in table {
      element.a = Box::default();
      element.b = Box::default();
    }
  }
}

fn render(mismatches: &Mismatches) -> String {
  let parts: Vec<String> = mismatches
    .iter()
    .map(|m| m.map_or_else(|| "-".to_owned(), |index| index.to_string()))
    .collect();
  format!("[{}]", parts.join(", "))
}
