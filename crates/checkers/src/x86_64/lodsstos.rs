//! String copy through a `lods`/`stos` loop at every word size.

use core::arch::asm;
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

use crate::util::{hex_dump, try_buffer};

/// Sources are shorter than this.
pub const MAX_LEN: usize = 1024;

const VARIANTS: [(usize, &str); 4] = [(1, "lodsb/stosb"), (2, "lodsw/stosw"), (4, "lodsl/stosl"), (8, "lodsq/stosq")];

/// The `lodsstos` checker.
#[derive(Clone, Copy, Debug)]
pub struct LodsStos;

/// A random source string; the oracle is the source itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
  pub src: Box<[u8]>,
}

/// One destination buffer per word size plus the loop counters left behind.
#[derive(Clone, Debug)]
pub struct Scratch {
  pub copies: [[u8; MAX_LEN]; 4],
  /// Loop counter after each copy; zero when the loop ran to completion.
  pub remaining: [u64; 4],
}

impl Default for Scratch {
  fn default() -> Self {
    Self {
      copies: [[0; MAX_LEN]; 4],
      remaining: [0; 4],
    }
  }
}

macro_rules! lods_stos {
  ($name:ident, $lods:literal, $stos:literal) => {
    /// Copy `words` words from `src` to `dst`, one load and one store at a time.
    ///
    /// Returns the loop counter left in the register.
    ///
    /// # Safety
    ///
    /// `words` must be non-zero, `src` readable and `dst` writable for `words`
    /// words, and the two ranges must not overlap.
    #[inline(always)]
    unsafe fn $name(src: *const u8, dst: *mut u8, words: u64) -> u64 {
      let remaining: u64;
      // SAFETY: guaranteed by the caller. DF is clear on entry to `asm!`, so
      // both pointers advance.
      unsafe {
        asm!(
          "2:",
          $lods,
          $stos,
          "decq {count}",
          "jnz 2b",
          count = inout(reg) words => remaining,
          inout("rsi") src => _,
          inout("rdi") dst => _,
          out("rax") _,
          options(att_syntax, nostack),
        );
      }
      remaining
    }
  };
}

lods_stos!(copy_bytes, "lodsb", "stosb");
lods_stos!(copy_words, "lodsw", "stosw");
lods_stos!(copy_dwords, "lodsl", "stosl");
lods_stos!(copy_qwords, "lodsq", "stosq");

impl Checker for LodsStos {
  const NAME: &'static str = "lodsstos";
  const DESCRIPTION: &'static str = "Performs string copy using lods* and stos*";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.try_fill(table, table_size, |rng| {
      let len = rng.gen_range(0..MAX_LEN);
      let src = try_buffer(len, "lodsstos source", |_| rng.r#gen())?;
      Ok(Element { src })
    })
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    let src = &element.src[..element.src.len().min(MAX_LEN)];
    let copies: [unsafe fn(*const u8, *mut u8, u64) -> u64; 4] = [copy_bytes, copy_words, copy_dwords, copy_qwords];

    let mut mismatch = false;
    for (((&(size, _), copy), dst), remaining) in VARIANTS
      .iter()
      .zip(copies)
      .zip(scratch.copies.iter_mut())
      .zip(scratch.remaining.iter_mut())
    {
      let words = src.len() / size;
      if words == 0 {
        *remaining = 0;
        continue;
      }
      // SAFETY: `words * size <= src.len() <= MAX_LEN == dst.len()`, and the
      // scratch buffer is disjoint from the table.
      *remaining = unsafe { copy(src.as_ptr(), dst.as_mut_ptr(), words as u64) };
      let copied = words * size;
      mismatch |= *remaining != 0 || dst[..copied] != src[..copied];
    }
    mismatch
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    hex_dump(out, "src=", &element.src)?;
    for ((&(size, name), copy), remaining) in VARIANTS.iter().zip(&scratch.copies).zip(&scratch.remaining) {
      let copied = (element.src.len() / size * size).min(MAX_LEN);
      hex_dump(out, &format!("{name} result="), &copy[..copied])?;
      if *remaining != 0 {
        writeln!(out, "{name}: loop stopped with {remaining} words left")?;
      }
    }
    Ok(())
  }

  fn cleanup(_: &(), table: &mut [Element]) {
    for element in table {
      element.src = Box::default();
    }
  }
}
