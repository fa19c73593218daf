//! Bit scan forward and reverse (`bsf`, `bsr`).

use core::arch::asm;
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

use crate::util::yes_no;

/// The `bitscan` checker.
#[derive(Clone, Copy, Debug)]
pub struct BitScan;

/// A word and the indices of its lowest and highest set bits.
///
/// The indices are meaningless when `zero` is set; only ZF is compared then.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub a: u64,
  pub zero: bool,
  pub lowest: u64,
  pub highest: u64,
}

impl Element {
  #[inline]
  #[must_use]
  pub const fn new(a: u64) -> Self {
    if a == 0 {
      return Self {
        a,
        zero: true,
        lowest: 0,
        highest: 0,
      };
    }
    Self {
      a,
      zero: false,
      lowest: a.trailing_zeros() as u64,
      highest: 63 - a.leading_zeros() as u64,
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub lowest: u64,
  pub highest: u64,
  pub forward_zf: bool,
  pub reverse_zf: bool,
}

impl Checker for BitScan {
  const NAME: &'static str = "bitscan";
  const DESCRIPTION: &'static str = "Performs bit scanning (bsf/bsr)";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| {
      if rng.gen_ratio(1, 64) {
        Element::new(0)
      } else {
        // Mask both ends so set bits land anywhere in the word.
        let high = rng.gen_range(0..64);
        let low = rng.gen_range(0..64);
        Element::new((rng.r#gen::<u64>() >> high) << low)
      }
    });
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    let lowest: u64;
    let highest: u64;
    let forward_zf: u8;
    let reverse_zf: u8;
    // SAFETY: register-only sequence using baseline x86_64 instructions.
    unsafe {
      asm!(
        "bsf {lowest}, {a}",
        "setz {forward_zf}",
        "bsr {highest}, {a}",
        "setz {reverse_zf}",
        a = in(reg) element.a,
        lowest = out(reg) lowest,
        highest = out(reg) highest,
        forward_zf = out(reg_byte) forward_zf,
        reverse_zf = out(reg_byte) reverse_zf,
        options(nomem, nostack),
      );
    }
    scratch.lowest = lowest;
    scratch.highest = highest;
    scratch.forward_zf = forward_zf != 0;
    scratch.reverse_zf = reverse_zf != 0;

    let flags_ok = scratch.forward_zf == element.zero && scratch.reverse_zf == scratch.forward_zf;
    let indices_ok = scratch.forward_zf || (scratch.lowest == element.lowest && scratch.highest == element.highest);
    !(flags_ok && indices_ok)
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(out, "a={:#x}", element.a)?;
    writeln!(out, "lowest set bit: expected={}, got={}", element.lowest, scratch.lowest)?;
    writeln!(out, "highest set bit: expected={}, got={}", element.highest, scratch.highest)?;
    writeln!(
      out,
      "zero: expected={}, got (bsf)={}, got (bsr)={}",
      yes_no(element.zero),
      yes_no(scratch.forward_zf),
      yes_no(scratch.reverse_zf)
    )
  }
}
