//! Address arithmetic through `lea` with every scale factor.

use core::arch::asm;
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

/// Offsets stay below this bound.
pub const MAX_OFFSET: u64 = 256;

/// The `lea` checker.
#[derive(Clone, Copy, Debug)]
pub struct Lea;

/// `base + offset * scale` for scale 1, 2, 4 and 8, wrapping like the hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub base: u64,
  pub offset: u64,
  pub scaled: [u64; 4],
}

impl Element {
  #[inline]
  #[must_use]
  pub const fn new(base: u64, offset: u64) -> Self {
    Self {
      base,
      offset,
      scaled: [
        base.wrapping_add(offset),
        base.wrapping_add(offset.wrapping_mul(2)),
        base.wrapping_add(offset.wrapping_mul(4)),
        base.wrapping_add(offset.wrapping_mul(8)),
      ],
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub scaled: [u64; 4],
}

impl Checker for Lea {
  const NAME: &'static str = "lea";
  const DESCRIPTION: &'static str = "Performs integer additions and multiplications using lea";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| Element::new(rng.r#gen(), rng.gen_range(0..MAX_OFFSET)));
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    let (by1, by2, by4, by8): (u64, u64, u64, u64);
    // SAFETY: `lea` only computes an address; nothing is dereferenced.
    unsafe {
      asm!(
        "lea {by1}, [{base} + {offset}]",
        "lea {by2}, [{base} + {offset} * 2]",
        "lea {by4}, [{base} + {offset} * 4]",
        "lea {by8}, [{base} + {offset} * 8]",
        base = in(reg) element.base,
        offset = in(reg) element.offset,
        by1 = out(reg) by1,
        by2 = out(reg) by2,
        by4 = out(reg) by4,
        by8 = out(reg) by8,
        options(nomem, nostack, preserves_flags),
      );
    }
    scratch.scaled = [by1, by2, by4, by8];
    scratch.scaled != element.scaled
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(out, "base={:#x}, offset={:#x}", element.base, element.offset)?;
    for (scale, (expected, got)) in [1, 2, 4, 8].iter().zip(element.scaled.iter().zip(&scratch.scaled)) {
      writeln!(out, "scale {scale}: expected={expected:#x}, got={got:#x}")?;
    }
    Ok(())
  }
}
