//! Integer division and multiplication: `a / b * c`.

use core::{hint::black_box, num::NonZeroU64};
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

/// The `muldiv` checker.
#[derive(Clone, Copy, Debug)]
pub struct MulDiv;

/// Inputs with `a >= b >= 1` and the oracle `a / b * c` (wrapping multiply).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub a: u64,
  pub b: NonZeroU64,
  pub c: u64,
  pub res: u64,
}

impl Element {
  #[inline]
  #[must_use]
  pub const fn new(a: u64, b: NonZeroU64, c: u64) -> Self {
    Self {
      a,
      b,
      c,
      res: (a / b.get()).wrapping_mul(c),
    }
  }

  /// Order two raw draws so the dividend is the larger one.
  #[must_use]
  pub fn from_draws(x: u64, y: u64, c: u64) -> Self {
    let b = NonZeroU64::new(x.min(y)).unwrap_or(NonZeroU64::MIN);
    let a = x.max(y).max(b.get());
    Self::new(a, b, c)
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub res: u64,
}

impl Checker for MulDiv {
  const NAME: &'static str = "muldiv";
  const DESCRIPTION: &'static str = "Performs integer multiplications and divisions";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| {
      // Varying the divisor width keeps quotients spread over the full range.
      let shift = rng.gen_range(0..64);
      Element::from_draws(rng.r#gen(), rng.r#gen::<u64>() >> shift, rng.r#gen())
    });
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    scratch.res = (black_box(element.a) / black_box(element.b)).wrapping_mul(black_box(element.c));
    scratch.res != element.res
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(out, "a={}, b={}, c={}", element.a, element.b, element.c)?;
    writeln!(out, "res: expected={:#x}, got={:#x}", element.res, scratch.res)
  }
}
