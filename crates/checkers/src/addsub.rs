//! Integer addition and subtraction: `a + b - c`.

use core::hint::black_box;
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

/// The `addsub` checker.
#[derive(Clone, Copy, Debug)]
pub struct AddSub;

/// Inputs and the wrapping oracle `a + b - c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub a: u64,
  pub b: u64,
  pub c: u64,
  pub res: u64,
}

impl Element {
  #[inline]
  #[must_use]
  pub const fn new(a: u64, b: u64, c: u64) -> Self {
    Self {
      a,
      b,
      c,
      res: a.wrapping_add(b).wrapping_sub(c),
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub res: u64,
}

impl Checker for AddSub {
  const NAME: &'static str = "addsub";
  const DESCRIPTION: &'static str = "Performs integer additions and subtractions";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| Element::new(rng.r#gen(), rng.r#gen(), rng.r#gen()));
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    scratch.res = black_box(element.a)
      .wrapping_add(black_box(element.b))
      .wrapping_sub(black_box(element.c));
    scratch.res != element.res
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(out, "a={:#x}, b={:#x}, c={:#x}", element.a, element.b, element.c)?;
    writeln!(out, "res: expected={:#x}, got={:#x}", element.res, scratch.res)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matching_oracle() {
    let element = Element::new(5, 3, 2);
    assert_eq!(element.res, 6);

    let mut scratch = Scratch::default();
    assert!(!AddSub::check(&mut scratch, &(), &element));
    assert_eq!(scratch.res, 6);
  }

  #[test]
  fn corrupted_oracle_is_reported() {
    let element = Element { res: 7, ..Element::new(5, 3, 2) };
    let mut scratch = Scratch::default();
    assert!(AddSub::check(&mut scratch, &(), &element));

    let mut out = Vec::new();
    AddSub::report(&mut out, &(), &element, &scratch).unwrap();
    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("expected=0x7"), "{report}");
    assert!(report.contains("got=0x6"), "{report}");
  }

  #[test]
  fn wraps() {
    let element = Element::new(u64::MAX, 2, 0);
    assert_eq!(element.res, 1);
    assert_eq!(Element::new(0, 0, 1).res, u64::MAX);
  }
}
