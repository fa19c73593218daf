//! Bitwise and, or, xor and not.

use core::hint::black_box;
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

/// The `bool` checker.
#[derive(Clone, Copy, Debug)]
pub struct Bool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub a: u64,
  pub b: u64,
  pub and: u64,
  pub or: u64,
  pub xor: u64,
  pub not_a: u64,
}

impl Element {
  #[inline]
  #[must_use]
  pub const fn new(a: u64, b: u64) -> Self {
    Self {
      a,
      b,
      and: a & b,
      or: a | b,
      xor: a ^ b,
      not_a: !a,
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub and: u64,
  pub or: u64,
  pub xor: u64,
  pub not_a: u64,
}

impl Checker for Bool {
  const NAME: &'static str = "bool";
  const DESCRIPTION: &'static str = "Performs boolean and, or, xor, and not";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| Element::new(rng.r#gen(), rng.r#gen()));
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    let a = black_box(element.a);
    let b = black_box(element.b);
    scratch.and = a & b;
    scratch.or = a | b;
    scratch.xor = a ^ b;
    scratch.not_a = !a;

    scratch.and != element.and
      || scratch.or != element.or
      || scratch.xor != element.xor
      || scratch.not_a != element.not_a
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(out, "a={:#x}, b={:#x}", element.a, element.b)?;
    writeln!(out, "and: expected={:#x}, got={:#x}", element.and, scratch.and)?;
    writeln!(out, "or: expected={:#x}, got={:#x}", element.or, scratch.or)?;
    writeln!(out, "xor: expected={:#x}, got={:#x}", element.xor, scratch.xor)?;
    writeln!(out, "not a: expected={:#x}, got={:#x}", element.not_a, scratch.not_a)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_values() {
    let element = Element::new(0b1100, 0b1010);
    assert_eq!(element.and, 0b1000);
    assert_eq!(element.or, 0b1110);
    assert_eq!(element.xor, 0b0110);
    assert_eq!(element.not_a, !0b1100);

    let mut scratch = Scratch::default();
    assert!(!Bool::check(&mut scratch, &(), &element));
  }

  #[test]
  fn any_wrong_field_is_a_mismatch() {
    let good = Element::new(0xdead_beef, 0x1234_5678);
    let mut scratch = Scratch::default();
    for bad in [
      Element { and: good.and ^ 1, ..good },
      Element { or: good.or ^ 1, ..good },
      Element { xor: good.xor ^ 1, ..good },
      Element { not_a: good.not_a ^ 1, ..good },
    ] {
      assert!(Bool::check(&mut scratch, &(), &bad));
    }
  }

  #[test]
  fn report_names_every_field() {
    let element = Element::new(1, 2);
    let mut scratch = Scratch::default();
    Bool::check(&mut scratch, &(), &element);

    let mut out = Vec::new();
    Bool::report(&mut out, &(), &element, &scratch).unwrap();
    let report = String::from_utf8(out).unwrap();
    for field in ["and:", "or:", "xor:", "not a:"] {
      assert!(report.contains(field), "{report}");
    }
  }
}
