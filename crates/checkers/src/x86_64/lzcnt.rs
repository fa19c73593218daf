//! Leading zero count (`lzcnt`).
//!
//! On CPUs without LZCNT the same encoding executes as `bsr`, so `init`
//! refuses to run there instead of reporting garbage.

use core::arch::asm;
use std::io::{self, Write};

use platform::caps::x86;
use rand::Rng;
use traits::{Checker, InitContext, InitError};

use crate::util::yes_no;

/// The `lzcnt` checker.
#[derive(Clone, Copy, Debug)]
pub struct Lzcnt;

/// A subject and the architectural results of `lzcnt` on it.
///
/// CF is set iff the source is zero; ZF is set iff the count is zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub subject: u64,
  pub count: u64,
  pub zf: bool,
  pub cf: bool,
}

impl Element {
  #[inline]
  #[must_use]
  pub const fn new(subject: u64) -> Self {
    let count = subject.leading_zeros() as u64;
    Self {
      subject,
      count,
      zf: count == 0,
      cf: subject == 0,
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub count: u64,
  pub zf: bool,
  pub cf: bool,
}

impl Checker for Lzcnt {
  const NAME: &'static str = "lzcnt";
  const DESCRIPTION: &'static str = "Counts leading zeroes using lzcnt";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.require(x86::LZCNT, "lzcnt")?;
    ctx.fill(table, table_size, |rng| {
      if rng.gen_ratio(1, 64) {
        Element::new(0)
      } else {
        let shift = rng.gen_range(0..64);
        Element::new(rng.r#gen::<u64>() >> shift)
      }
    });
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    let count: u64;
    let zf: u8;
    let cf: u8;
    // SAFETY: register-only sequence; `init` verified LZCNT support.
    unsafe {
      asm!(
        "lzcnt {count}, {subject}",
        "setz {zf}",
        "setc {cf}",
        subject = in(reg) element.subject,
        count = lateout(reg) count,
        zf = lateout(reg_byte) zf,
        cf = lateout(reg_byte) cf,
        options(nomem, nostack),
      );
    }
    scratch.count = count;
    scratch.zf = zf != 0;
    scratch.cf = cf != 0;

    scratch.count != element.count || scratch.zf != element.zf || scratch.cf != element.cf
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(out, "subject={:#x}", element.subject)?;
    writeln!(out, "count: expected={}, got={}", element.count, scratch.count)?;
    writeln!(out, "zf: expected={}, got={}", yes_no(element.zf), yes_no(scratch.zf))?;
    writeln!(out, "cf: expected={}, got={}", yes_no(element.cf), yes_no(scratch.cf))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn has_lzcnt() -> bool {
    platform::caps().has(x86::LZCNT)
  }

  #[test]
  fn oracle_for_zero() {
    let element = Element::new(0);
    assert_eq!(element.count, 64);
    assert!(!element.zf);
    assert!(element.cf);
  }

  #[test]
  fn oracle_for_top_bit() {
    let element = Element::new(0x8000_0000_0000_0000);
    assert_eq!(element.count, 0);
    assert!(element.zf);
    assert!(!element.cf);
  }

  #[test]
  fn oracle_for_one() {
    let element = Element::new(1);
    assert_eq!(element.count, 63);
    assert!(!element.zf);
    assert!(!element.cf);
  }

  #[test]
  fn hardware_agrees_on_edges() {
    if !has_lzcnt() {
      return;
    }
    let mut scratch = Scratch::default();
    for subject in [0, 1, 0x8000_0000_0000_0000, u64::MAX, 0x0000_0001_0000_0000] {
      let element = Element::new(subject);
      assert!(!Lzcnt::check(&mut scratch, &(), &element), "subject {subject:#x}: {scratch:?}");
    }
  }

  #[test]
  fn wrong_flag_is_reported() {
    if !has_lzcnt() {
      return;
    }
    let element = Element { zf: true, ..Element::new(0) };
    let mut scratch = Scratch::default();
    assert!(Lzcnt::check(&mut scratch, &(), &element));

    let mut out = Vec::new();
    Lzcnt::report(&mut out, &(), &element, &scratch).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("zf: expected=yes, got=no"));
  }
}
