//! Bit test family (`bt`, `btc`, `btr`, `bts`).

use core::arch::asm;
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

use crate::util::yes_no;

/// Bit positions tested per element.
pub const TESTS_PER_ELEMENT: usize = 8;

/// The `bittest` checker.
#[derive(Clone, Copy, Debug)]
pub struct BitTest;

/// One bit position of a word and the expected outcome of each instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Probe {
  pub index: u64,
  /// Expected CF for all four instructions.
  pub set: bool,
  pub toggled: u64,
  pub cleared: u64,
  pub forced: u64,
}

impl Probe {
  #[inline]
  #[must_use]
  pub const fn new(a: u64, index: u64) -> Self {
    let mask = 1u64 << (index % 64);
    Self {
      index,
      set: a & mask != 0,
      toggled: a ^ mask,
      cleared: a & !mask,
      forced: a | mask,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub a: u64,
  pub probes: [Probe; TESTS_PER_ELEMENT],
}

impl Element {
  #[must_use]
  pub fn new(a: u64, indices: [u64; TESTS_PER_ELEMENT]) -> Self {
    Self {
      a,
      probes: indices.map(|index| Probe::new(a, index % 64)),
    }
  }
}

/// Live results for one probe.
#[derive(Clone, Copy, Debug, Default)]
pub struct Outcome {
  pub cf_bt: bool,
  pub cf_btc: bool,
  pub cf_btr: bool,
  pub cf_bts: bool,
  pub toggled: u64,
  pub cleared: u64,
  pub forced: u64,
}

impl Outcome {
  #[inline]
  fn matches(&self, probe: &Probe) -> bool {
    self.cf_bt == probe.set
      && self.cf_btc == probe.set
      && self.cf_btr == probe.set
      && self.cf_bts == probe.set
      && self.toggled == probe.toggled
      && self.cleared == probe.cleared
      && self.forced == probe.forced
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub outcomes: [Outcome; TESTS_PER_ELEMENT],
}

#[inline(always)]
fn run_probe(a: u64, index: u64) -> Outcome {
  let (cf_bt, cf_btc, cf_btr, cf_bts): (u8, u8, u8, u8);
  let (toggled, cleared, forced): (u64, u64, u64);
  // SAFETY: register-only sequence using baseline x86_64 instructions. Register
  // forms of bt* take the index modulo 64, and `index < 64` anyway.
  unsafe {
    asm!(
      "bt {a}, {index}",
      "setc {cf_bt}",
      "mov {toggled}, {a}",
      "btc {toggled}, {index}",
      "setc {cf_btc}",
      "mov {cleared}, {a}",
      "btr {cleared}, {index}",
      "setc {cf_btr}",
      "mov {forced}, {a}",
      "bts {forced}, {index}",
      "setc {cf_bts}",
      a = in(reg) a,
      index = in(reg) index,
      toggled = out(reg) toggled,
      cleared = out(reg) cleared,
      forced = out(reg) forced,
      cf_bt = out(reg_byte) cf_bt,
      cf_btc = out(reg_byte) cf_btc,
      cf_btr = out(reg_byte) cf_btr,
      cf_bts = out(reg_byte) cf_bts,
      options(nomem, nostack),
    );
  }
  Outcome {
    cf_bt: cf_bt != 0,
    cf_btc: cf_btc != 0,
    cf_btr: cf_btr != 0,
    cf_bts: cf_bts != 0,
    toggled,
    cleared,
    forced,
  }
}

impl Checker for BitTest {
  const NAME: &'static str = "bittest";
  const DESCRIPTION: &'static str = "Performs bit testing (bt, btc, btr, bts)";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| {
      let a = rng.r#gen();
      Element::new(a, core::array::from_fn(|_| rng.gen_range(0..64)))
    });
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    for (outcome, probe) in scratch.outcomes.iter_mut().zip(&element.probes) {
      *outcome = run_probe(element.a, probe.index);
    }
    !scratch
      .outcomes
      .iter()
      .zip(&element.probes)
      .all(|(outcome, probe)| outcome.matches(probe))
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(out, "a={:#x}", element.a)?;
    for (outcome, probe) in scratch.outcomes.iter().zip(&element.probes) {
      writeln!(out, "bit index={}", probe.index)?;
      writeln!(
        out,
        "bit set: expected={}, got (bt)={}, got (btc)={}, got (btr)={}, got (bts)={}",
        yes_no(probe.set),
        yes_no(outcome.cf_bt),
        yes_no(outcome.cf_btc),
        yes_no(outcome.cf_btr),
        yes_no(outcome.cf_bts)
      )?;
      writeln!(out, "btc: expected={:#x}, got={:#x}", probe.toggled, outcome.toggled)?;
      writeln!(out, "btr: expected={:#x}, got={:#x}", probe.cleared, outcome.cleared)?;
      writeln!(out, "bts: expected={:#x}, got={:#x}", probe.forced, outcome.forced)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn probe_oracle() {
    let probe = Probe::new(0b1010, 1);
    assert!(probe.set);
    assert_eq!(probe.toggled, 0b1000);
    assert_eq!(probe.cleared, 0b1000);
    assert_eq!(probe.forced, 0b1010);

    let probe = Probe::new(0b1010, 63);
    assert!(!probe.set);
    assert_eq!(probe.forced, 0b1010 | 1 << 63);
  }

  #[test]
  fn hardware_agrees() {
    let mut scratch = Scratch::default();
    for a in [0, u64::MAX, 0x5555_5555_5555_5555, 0x8000_0000_0000_0001] {
      let element = Element::new(a, [0, 1, 7, 31, 32, 62, 63, 5]);
      assert!(!BitTest::check(&mut scratch, &(), &element), "a={a:#x}");
    }
  }

  #[test]
  fn one_bad_probe_fails_the_element() {
    let mut element = Element::new(0xff, [0, 1, 2, 3, 4, 5, 6, 7]);
    element.probes[5].cleared ^= 1 << 40;
    let mut scratch = Scratch::default();
    assert!(BitTest::check(&mut scratch, &(), &element));

    let mut out = Vec::new();
    BitTest::report(&mut out, &(), &element, &scratch).unwrap();
    let report = String::from_utf8(out).unwrap();
    assert_eq!(report.matches("bit index=").count(), TESTS_PER_ELEMENT);
  }
}
