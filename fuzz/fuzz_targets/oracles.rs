//! Fuzz target for checker oracles.
//!
//! Tests that, on a healthy CPU:
//! - No oracle panics on arbitrary operands
//! - Every live computation agrees with its precomputed oracle

#![no_main]

use arbitrary::Arbitrary;
use checkers::{AddSub, Bool, MulDiv, addsub, boolean, muldiv};
use libfuzzer_sys::fuzz_target;
use traits::Checker;

#[derive(Arbitrary, Debug)]
struct Input {
  a: u64,
  b: u64,
  c: u64,
  indices: [u64; 8],
  bytes: Vec<u8>,
  flips: Vec<(u16, u8)>,
}

fuzz_target!(|input: Input| {
  check_portable(&input);

  #[cfg(target_arch = "x86_64")]
  x86::check(&input);
});

fn agrees<C: Checker<Config = ()>>(element: &C::Element) {
  let mut scratch = C::Scratch::default();
  assert!(!C::check(&mut scratch, &(), element), "{} disagrees with its oracle", C::NAME);
}

fn check_portable(input: &Input) {
  agrees::<AddSub>(&addsub::Element::new(input.a, input.b, input.c));
  agrees::<Bool>(&boolean::Element::new(input.a, input.b));
  agrees::<MulDiv>(&muldiv::Element::from_draws(input.a, input.b, input.c));
}

#[cfg(target_arch = "x86_64")]
mod x86 {
  use checkers::x86_64::{
    BitScan, BitTest, Cmps, Lea, LodsStos, Lzcnt, SignExtend, bitscan, bittest, cmps, lea, lodsstos, lzcnt,
    signextend,
  };
  use platform::caps::x86;

  use super::{Input, agrees};

  pub(super) fn check(input: &Input) {
    agrees::<BitScan>(&bitscan::Element::new(input.a));
    agrees::<BitTest>(&bittest::Element::new(input.a, input.indices));
    agrees::<Lea>(&lea::Element::new(input.b, input.c % lea::MAX_OFFSET));
    agrees::<SignExtend>(&signextend::Element::new(input.a as i8, input.b as i16, input.c as i32));
    if platform::caps().has(x86::LZCNT) {
      agrees::<Lzcnt>(&lzcnt::Element::new(input.a));
    }

    let a: Box<[u8]> = input.bytes.iter().copied().take(cmps::MAX_LEN).collect();
    let mut b = a.clone();
    if !b.is_empty() {
      for &(at, xor) in input.flips.iter().take(cmps::MISMATCH_COUNT) {
        let at = usize::from(at) % b.len();
        b[at] ^= xor;
      }
    }
    agrees::<Cmps>(&cmps::Element::new(a, b));

    let src = input.bytes.iter().copied().take(lodsstos::MAX_LEN).collect();
    agrees::<LodsStos>(&lodsstos::Element { src });
  }
}
