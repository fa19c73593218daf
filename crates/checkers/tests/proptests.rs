//! Property tests: live computation agrees with the portable oracle.

// Proptest uses getcwd() which fails under Miri isolation.
#![cfg(not(miri))]

use core::num::NonZeroU64;

use checkers::{AddSub, Bool, MulDiv, addsub, boolean, muldiv};
use proptest::prelude::*;
use traits::Checker;

proptest! {
  #[test]
  fn addsub_agrees(a in any::<u64>(), b in any::<u64>(), c in any::<u64>()) {
    let element = addsub::Element::new(a, b, c);
    let mut scratch = addsub::Scratch::default();
    prop_assert!(!AddSub::check(&mut scratch, &(), &element));
    prop_assert_eq!(scratch.res, element.res);
  }

  #[test]
  fn addsub_detects_any_corruption(a in any::<u64>(), b in any::<u64>(), c in any::<u64>(), flip in 0u32..64) {
    let mut element = addsub::Element::new(a, b, c);
    element.res ^= 1 << flip;
    let mut scratch = addsub::Scratch::default();
    prop_assert!(AddSub::check(&mut scratch, &(), &element));
  }

  #[test]
  fn bool_agrees(a in any::<u64>(), b in any::<u64>()) {
    let element = boolean::Element::new(a, b);
    let mut scratch = boolean::Scratch::default();
    prop_assert!(!Bool::check(&mut scratch, &(), &element));
  }

  #[test]
  fn muldiv_agrees(x in any::<u64>(), y in any::<u64>(), c in any::<u64>()) {
    let element = muldiv::Element::from_draws(x, y, c);
    prop_assert!(element.a >= element.b.get());
    let mut scratch = muldiv::Scratch::default();
    prop_assert!(!MulDiv::check(&mut scratch, &(), &element));
  }

  #[test]
  fn muldiv_oracle_matches_checked_math(a in any::<u64>(), b in 1u64.., c in any::<u64>()) {
    let element = muldiv::Element::new(a, NonZeroU64::new(b).unwrap(), c);
    prop_assert_eq!(element.res, (a / b).wrapping_mul(c));
  }
}

#[cfg(target_arch = "x86_64")]
mod x86_64 {
  use checkers::x86_64::{
    BitScan, BitTest, Cmps, Lea, LodsStos, SignExtend, bitscan, bittest, cmps, lea, lodsstos, signextend,
  };
  use proptest::prelude::*;
  use traits::Checker;

  proptest! {
    #[test]
    fn bitscan_agrees(a in any::<u64>()) {
      let mut scratch = bitscan::Scratch::default();
      prop_assert!(!BitScan::check(&mut scratch, &(), &bitscan::Element::new(a)));
    }

    #[test]
    fn bittest_agrees(a in any::<u64>(), indices in any::<[u64; 8]>()) {
      let mut scratch = bittest::Scratch::default();
      prop_assert!(!BitTest::check(&mut scratch, &(), &bittest::Element::new(a, indices)));
    }

    #[test]
    fn lea_agrees(base in any::<u64>(), offset in 0u64..lea::MAX_OFFSET) {
      let mut scratch = lea::Scratch::default();
      prop_assert!(!Lea::check(&mut scratch, &(), &lea::Element::new(base, offset)));
    }

    #[test]
    fn signextend_agrees(byte in any::<i8>(), word in any::<i16>(), dword in any::<i32>()) {
      let mut scratch = signextend::Scratch::default();
      prop_assert!(!SignExtend::check(&mut scratch, &(), &signextend::Element::new(byte, word, dword)));
    }

    #[test]
    fn cmps_agrees(
      a in proptest::collection::vec(any::<u8>(), 0..cmps::MAX_LEN),
      flips in proptest::collection::vec((any::<prop::sample::Index>(), 1u8..), 0..=cmps::MISMATCH_COUNT),
    ) {
      let mut b = a.clone();
      if !b.is_empty() {
        for (at, xor) in flips {
          let at = at.index(b.len());
          b[at] ^= xor;
        }
      }
      let element = cmps::Element::new(a.into(), b.into());
      let mut scratch = cmps::Scratch::default();
      prop_assert!(!Cmps::check(&mut scratch, &(), &element));
    }

    #[test]
    fn lodsstos_agrees(src in proptest::collection::vec(any::<u8>(), 0..lodsstos::MAX_LEN)) {
      let element = lodsstos::Element { src: src.into() };
      let mut scratch = lodsstos::Scratch::default();
      prop_assert!(!LodsStos::check(&mut scratch, &(), &element));
    }
  }
}
