//! Instruction checkers for cpucheck.
//!
//! Every checker implements [`traits::Checker`]: it builds a table of inputs
//! with oracles computed in portable Rust, then re-executes the instruction
//! under test and compares bit-exactly.
//!
//! # Registry
//!
//! [`CHECKERS`] lists every checker compiled for this target, in usage order.
//! The first entry is the default.
//!
//! | Name | Target | Instructions |
//! |------|--------|--------------|
//! | `addsub` | any | add, sub |
//! | `bool` | any | and, or, xor, not |
//! | `muldiv` | any | div, mul |
//! | `bitscan` | x86_64 | bsf, bsr |
//! | `bittest` | x86_64 | bt, btc, btr, bts |
//! | `cmps` | x86_64 | repz cmpsb/w/d/q |
//! | `cmpxchg` | x86_64 | cmpxchg, cmpxchg8b, cmpxchg16b |
//! | `lea` | x86_64 | lea with scale 1/2/4/8 |
//! | `lodsstos` | x86_64 | lods*/stos* |
//! | `lzcnt` | x86_64 + LZCNT | lzcnt |
//! | `signextend` | x86_64 | cbw, cwde, cdqe |
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod addsub;
pub mod boolean;
pub mod muldiv;
mod util;
#[cfg(target_arch = "x86_64")]
pub mod x86_64;

pub use addsub::AddSub;
pub use boolean::Bool;
use harness::CheckerDescriptor;
pub use muldiv::MulDiv;

/// Every checker available on this target. The first entry is the default.
pub static CHECKERS: &[CheckerDescriptor] = &[
  CheckerDescriptor::of::<AddSub>(),
  CheckerDescriptor::of::<Bool>(),
  CheckerDescriptor::of::<MulDiv>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::BitScan>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::BitTest>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::Cmps>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::Cmpxchg>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::Lea>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::LodsStos>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::Lzcnt>(),
  #[cfg(target_arch = "x86_64")]
  CheckerDescriptor::of::<x86_64::SignExtend>(),
];

/// The checker used when none is selected.
#[inline]
#[must_use]
pub fn default_checker() -> &'static CheckerDescriptor {
  &CHECKERS[0]
}

/// Look a checker up by its registry name.
#[must_use]
pub fn find(name: &str) -> Option<&'static CheckerDescriptor> {
  CHECKERS.iter().find(|checker| checker.name == name)
}

/// Registry names, in order.
pub fn names() -> impl Iterator<Item = &'static str> {
  CHECKERS.iter().map(|checker| checker.name)
}
