//! CPU capability representation.
//!
//! [`Caps`] is a 64-bit feature bitset. Bits are architecture-specific but the
//! API is uniform: callers combine predefined constants and ask [`Caps::has`].
//!
//! # Bit Layout
//!
//! - Bits 0-31: x86_64 features
//! - Bits 32-63: aarch64 features

use core::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Core Capability Type
// ─────────────────────────────────────────────────────────────────────────────

/// CPU capabilities as a feature bitset.
///
/// `Caps` is `Copy`, `Send` and `Sync`; it is computed once per process and
/// handed by value to every checker.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Caps(u64);

impl Caps {
  /// Empty capability set (no features).
  pub const NONE: Self = Self(0);

  /// Create a capability set with a single bit set.
  #[inline]
  #[must_use]
  pub const fn bit(bit: u8) -> Self {
    Self(1u64 << (bit % 64))
  }

  /// Check if all features in `required` are present.
  #[inline(always)]
  #[must_use]
  pub const fn has(self, required: Self) -> bool {
    self.0 & required.0 == required.0
  }

  /// Union of two capability sets.
  #[inline]
  #[must_use]
  pub const fn union(self, other: Self) -> Self {
    Self(self.0 | other.0)
  }

  /// Features present in both sets.
  #[inline]
  #[must_use]
  pub const fn intersection(self, other: Self) -> Self {
    Self(self.0 & other.0)
  }

  /// Iterate over the names of the features present, in bit order.
  pub fn feature_names(self) -> impl Iterator<Item = &'static str> {
    FEATURE_NAMES
      .iter()
      .filter(move |(cap, _)| self.has(*cap))
      .map(|(_, name)| *name)
  }
}

impl core::ops::BitOr for Caps {
  type Output = Self;

  #[inline]
  fn bitor(self, rhs: Self) -> Self::Output {
    self.union(rhs)
  }
}

impl core::ops::BitOrAssign for Caps {
  #[inline]
  fn bitor_assign(&mut self, rhs: Self) {
    *self = self.union(rhs);
  }
}

impl fmt::Debug for Caps {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.feature_names()).finish()
  }
}

impl fmt::Display for Caps {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for name in self.feature_names() {
      if !first {
        f.write_str(",")?;
      }
      f.write_str(name)?;
      first = false;
    }
    if first {
      f.write_str("none")?;
    }
    Ok(())
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Architecture Identification
// ─────────────────────────────────────────────────────────────────────────────

/// Target architecture of the running binary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Arch {
  X86_64,
  Aarch64,
  #[default]
  Other,
}

impl Arch {
  /// Architecture of the current compilation target.
  #[inline]
  #[must_use]
  pub const fn current() -> Self {
    #[cfg(target_arch = "x86_64")]
    {
      Self::X86_64
    }
    #[cfg(target_arch = "aarch64")]
    {
      Self::Aarch64
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
      Self::Other
    }
  }

  #[inline]
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "aarch64",
      Self::Other => "other",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// x86_64 Features (bits 0-31)
// ─────────────────────────────────────────────────────────────────────────────

/// x86_64 feature bits.
pub mod x86 {
  use super::Caps;

  /// `CMPXCHG8B` (CPUID.01H:EDX bit 8).
  pub const CMPXCHG8B: Caps = Caps::bit(0);
  /// `CMPXCHG16B` (CPUID.01H:ECX bit 13).
  pub const CMPXCHG16B: Caps = Caps::bit(1);
  /// `LZCNT`, reported as ABM on AMD (CPUID.80000001H:ECX bit 5).
  pub const LZCNT: Caps = Caps::bit(2);
}

// ─────────────────────────────────────────────────────────────────────────────
// aarch64 Features (bits 32-63)
// ─────────────────────────────────────────────────────────────────────────────

/// aarch64 feature bits.
pub mod aarch64 {
  use super::Caps;

  /// Baseline on every AArch64 core.
  pub const NEON: Caps = Caps::bit(32);
}

const FEATURE_NAMES: &[(Caps, &str)] = &[
  (x86::CMPXCHG8B, "cmpxchg8b"),
  (x86::CMPXCHG16B, "cmpxchg16b"),
  (x86::LZCNT, "lzcnt"),
  (aarch64::NEON, "neon"),
];
