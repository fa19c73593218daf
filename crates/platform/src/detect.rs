//! Runtime capability detection.
//!
//! Detection runs once per process and is cached. Detection never fails: on
//! architectures without a probe the result is [`Caps::NONE`], which makes
//! feature-gated checkers refuse to initialise instead of faulting.

use std::{fmt, sync::OnceLock};

use crate::caps::{Arch, Caps};

static CACHE: OnceLock<Caps> = OnceLock::new();

/// Detected capabilities of the running CPU (cached).
#[inline]
#[must_use]
pub fn caps() -> Caps {
  *CACHE.get_or_init(detect_uncached)
}

/// Probe the CPU without consulting the cache.
#[must_use]
pub fn detect_uncached() -> Caps {
  #[cfg(all(target_arch = "x86_64", not(miri)))]
  {
    detect_x86_64()
  }
  #[cfg(all(target_arch = "aarch64", not(miri)))]
  {
    detect_aarch64()
  }
  #[cfg(any(miri, not(any(target_arch = "x86_64", target_arch = "aarch64"))))]
  {
    Caps::NONE
  }
}

/// Number of logical cores this process may run on, or 1 if unknown.
///
/// On Linux this honours the scheduler affinity mask.
#[must_use]
pub fn logical_cores() -> usize {
  std::thread::available_parallelism().map_or(1, |n| n.get())
}

// ─────────────────────────────────────────────────────────────────────────────
// x86_64 Detection
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(all(target_arch = "x86_64", not(miri)))]
#[allow(unused_unsafe)]
fn detect_x86_64() -> Caps {
  use core::arch::x86_64::__cpuid;

  use crate::caps::x86;

  let mut caps = Caps::NONE;

  // SAFETY: CPUID is available on every x86_64 processor.
  let leaf1 = unsafe { __cpuid(1) };
  if leaf1.edx & (1 << 8) != 0 {
    caps |= x86::CMPXCHG8B;
  }
  if leaf1.ecx & (1 << 13) != 0 {
    caps |= x86::CMPXCHG16B;
  }

  // SAFETY: extended leaf 0x80000000 is always defined on x86_64.
  let max_extended = unsafe { __cpuid(0x8000_0000) }.eax;
  if max_extended > 0x8000_0000 {
    // SAFETY: leaf 0x80000001 exists (max_extended > 0x80000000).
    let ext1 = unsafe { __cpuid(0x8000_0001) };
    if ext1.ecx & (1 << 5) != 0 {
      caps |= x86::LZCNT;
    }
  }

  caps
}

// ─────────────────────────────────────────────────────────────────────────────
// aarch64 Detection
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(all(target_arch = "aarch64", not(miri)))]
fn detect_aarch64() -> Caps {
  use crate::caps::aarch64;

  aarch64::NEON
}

// ─────────────────────────────────────────────────────────────────────────────
// Description
// ─────────────────────────────────────────────────────────────────────────────

/// Printable summary of the platform: architecture, features, core count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Description {
  pub arch: Arch,
  pub caps: Caps,
  pub logical_cores: usize,
}

/// Describe the current platform.
#[must_use]
pub fn describe() -> Description {
  Description {
    arch: Arch::current(),
    caps: caps(),
    logical_cores: logical_cores(),
  }
}

impl fmt::Display for Description {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{}], {} logical cores", self.arch, self.caps, self.logical_cores)
  }
}
