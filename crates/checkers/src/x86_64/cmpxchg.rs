//! Compare-and-exchange (`cmpxchg`, `cmpxchg8b`, `cmpxchg16b`).
//!
//! Operands are drawn so roughly half of the comparisons succeed. The wide
//! variants run only when the CPU reports them; that decision is made once in
//! `init` and carried in the config.
//!
//! LLVM reserves `rbx`, so the wide variants swap the low half of the new
//! value into `rbx` around the instruction and swap it back afterwards.

use core::arch::asm;
use std::io::{self, Write};

use platform::caps::x86;
use rand::{Rng, rngs::StdRng};
use traits::{Checker, InitContext, InitError};

use crate::util::yes_no;

/// The `cmpxchg` checker.
#[derive(Clone, Copy, Debug)]
pub struct Cmpxchg;

/// Which wide variants this CPU supports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
  pub cmpxchg8b: bool,
  pub cmpxchg16b: bool,
}

/// `cmpxchg r64, r64` with the accumulator holding `a` and the destination `b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Narrow {
  pub a: u64,
  pub b: u64,
  pub c: u64,
  pub zf: bool,
  pub dst: u64,
  pub rax: u64,
}

impl Narrow {
  #[inline]
  #[must_use]
  pub const fn new(a: u64, b: u64, c: u64) -> Self {
    let zf = a == b;
    Self {
      a,
      b,
      c,
      zf,
      dst: if zf { c } else { b },
      rax: if zf { a } else { b },
    }
  }
}

/// `cmpxchg8b m64` with `edx:eax = a`, memory `b` and `ecx:ebx = c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wide8 {
  pub a: u64,
  pub b: u64,
  pub c: u64,
  pub zf: bool,
  pub mem: u64,
  pub edx: u32,
  pub eax: u32,
}

impl Wide8 {
  #[inline]
  #[must_use]
  pub const fn new(a: u64, b: u64, c: u64) -> Self {
    let zf = a == b;
    let acc = if zf { a } else { b };
    Self {
      a,
      b,
      c,
      zf,
      mem: if zf { c } else { b },
      edx: (acc >> 32) as u32,
      eax: acc as u32,
    }
  }
}

/// `cmpxchg16b m128` with `rdx:rax = a`, memory `b` and `rcx:rbx = c`.
///
/// Pairs are `[low, high]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wide16 {
  pub a: [u64; 2],
  pub b: [u64; 2],
  pub c: [u64; 2],
  pub zf: bool,
  pub mem: [u64; 2],
  pub rdx: u64,
  pub rax: u64,
}

impl Wide16 {
  #[inline]
  #[must_use]
  pub const fn new(a: [u64; 2], b: [u64; 2], c: [u64; 2]) -> Self {
    let zf = a[0] == b[0] && a[1] == b[1];
    let acc = if zf { a } else { b };
    Self {
      a,
      b,
      c,
      zf,
      mem: if zf { c } else { b },
      rdx: acc[1],
      rax: acc[0],
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub narrow: Narrow,
  pub wide8: Wide8,
  pub wide16: Wide16,
}

impl Element {
  fn random(rng: &mut StdRng) -> Self {
    let a: u64 = rng.r#gen();
    let b = if rng.r#gen() { a } else { rng.r#gen() };
    let narrow = Narrow::new(a, b, rng.r#gen());

    let a: u64 = rng.r#gen();
    let b = if rng.r#gen() { a } else { rng.r#gen() };
    let wide8 = Wide8::new(a, b, rng.r#gen());

    let a: [u64; 2] = rng.r#gen();
    let b = if rng.r#gen() { a } else { rng.r#gen() };
    let wide16 = Wide16::new(a, b, rng.r#gen());

    Self { narrow, wide8, wide16 }
  }
}

/// 16-byte aligned memory operand for `cmpxchg16b`.
#[derive(Clone, Copy, Debug, Default)]
#[repr(C, align(16))]
pub struct Aligned(pub [u64; 2]);

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub narrow_zf: bool,
  pub narrow_dst: u64,
  pub narrow_rax: u64,

  pub wide8_zf: bool,
  pub wide8_mem: u64,
  pub wide8_edx: u32,
  pub wide8_eax: u32,

  pub wide16_zf: bool,
  pub wide16_mem: Aligned,
  pub wide16_rdx: u64,
  pub wide16_rax: u64,
}

#[inline(always)]
fn check_narrow(scratch: &mut Scratch, op: &Narrow) -> bool {
  let mut rax = op.a;
  let mut dst = op.b;
  let zf: u8;
  // SAFETY: register-only sequence using baseline x86_64 instructions.
  unsafe {
    asm!(
      "cmpxchg {dst}, {c}",
      "setz {zf}",
      dst = inout(reg) dst,
      c = in(reg) op.c,
      inout("rax") rax,
      zf = out(reg_byte) zf,
      options(nomem, nostack),
    );
  }
  scratch.narrow_zf = zf != 0;
  scratch.narrow_dst = dst;
  scratch.narrow_rax = rax;

  scratch.narrow_zf == op.zf && scratch.narrow_dst == op.dst && scratch.narrow_rax == op.rax
}

#[inline(always)]
fn check_wide8(scratch: &mut Scratch, op: &Wide8) -> bool {
  scratch.wide8_mem = op.b;
  let mut edx = (op.a >> 32) as u32;
  let mut eax = op.a as u32;
  let zf: u8;
  let mem: *mut u64 = &mut scratch.wide8_mem;
  // SAFETY: `mem` points to a live, exclusively borrowed u64; `init` only
  // enables this path when CX8 is reported. `rbx` is restored before the
  // block ends.
  unsafe {
    asm!(
      "xchg {lo:r}, rbx",
      "cmpxchg8b qword ptr [{mem}]",
      "setz {zf}",
      "xchg {lo:r}, rbx",
      mem = in(reg) mem,
      lo = inout(reg) u64::from(op.c as u32) => _,
      in("ecx") (op.c >> 32) as u32,
      inout("edx") edx,
      inout("eax") eax,
      zf = out(reg_byte) zf,
      options(nostack),
    );
  }
  scratch.wide8_zf = zf != 0;
  scratch.wide8_edx = edx;
  scratch.wide8_eax = eax;

  scratch.wide8_zf == op.zf
    && scratch.wide8_mem == op.mem
    && scratch.wide8_edx == op.edx
    && scratch.wide8_eax == op.eax
}

#[inline(always)]
fn check_wide16(scratch: &mut Scratch, op: &Wide16) -> bool {
  scratch.wide16_mem = Aligned(op.b);
  let mut rdx = op.a[1];
  let mut rax = op.a[0];
  let zf: u8;
  let mem: *mut Aligned = &mut scratch.wide16_mem;
  // SAFETY: `mem` is 16-byte aligned by `Aligned`'s repr and exclusively
  // borrowed; `init` only enables this path when CX16 is reported. `rbx` is
  // restored before the block ends.
  unsafe {
    asm!(
      "xchg {lo}, rbx",
      "cmpxchg16b xmmword ptr [{mem}]",
      "setz {zf}",
      "xchg {lo}, rbx",
      mem = in(reg) mem,
      lo = inout(reg) op.c[0] => _,
      in("rcx") op.c[1],
      inout("rdx") rdx,
      inout("rax") rax,
      zf = out(reg_byte) zf,
      options(nostack),
    );
  }
  scratch.wide16_zf = zf != 0;
  scratch.wide16_rdx = rdx;
  scratch.wide16_rax = rax;

  scratch.wide16_zf == op.zf
    && scratch.wide16_mem.0 == op.mem
    && scratch.wide16_rdx == op.rdx
    && scratch.wide16_rax == op.rax
}

impl Checker for Cmpxchg {
  const NAME: &'static str = "cmpxchg";
  const DESCRIPTION: &'static str = "Performs comparisons and moves using cmpxchg, cmpxchg8b, cmpxchg16b";
  type Config = Config;
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<Config, InitError> {
    let config = Config {
      cmpxchg8b: ctx.caps().has(x86::CMPXCHG8B),
      cmpxchg16b: ctx.caps().has(x86::CMPXCHG16B),
    };
    ctx.fill(table, table_size, Element::random);
    Ok(config)
  }

  #[inline]
  fn check(scratch: &mut Scratch, config: &Config, element: &Element) -> bool {
    let mut ok = check_narrow(scratch, &element.narrow);
    if config.cmpxchg8b {
      ok &= check_wide8(scratch, &element.wide8);
    }
    if config.cmpxchg16b {
      ok &= check_wide16(scratch, &element.wide16);
    }
    !ok
  }

  fn report(out: &mut dyn Write, config: &Config, element: &Element, scratch: &Scratch) -> io::Result<()> {
    let op = &element.narrow;
    writeln!(out, "cmpxchg: a={:#x}, b={:#x}, c={:#x}", op.a, op.b, op.c)?;
    writeln!(out, "zf: expected={}, got={}", yes_no(op.zf), yes_no(scratch.narrow_zf))?;
    writeln!(out, "dst: expected={:#x}, got={:#x}", op.dst, scratch.narrow_dst)?;
    writeln!(out, "rax: expected={:#x}, got={:#x}", op.rax, scratch.narrow_rax)?;

    if config.cmpxchg8b {
      let op = &element.wide8;
      writeln!(out, "cmpxchg8b: a={:#x}, b={:#x}, c={:#x}", op.a, op.b, op.c)?;
      writeln!(out, "zf: expected={}, got={}", yes_no(op.zf), yes_no(scratch.wide8_zf))?;
      writeln!(out, "edx: expected={:#x}, got={:#x}", op.edx, scratch.wide8_edx)?;
      writeln!(out, "eax: expected={:#x}, got={:#x}", op.eax, scratch.wide8_eax)?;
      writeln!(out, "mem: expected={:#x}, got={:#x}", op.mem, scratch.wide8_mem)?;
    }

    if config.cmpxchg16b {
      let op = &element.wide16;
      writeln!(
        out,
        "cmpxchg16b: a={:#x}:{:#x}, b={:#x}:{:#x}, c={:#x}:{:#x}",
        op.a[1], op.a[0], op.b[1], op.b[0], op.c[1], op.c[0]
      )?;
      writeln!(out, "zf: expected={}, got={}", yes_no(op.zf), yes_no(scratch.wide16_zf))?;
      writeln!(out, "rdx: expected={:#x}, got={:#x}", op.rdx, scratch.wide16_rdx)?;
      writeln!(out, "rax: expected={:#x}, got={:#x}", op.rax, scratch.wide16_rax)?;
      let got = scratch.wide16_mem.0;
      writeln!(
        out,
        "mem: expected={:#x}:{:#x}, got={:#x}:{:#x}",
        op.mem[1], op.mem[0], got[1], got[0]
      )?;
    }
    Ok(())
  }
}
