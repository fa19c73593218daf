//! Accumulator sign extension (`cbw`, `cwde`, `cdqe`).

use core::arch::asm;
use std::io::{self, Write};

use rand::Rng;
use traits::{Checker, InitContext, InitError};

/// The `signextend` checker.
#[derive(Clone, Copy, Debug)]
pub struct SignExtend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
  pub byte: i8,
  pub byte_ex: i16,
  pub word: i16,
  pub word_ex: i32,
  pub dword: i32,
  pub dword_ex: i64,
}

impl Element {
  #[inline]
  #[must_use]
  pub const fn new(byte: i8, word: i16, dword: i32) -> Self {
    Self {
      byte,
      byte_ex: byte as i16,
      word,
      word_ex: word as i32,
      dword,
      dword_ex: dword as i64,
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Scratch {
  pub byte_ex: i16,
  pub word_ex: i32,
  pub dword_ex: i64,
}

impl Checker for SignExtend {
  const NAME: &'static str = "signextend";
  const DESCRIPTION: &'static str = "Performs sign extension (cbw, cwde, cdqe)";
  type Config = ();
  type Element = Element;
  type Scratch = Scratch;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Element>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| Element::new(rng.r#gen(), rng.r#gen(), rng.r#gen()));
    Ok(())
  }

  #[inline]
  fn check(scratch: &mut Scratch, _: &(), element: &Element) -> bool {
    let byte_ex: i16;
    let word_ex: i32;
    let dword_ex: i64;
    // SAFETY: register-only sequence; rax is declared clobbered.
    unsafe {
      asm!(
        "mov al, {byte}",
        "cbw",
        "mov {byte_ex:x}, ax",
        "mov ax, {word:x}",
        "cwde",
        "mov {word_ex:e}, eax",
        "mov eax, {dword:e}",
        "cdqe",
        "mov {dword_ex}, rax",
        byte = in(reg_byte) element.byte,
        word = in(reg) element.word,
        dword = in(reg) element.dword,
        byte_ex = out(reg) byte_ex,
        word_ex = out(reg) word_ex,
        dword_ex = out(reg) dword_ex,
        out("rax") _,
        options(nomem, nostack, preserves_flags),
      );
    }
    scratch.byte_ex = byte_ex;
    scratch.word_ex = word_ex;
    scratch.dword_ex = dword_ex;

    scratch.byte_ex != element.byte_ex || scratch.word_ex != element.word_ex || scratch.dword_ex != element.dword_ex
  }

  fn report(out: &mut dyn Write, _: &(), element: &Element, scratch: &Scratch) -> io::Result<()> {
    writeln!(
      out,
      "cbw: byte={:#x}, expected={:#x}, got={:#x}",
      element.byte, element.byte_ex, scratch.byte_ex
    )?;
    writeln!(
      out,
      "cwde: word={:#x}, expected={:#x}, got={:#x}",
      element.word, element.word_ex, scratch.word_ex
    )?;
    writeln!(
      out,
      "cdqe: dword={:#x}, expected={:#x}, got={:#x}",
      element.dword, element.dword_ex, scratch.dword_ex
    )
  }
}
