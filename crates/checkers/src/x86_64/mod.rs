//! Checkers that issue x86_64 instructions through inline assembly.
//!
//! Each `check` confines its `asm!` block to the instruction sequence under
//! test plus the flag captures (`setz`, `setc`) that follow it. Everything
//! before and after the block is ordinary safe Rust.

pub mod bitscan;
pub mod bittest;
pub mod cmps;
pub mod cmpxchg;
pub mod lea;
pub mod lodsstos;
pub mod lzcnt;
pub mod signextend;

pub use bitscan::BitScan;
pub use bittest::BitTest;
pub use cmps::Cmps;
pub use cmpxchg::Cmpxchg;
pub use lea::Lea;
pub use lodsstos::LodsStos;
pub use lzcnt::Lzcnt;
pub use signextend::SignExtend;
