//! CPU detection for cpucheck.
//!
//! This crate is the single place where the workspace asks the processor what
//! it can do. Checkers never probe CPUID themselves; they receive a [`Caps`]
//! value through their init context and decide from it.
//!
//! # Core Types
//!
//! - [`Caps`]: which instructions this machine may legally execute
//! - [`Arch`]: the architecture the binary was compiled for
//! - [`Description`]: a printable summary for logs and usage text
//!
//! # Main Entry Point
//!
//! ```
//! use platform::caps::x86;
//!
//! let caps = platform::caps();
//! if caps.has(x86::LZCNT) {
//!   // lzcnt-based checks are meaningful here
//! }
//! ```
//!
//! Runtime detection runs once and is cached in a `OnceLock`.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod caps;
mod detect;

pub use caps::{Arch, Caps};
pub use detect::{Description, caps, describe, detect_uncached, logical_cores};
