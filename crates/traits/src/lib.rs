//! Core traits for cpucheck.
//!
//! This crate defines the contract every instruction checker implements. The
//! harness only ever talks to checkers through [`Checker`], so a new
//! instruction family plugs into the unmodified scheduler.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Checker`] | Sizes and the four lifecycle operations of one checker |
//! | [`InitContext`] | CPU capabilities and the seeded RNG handed to `init` |
//! | [`InitError`] | Why a checker refused to build its table |
//!
//! # Fallibility Discipline
//!
//! This crate denies `unwrap` and `expect` in non-test code.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod checker;
pub mod error;

pub use checker::{Checker, InitContext};
pub use error::InitError;
