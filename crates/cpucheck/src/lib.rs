//! Detect silent CPU miscomputation.
//!
//! `cpucheck` exercises individual instructions from every logical core, over
//! and over, and compares each live result against an oracle computed once in
//! portable Rust. A defective core, an unstable overclock or a marginal supply
//! voltage shows up as an "inconsistency": a plausible but wrong value with no
//! crash or fault.
//!
//! # Quick Start
//!
//! ```no_run
//! use cpucheck::{RunConfig, StopFlag, checkers, output};
//!
//! let checker = checkers::find("addsub").ok_or("unknown checker")?;
//! let stop = StopFlag::new();
//! let summary = checker.run(&RunConfig::new(), &stop, &output::stderr())?;
//! println!("{summary}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The run lasts until SIGINT or SIGTERM, or until `stop` is triggered from
//! another thread.
//!
//! # Crates
//!
//! | Re-export | Contents |
//! |-----------|----------|
//! | [`platform`] | CPU capability detection |
//! | [`traits`] | The [`Checker`] contract |
//! | [`harness`] | Scheduler, cancellation, counters, reports |
//! | [`checkers`] | Every checker and the registry |
//!
//! # Configuration
//!
//! The binary layers built-in defaults, `CPUCHECK_*` environment variables
//! ([`config`]) and command-line flags ([`cli`]), in increasing precedence.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod cli;
pub mod config;

pub use checkers::{self, CHECKERS};
pub use harness::{
  self, CheckerDescriptor, DEFAULT_TABLE_SIZE, ErrorKind, HarnessError, RunConfig, RunSummary, StopFlag, output,
};
pub use platform::{self, Caps};
pub use traits::{self, Checker, InitContext, InitError};
