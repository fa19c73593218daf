//! Verification harness for cpucheck.
//!
//! The harness owns everything generic about a run: validating sizes,
//! building the table through the checker's `init`, spawning a fixed pool of
//! workers that sweep the shared table forever, stopping them cooperatively,
//! and aggregating their saturating counters. It knows nothing about any
//! particular instruction; every checker reaches it through
//! [`traits::Checker`].
//!
//! # Quick Start
//!
//! ```ignore
//! use harness::{Harness, RunConfig, StopFlag, output};
//!
//! let stop = StopFlag::new();
//! let out = output::stderr();
//! let summary = Harness::<MyChecker>::new(RunConfig::default())?.run(&stop, &out)?;
//! println!("{summary}");
//! ```
//!
//! # Concurrency Model
//!
//! - The table and the checker config are read-only once `init` returns.
//! - Each worker exclusively owns its scratch and counters.
//! - The diagnostic output is the only shared mutable resource, behind one
//!   mutex, so concurrent reports never interleave.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod config;
pub mod counter;
mod descriptor;
mod error;
pub mod output;
mod report;
mod scheduler;
mod stop;

pub use config::{DEFAULT_TABLE_SIZE, RunConfig};
pub use counter::{SaturatingCounter, Total};
pub use descriptor::CheckerDescriptor;
pub use error::{ErrorKind, HarnessError};
pub use output::DiagnosticOutput;
pub use report::{RunSummary, ThreadReport};
pub use scheduler::Harness;
pub use stop::{SignalGuard, StopFlag};
