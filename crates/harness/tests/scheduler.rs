//! End-to-end harness behaviour with small in-test checkers.
//!
//! Each checker owns its call counters, so tests stay independent when the
//! test runner executes them in parallel.

use core::{num::NonZeroUsize, time::Duration};
use std::{
  io::{self, Write},
  sync::atomic::{AtomicUsize, Ordering},
  thread,
  time::Instant,
};

use harness::{ErrorKind, Harness, HarnessError, RunConfig, RunSummary, StopFlag, output::CapturedOutput};
use platform::{Caps, caps::x86};
use rand::Rng;
use traits::{Checker, InitContext, InitError};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn config(table_size: usize, threads: usize) -> RunConfig {
  RunConfig::new()
    .with_table_size(NonZeroUsize::new(table_size).unwrap())
    .with_threads(NonZeroUsize::new(threads).unwrap())
    .with_signal_handlers(false)
}

/// Run `C` until a timer sets the stop flag, or the run ends on its own. Returns the result and the captured reports.
fn run_for<C: Checker>(config: RunConfig, duration: Duration) -> (Result<RunSummary, HarnessError>, String) {
  let stop = StopFlag::new();
  let captured = CapturedOutput::new();
  let output = captured.output();

  let stopper = {
    let stop = stop.clone();
    thread::spawn(move || {
      let deadline = Instant::now() + duration;
      while !stop.is_set() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
      }
      stop.trigger();
    })
  };
  let result = Harness::<C>::new(config).and_then(|harness| harness.run(&stop, &output));
  stop.trigger();
  stopper.join().unwrap();
  (result, captured.contents())
}

/// Run `C` with the stop flag already set: init and cleanup only.
fn run_stopped<C: Checker>(config: RunConfig) -> Result<RunSummary, HarnessError> {
  let stop = StopFlag::new();
  stop.trigger();
  let output = CapturedOutput::new().output();
  Harness::<C>::new(config)?.run(&stop, &output)
}

#[derive(Clone, Copy, Debug)]
struct Sum {
  a: u64,
  b: u64,
  expected: u64,
}

fn check_sum(scratch: &mut u64, element: &Sum) -> bool {
  *scratch = core::hint::black_box(element.a).wrapping_add(core::hint::black_box(element.b));
  *scratch != element.expected
}

fn report_sum(out: &mut dyn Write, element: &Sum, scratch: &u64) -> io::Result<()> {
  writeln!(out, "a = {:#x}, b = {:#x}", element.a, element.b)?;
  writeln!(out, "expected {:#x}, got {:#x}", element.expected, scratch)
}

fn random_sum(rng: &mut rand::rngs::StdRng) -> Sum {
  let a = rng.r#gen::<u64>();
  let b = rng.r#gen::<u64>();
  Sum {
    a,
    b,
    expected: a.wrapping_add(b),
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checkers
// ─────────────────────────────────────────────────────────────────────────────

struct Agreeing;

static AGREEING_CLEANUPS: AtomicUsize = AtomicUsize::new(0);

impl Checker for Agreeing {
  const NAME: &'static str = "agreeing";
  const DESCRIPTION: &'static str = "wrapping add, always correct";
  type Config = ();
  type Element = Sum;
  type Scratch = u64;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Sum>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, random_sum);
    Ok(())
  }

  fn check(scratch: &mut u64, _: &(), element: &Sum) -> bool {
    check_sum(scratch, element)
  }

  fn report(out: &mut dyn Write, _: &(), element: &Sum, scratch: &u64) -> io::Result<()> {
    report_sum(out, element, scratch)
  }

  fn cleanup(_: &(), _: &mut [Sum]) {
    AGREEING_CLEANUPS.fetch_add(1, Ordering::Relaxed);
  }
}

/// Element 0 carries a wrong oracle.
struct CorruptFirst;

impl Checker for CorruptFirst {
  const NAME: &'static str = "corrupt-first";
  const DESCRIPTION: &'static str = "wrapping add with one bad oracle";
  type Config = ();
  type Element = Sum;
  type Scratch = u64;

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Sum>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, random_sum);
    table[0].expected = table[0].expected.wrapping_add(1);
    Ok(())
  }

  fn check(scratch: &mut u64, _: &(), element: &Sum) -> bool {
    check_sum(scratch, element)
  }

  fn report(out: &mut dyn Write, _: &(), element: &Sum, scratch: &u64) -> io::Result<()> {
    report_sum(out, element, scratch)
  }
}

struct NeedsLzcnt;

static NEEDS_LZCNT_CHECKS: AtomicUsize = AtomicUsize::new(0);

impl Checker for NeedsLzcnt {
  const NAME: &'static str = "needs-lzcnt";
  const DESCRIPTION: &'static str = "refuses to run without lzcnt";
  type Config = ();
  type Element = u64;
  type Scratch = ();

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<u64>, table_size: usize) -> Result<(), InitError> {
    ctx.require(x86::LZCNT, "lzcnt")?;
    ctx.fill(table, table_size, |rng| rng.r#gen());
    Ok(())
  }

  fn check(_: &mut (), _: &(), _: &u64) -> bool {
    NEEDS_LZCNT_CHECKS.fetch_add(1, Ordering::Relaxed);
    false
  }

  fn report(_: &mut dyn Write, _: &(), _: &u64, _: &()) -> io::Result<()> {
    Ok(())
  }
}

struct Huge;

static HUGE_INITS: AtomicUsize = AtomicUsize::new(0);

impl Checker for Huge {
  const NAME: &'static str = "huge";
  const DESCRIPTION: &'static str = "large elements";
  type Config = ();
  type Element = [u64; 8];
  type Scratch = ();

  fn init(_: &mut InitContext<'_>, _: &mut Vec<[u64; 8]>, _: usize) -> Result<(), InitError> {
    HUGE_INITS.fetch_add(1, Ordering::Relaxed);
    Ok(())
  }

  fn check(_: &mut (), _: &(), _: &[u64; 8]) -> bool {
    false
  }

  fn report(_: &mut dyn Write, _: &(), _: &[u64; 8], _: &()) -> io::Result<()> {
    Ok(())
  }
}

/// Pushes one element too few.
struct ShortInit;

static SHORT_INIT_CLEANUPS: AtomicUsize = AtomicUsize::new(0);

impl Checker for ShortInit {
  const NAME: &'static str = "short-init";
  const DESCRIPTION: &'static str = "incomplete table";
  type Config = ();
  type Element = u64;
  type Scratch = ();

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<u64>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size - 1, |rng| rng.r#gen());
    Ok(())
  }

  fn check(_: &mut (), _: &(), _: &u64) -> bool {
    false
  }

  fn report(_: &mut dyn Write, _: &(), _: &u64, _: &()) -> io::Result<()> {
    Ok(())
  }

  fn cleanup(_: &(), _: &mut [u64]) {
    SHORT_INIT_CLEANUPS.fetch_add(1, Ordering::Relaxed);
  }
}

/// Panics on its first check.
struct Panicking;

static PANICKING_CLEANUPS: AtomicUsize = AtomicUsize::new(0);

impl Checker for Panicking {
  const NAME: &'static str = "panicking";
  const DESCRIPTION: &'static str = "panics in check";
  type Config = ();
  type Element = u64;
  type Scratch = ();

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<u64>, table_size: usize) -> Result<(), InitError> {
    ctx.fill(table, table_size, |rng| rng.r#gen());
    Ok(())
  }

  fn check(_: &mut (), _: &(), _: &u64) -> bool {
    panic!("simulated worker failure");
  }

  fn report(_: &mut dyn Write, _: &(), _: &u64, _: &()) -> io::Result<()> {
    Ok(())
  }

  fn cleanup(_: &(), _: &mut [u64]) {
    PANICKING_CLEANUPS.fetch_add(1, Ordering::Relaxed);
  }
}

/// Owns a buffer per element and runs out of memory on the fourth one.
struct Exhausted;

static EXHAUSTED_DROPS: AtomicUsize = AtomicUsize::new(0);
static EXHAUSTED_CHECKS: AtomicUsize = AtomicUsize::new(0);

struct Buffer(Box<[u8]>);

impl Drop for Buffer {
  fn drop(&mut self) {
    EXHAUSTED_DROPS.fetch_add(1, Ordering::Relaxed);
  }
}

impl Checker for Exhausted {
  const NAME: &'static str = "exhausted";
  const DESCRIPTION: &'static str = "allocation failure during init";
  type Config = ();
  type Element = Buffer;
  type Scratch = ();

  fn init(ctx: &mut InitContext<'_>, table: &mut Vec<Buffer>, table_size: usize) -> Result<(), InitError> {
    let mut built = 0;
    ctx.try_fill(table, table_size, |_| {
      built += 1;
      if built > 3 {
        return Err(InitError::Allocation { what: "element buffer" });
      }
      Ok(Buffer(vec![0; 16].into_boxed_slice()))
    })
  }

  fn check(_: &mut (), _: &(), element: &Buffer) -> bool {
    EXHAUSTED_CHECKS.fetch_add(1, Ordering::Relaxed);
    element.0.is_empty()
  }

  fn report(_: &mut dyn Write, _: &(), _: &Buffer, _: &()) -> io::Result<()> {
    Ok(())
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn agreeing_checker_reports_nothing() {
  let before = AGREEING_CLEANUPS.load(Ordering::Relaxed);
  let (result, reports) = run_for::<Agreeing>(config(1024, 2), Duration::from_millis(100));
  let summary = result.unwrap();

  assert!(summary.is_clean());
  assert!(summary.stopped);
  assert_eq!(summary.checker, "agreeing");
  assert_eq!(summary.threads.len(), 2);
  assert!(summary.checks.value() > 0);
  assert!(reports.is_empty(), "{reports}");
  assert_eq!(summary.to_string(), format!("Detected 0 inconsistencies in {} checks", summary.checks));
  assert!(AGREEING_CLEANUPS.load(Ordering::Relaxed) > before);
}

#[test]
fn corrupted_element_is_reported_every_pass() {
  let (result, reports) = run_for::<CorruptFirst>(config(4096, 2).with_seed(7), Duration::from_millis(100));
  let summary = result.unwrap();

  for thread in &summary.threads {
    assert!(thread.passes >= 1, "thread {} never completed a pass", thread.index);
    assert!(thread.inconsistencies >= thread.passes);
    assert!(thread.inconsistencies <= thread.passes + 1);
  }
  assert!(!summary.is_clean());
  assert!(reports.contains("Inconsistency detected: checker corrupt-first, element 0, thread 0"));
  assert!(reports.contains("expected "));
  assert!(!reports.contains(", element 1,"));
}

#[test]
fn missing_feature_fails_before_any_check() {
  let result = run_stopped::<NeedsLzcnt>(config(16, 1).with_caps(Caps::NONE));
  let err = result.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Initialization);
  assert!(matches!(
    err,
    HarnessError::Init(InitError::MissingFeature { feature: "lzcnt" })
  ));
  assert_eq!(NEEDS_LZCNT_CHECKS.load(Ordering::Relaxed), 0);
}

#[test]
fn oversized_table_is_rejected_before_init() {
  let err = Harness::<Huge>::new(config(usize::MAX, 1)).unwrap_err();

  assert!(matches!(err, HarnessError::TableTooLarge { element_size: 64, .. }));
  assert_eq!(err.kind(), ErrorKind::Resource);
  assert_eq!(HUGE_INITS.load(Ordering::Relaxed), 0);
}

#[test]
fn allocation_failure_in_init_releases_partial_table() {
  let (result, reports) = run_for::<Exhausted>(config(8, 2), Duration::from_secs(30));
  let err = result.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Initialization);
  assert!(matches!(
    err,
    HarnessError::Init(InitError::Allocation { what: "element buffer" })
  ));
  assert_eq!(
    err.to_string(),
    "error while initialising table: could not allocate element buffer"
  );
  assert_eq!(EXHAUSTED_DROPS.load(Ordering::Relaxed), 3);
  assert_eq!(EXHAUSTED_CHECKS.load(Ordering::Relaxed), 0);
  assert!(reports.is_empty());
}

#[test]
fn incomplete_table_is_an_init_error() {
  let err = run_stopped::<ShortInit>(config(8, 1)).unwrap_err();

  assert!(matches!(
    err,
    HarnessError::Init(InitError::IncompleteTable { expected: 8, actual: 7 })
  ));
  assert_eq!(SHORT_INIT_CLEANUPS.load(Ordering::Relaxed), 1);
}

#[test]
fn stopped_run_checks_nothing() {
  let summary = run_stopped::<CorruptFirst>(config(64, 3).with_seed(1)).unwrap();

  assert!(summary.stopped);
  assert_eq!(summary.checks.value(), 0);
  assert_eq!(summary.passes.value(), 0);
  assert_eq!(summary.inconsistencies.value(), 0);
  assert_eq!(summary.to_string(), "Detected 0 inconsistencies in 0 checks");
}

#[test]
fn start_offsets_are_in_range_and_seeded() {
  let first = run_stopped::<CorruptFirst>(config(97, 8).with_seed(42)).unwrap();
  let second = run_stopped::<CorruptFirst>(config(97, 8).with_seed(42)).unwrap();

  let starts: Vec<usize> = first.threads.iter().map(|t| t.start).collect();
  assert!(starts.iter().all(|&s| s < 97));
  assert_eq!(starts, second.threads.iter().map(|t| t.start).collect::<Vec<_>>());
  assert_eq!(first.seed, 42);
}

#[test]
fn single_element_single_thread() {
  let (result, _) = run_for::<CorruptFirst>(config(1, 1), Duration::from_millis(20));
  let summary = result.unwrap();

  let thread = summary.threads[0];
  assert_eq!(thread.start, 0);
  assert_eq!(thread.inconsistencies, thread.checks);
}

#[test]
fn panicking_worker_stops_the_run() {
  let (result, _) = run_for::<Panicking>(config(32, 2), Duration::from_secs(30));
  let err = result.unwrap_err();

  assert!(matches!(err, HarnessError::WorkerPanicked { .. }));
  assert_eq!(err.kind(), ErrorKind::Runtime);
  assert_eq!(PANICKING_CLEANUPS.load(Ordering::Relaxed), 1);
}
