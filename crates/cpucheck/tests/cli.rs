//! End-to-end tests of the `cpucheck` binary.

use std::process::{Command, Output, Stdio};

fn cpucheck() -> Command {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_cpucheck"));
  for var in [
    "CPUCHECK_CHECKER",
    "CPUCHECK_TABLE_SIZE",
    "CPUCHECK_THREADS",
    "CPUCHECK_SEED",
    "CPUCHECK_LOG",
  ] {
    cmd.env_remove(var);
  }
  cmd
}

fn run(args: &[&str]) -> Output {
  cpucheck().args(args).output().unwrap()
}

#[test]
fn help_succeeds_and_lists_checkers() {
  let out = run(&["-h"]);
  assert!(out.status.success());
  let stdout = String::from_utf8(out.stdout).unwrap();
  assert!(stdout.starts_with("Usage: "));
  for name in cpucheck::checkers::names() {
    assert!(stdout.contains(name), "{name} missing from usage");
  }
}

#[test]
fn unknown_checker_fails() {
  let out = run(&["-c", "fdiv"]);
  assert!(!out.status.success());
  let stderr = String::from_utf8(out.stderr).unwrap();
  assert!(stderr.contains("unknown checker: fdiv"), "{stderr}");
  assert!(out.stdout.is_empty());
}

#[test]
fn zero_sizes_fail() {
  assert!(!run(&["-s", "0"]).status.success());
  assert!(!run(&["-t", "0"]).status.success());
  assert!(!run(&["-s"]).status.success());
}

#[test]
fn invalid_environment_fails() {
  let out = cpucheck().env("CPUCHECK_THREADS", "lots").output().unwrap();
  assert!(!out.status.success());
  let stderr = String::from_utf8(out.stderr).unwrap();
  assert!(stderr.contains("CPUCHECK_THREADS"), "{stderr}");
}

#[cfg(unix)]
#[test]
fn interrupt_drains_and_succeeds() {
  use std::{
    io::{BufRead, BufReader, Read},
    thread,
  };

  let mut child = cpucheck()
    .args(["-c", "addsub", "-s", "1024", "-t", "2"])
    .env("CPUCHECK_LOG", "info")
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .unwrap();

  let mut stderr = BufReader::new(child.stderr.take().unwrap());
  let mut line = String::new();
  let mut started = false;
  while stderr.read_line(&mut line).unwrap() > 0 {
    if line.contains("workers started") {
      started = true;
      break;
    }
    line.clear();
  }
  assert!(started, "workers never started");

  // Keep the pipe open while the run drains and logs its shutdown.
  let drain = thread::spawn(move || {
    let mut rest = String::new();
    let _ = stderr.read_to_string(&mut rest);
    rest
  });

  let status = Command::new("kill")
    .args(["-INT", &child.id().to_string()])
    .status()
    .unwrap();
  assert!(status.success());

  let out = child.wait_with_output().unwrap();
  let rest = drain.join().unwrap();
  assert!(out.status.success(), "{rest}");

  let stdout = String::from_utf8(out.stdout).unwrap();
  let lines: Vec<&str> = stdout.lines().collect();
  assert_eq!(lines.len(), 1, "{stdout}");
  assert!(lines[0].starts_with("Detected 0 inconsistencies in "), "{stdout}");
  assert!(lines[0].ends_with(" checks"));
}
