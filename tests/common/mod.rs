//! Shared integration-test harness for running the `cybersim` binary and
//! writing throwaway deck files.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Runs `cybersim` with `args`, no stdin, and returns its output.
#[allow(clippy::missing_panics_doc)]
pub fn run_cybersim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cybersim"))
        .args(args)
        .env_remove("CYBERSIM_API_URL")
        .env_remove("CYBERSIM_USER_ID")
        .env_remove("CYBERSIM_EVENTS")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run cybersim")
}

/// Runs `cybersim` with `args`, feeding `input` on stdin.
#[allow(clippy::missing_panics_doc)]
pub fn run_cybersim_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cybersim"))
        .args(args)
        .env_remove("CYBERSIM_API_URL")
        .env_remove("CYBERSIM_USER_ID")
        .env_remove("CYBERSIM_EVENTS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cybersim");
    child
        .stdin
        .take()
        .expect("stdin not captured")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for cybersim")
}

/// Parses stdout as one JSON document.
#[allow(clippy::missing_panics_doc)]
pub fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON: {e}\n{stdout}"))
}

/// Writes `yaml` to `name` inside `dir` and returns the path.
#[allow(clippy::missing_panics_doc)]
pub fn write_deck(dir: &Path, name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, yaml).expect("failed to write deck");
    path
}

/// A small valid choice deck.
pub const TWO_STEP_DECK: &str = r"
simulation: social_engineering
title: Desk Drills
pass_threshold: 50
scoring:
  strategy: ratio
  denominator: deck_length
scenarios:
  - id: 1
    title: Tailgater
    prompt:
      content: Someone without a badge follows you through the door.
    truth:
      choice:
        options: [hold_door, challenge]
        best: challenge
    explanation:
      note: Ask for a badge or escort them to reception.
  - id: 2
    title: USB Drop
    prompt:
      content: A USB stick labelled 'Payroll' lies in the car park.
    truth:
      choice:
        options: [plug_in, hand_in]
        best: hand_in
    explanation:
      note: Unknown media goes to IT, never into a workstation.
";
