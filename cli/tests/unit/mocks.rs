//! Shared mock infrastructure for unit tests.
//!
//! Provides a scripted [`ResourceHost`], exec context, prompt and reporter
//! so each scenario doesn't have to re-define the same boilerplate.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Output};

use anyhow::Result;
use rebox_cli::application::ports::{ExecContext, OperatorPrompt, ProgressReporter, ResourceHost};
use rebox_cli::domain::{ResourceId, ResourceSpec};

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(code << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Mock: resource host ──────────────────────────────────────────────────────

/// Simulates `pct`: tracks whether the container exists and is running, and
/// logs every call.
pub struct MockHost {
    exists: Cell<bool>,
    running: Cell<bool>,
    pub address: &'static str,
    /// Any `exec` whose joined argv contains this string exits 1.
    pub fail_exec_containing: Option<&'static str>,
    pub raw_config: RefCell<String>,
    pub log: RefCell<Vec<String>>,
}

impl MockHost {
    pub fn empty() -> Self {
        Self {
            exists: Cell::new(false),
            running: Cell::new(false),
            address: "10.20.0.7",
            fail_exec_containing: None,
            raw_config: RefCell::new(String::new()),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn running() -> Self {
        let host = Self::empty();
        host.exists.set(true);
        host.running.set(true);
        host
    }

    pub fn failing_exec(mut self, needle: &'static str) -> Self {
        self.fail_exec_containing = Some(needle);
        self
    }

    pub fn calls(&self, prefix: &str) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn record(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl ResourceHost for MockHost {
    async fn status(&self, id: ResourceId) -> Result<Output> {
        self.record(format!("status {id}"));
        if !self.exists.get() {
            return Ok(err_output(
                2,
                format!("Configuration file 'nodes/pve/lxc/{id}.conf' does not exist\n").as_bytes(),
            ));
        }
        let state = if self.running.get() { "running" } else { "stopped" };
        Ok(ok_output(format!("status: {state}\n").as_bytes()))
    }

    async fn create(&self, id: ResourceId, spec: &ResourceSpec) -> Result<Output> {
        self.record(format!("create {id} {}", spec.hostname));
        self.exists.set(true);
        Ok(ok_output(b""))
    }

    async fn start(&self, id: ResourceId) -> Result<Output> {
        self.record(format!("start {id}"));
        self.running.set(true);
        Ok(ok_output(b""))
    }

    async fn stop(&self, id: ResourceId) -> Result<Output> {
        self.record(format!("stop {id}"));
        self.running.set(false);
        Ok(ok_output(b""))
    }

    async fn destroy(&self, id: ResourceId) -> Result<Output> {
        self.record(format!("destroy {id}"));
        self.exists.set(false);
        Ok(ok_output(b""))
    }

    async fn exec(&self, id: ResourceId, args: &[&str]) -> Result<Output> {
        let joined = args.join(" ");
        self.record(format!("exec {id} {joined}"));
        if joined == "hostname -I" {
            return Ok(ok_output(format!("{} fd00::7\n", self.address).as_bytes()));
        }
        if self.fail_exec_containing.is_some_and(|n| joined.contains(n)) {
            return Ok(err_output(1, b"E: Unable to locate package nope\n"));
        }
        Ok(ok_output(b""))
    }

    async fn push(&self, id: ResourceId, local: &Path, remote: &str, mode: u32) -> Result<Output> {
        self.record(format!("push {id} {} {remote} {mode:o}", local.display()));
        Ok(ok_output(b""))
    }

    async fn raw_config(&self, _: ResourceId) -> Result<String> {
        Ok(self.raw_config.borrow().clone())
    }

    async fn append_raw_config(&self, id: ResourceId, line: &str) -> Result<()> {
        self.record(format!("append {id} {line}"));
        let mut raw = self.raw_config.borrow_mut();
        raw.push_str(line);
        raw.push('\n');
        Ok(())
    }
}

// ── Mock: local host context ─────────────────────────────────────────────────

/// Local host where every command succeeds.
#[derive(Default)]
pub struct MockLocal {
    pub log: RefCell<Vec<String>>,
}

impl ExecContext for MockLocal {
    fn describe(&self) -> String {
        "host".to_string()
    }

    async fn exec(&self, args: &[&str]) -> Result<Output> {
        self.log.borrow_mut().push(args.join(" "));
        Ok(ok_output(b""))
    }

    async fn push(&self, local: &Path, remote: &str, _: u32) -> Result<Output> {
        self.log
            .borrow_mut()
            .push(format!("push {} {remote}", local.display()));
        Ok(ok_output(b""))
    }
}

// ── Mock: prompt ─────────────────────────────────────────────────────────────

/// Answers every confirmation with a fixed value and counts the questions.
pub struct FixedPrompt {
    pub answer: Option<bool>,
    pub asked: Cell<usize>,
}

impl FixedPrompt {
    pub fn answering(answer: Option<bool>) -> Self {
        Self {
            answer,
            asked: Cell::new(0),
        }
    }
}

impl OperatorPrompt for FixedPrompt {
    fn confirm(&self, _: &str) -> Result<Option<bool>> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.answer)
    }
}

// ── Mock: reporter ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    pub fn has(&self, kind: &str, needle: &str) -> bool {
        self.events
            .borrow()
            .iter()
            .any(|(k, m)| *k == kind && m.contains(needle))
    }
}

impl ProgressReporter for RecordingReporter {
    fn header(&self, message: &str) {
        self.events.borrow_mut().push(("header", message.to_string()));
    }
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(("step", message.to_string()));
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(("success", message.to_string()));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(("warn", message.to_string()));
    }
    fn error(&self, message: &str) {
        self.events.borrow_mut().push(("error", message.to_string()));
    }
    fn info(&self, message: &str) {
        self.events.borrow_mut().push(("info", message.to_string()));
    }
}
