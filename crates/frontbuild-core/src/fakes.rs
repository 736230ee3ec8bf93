//! In-memory fakes for pipeline seams (testing only)
//!
//! Provides `ScriptedExecutor`, which records tool invocations and answers
//! with scripted exit codes, and `MemoryReporter`, which records banners.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::BuildOutcome;
use crate::reporter::Reporter;
use crate::runner::{ToolExecutor, ToolOutcome};
use crate::stage::{ToolInvocation, ToolKind};

// ---------------------------------------------------------------------------
// ScriptedExecutor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct FailRule {
    kind: ToolKind,
    /// 1-based call number among calls of `kind`; `None` fails every call.
    nth: Option<usize>,
    exit_code: i32,
}

/// Executor that never spawns processes.
///
/// Every invocation succeeds unless a rule says otherwise.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<ToolInvocation>>,
    rules: Vec<FailRule>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call of `kind` exits with `exit_code`.
    pub fn fail_kind(mut self, kind: ToolKind, exit_code: i32) -> Self {
        self.rules.push(FailRule {
            kind,
            nth: None,
            exit_code,
        });
        self
    }

    /// The `nth` call (1-based) of `kind` exits with `exit_code`.
    pub fn fail_nth(mut self, kind: ToolKind, nth: usize, exit_code: i32) -> Self {
        self.rules.push(FailRule {
            kind,
            nth: Some(nth),
            exit_code,
        });
        self
    }

    /// All recorded invocations, in call order.
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded invocations of `kind`, in call order.
    pub fn calls_of(&self, kind: ToolKind) -> Vec<ToolInvocation> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ToolExecutor for ScriptedExecutor {
    async fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(invocation.clone());
        let seen = calls.iter().filter(|c| c.kind == invocation.kind).count();

        let exit_code = self
            .rules
            .iter()
            .find(|r| r.kind == invocation.kind && r.nth.map_or(true, |n| n == seen))
            .map_or(0, |r| r.exit_code);

        Ok(ToolOutcome {
            kind: invocation.kind,
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
            success: exit_code == 0,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryReporter
// ---------------------------------------------------------------------------

/// Reporter that keeps every emitted line.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Titles passed to [`Reporter::phase`], in order.
    pub fn phases(&self) -> Vec<String> {
        self.lines()
            .iter()
            .filter_map(|l| l.strip_prefix("phase: ").map(str::to_string))
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn phase(&self, title: &str) {
        self.lines.lock().unwrap().push(format!("phase: {}", title));
    }

    fn confirm(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("confirm: {}", message));
    }

    fn finish(&self, outcome: &BuildOutcome) {
        let line = match outcome {
            BuildOutcome::Success => "finish: BUILD COMPLETE".to_string(),
            BuildOutcome::Failure { reason, .. } => format!("finish: BUILD FAILED: {}", reason),
        };
        self.lines.lock().unwrap().push(line);
    }
}
