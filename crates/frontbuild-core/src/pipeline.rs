//! Pipeline driver and run reporting.
//!
//! The driver is an explicit state machine:
//!
//! ```text
//! Init -> LintChecked -> Tested -> OutputPrepared -> StylesCompiled
//!      -> ScriptsBundled -> HtmlRewritten -> Done
//! ```
//!
//! Every step runs only after the previous one succeeded. The first error
//! moves the machine into the absorbing `Failed` state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::obs::{
    build_span, emit_build_finished, emit_build_started, emit_step_failed, emit_step_finished,
    emit_step_started,
};
use crate::paths::PathSet;
use crate::reporter::Reporter;
use crate::runner::ToolExecutor;
use crate::steps;

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Init,
    LintChecked,
    Tested,
    OutputPrepared,
    StylesCompiled,
    ScriptsBundled,
    HtmlRewritten,
    Done,
    Failed,
}

/// Work performed to leave a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Lint,
    Test,
    PrepareOutput,
    CompileStyles,
    BundleScripts,
    RewriteHtml,
}

impl Step {
    /// Get the step name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Lint => "lint",
            Step::Test => "test",
            Step::PrepareOutput => "prepare_output",
            Step::CompileStyles => "compile_styles",
            Step::BundleScripts => "bundle_scripts",
            Step::RewriteHtml => "rewrite_html",
        }
    }

    /// State reached when this step succeeds.
    pub fn target(&self) -> BuildState {
        match self {
            Step::Lint => BuildState::LintChecked,
            Step::Test => BuildState::Tested,
            Step::PrepareOutput => BuildState::OutputPrepared,
            Step::CompileStyles => BuildState::StylesCompiled,
            Step::BundleScripts => BuildState::ScriptsBundled,
            Step::RewriteHtml => BuildState::HtmlRewritten,
        }
    }
}

impl BuildState {
    /// Step that must succeed to leave this state, if any.
    pub fn pending_step(self) -> Option<Step> {
        match self {
            BuildState::Init => Some(Step::Lint),
            BuildState::LintChecked => Some(Step::Test),
            BuildState::Tested => Some(Step::PrepareOutput),
            BuildState::OutputPrepared => Some(Step::CompileStyles),
            BuildState::StylesCompiled => Some(Step::BundleScripts),
            BuildState::ScriptsBundled => Some(Step::RewriteHtml),
            BuildState::HtmlRewritten | BuildState::Done | BuildState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed)
    }

    /// Transition after the pending step finished.
    ///
    /// Terminal states absorb every transition.
    pub fn advance(self, succeeded: bool) -> BuildState {
        if self.is_terminal() {
            return self;
        }
        if !succeeded {
            return BuildState::Failed;
        }
        match self.pending_step() {
            Some(step) => step.target(),
            None => BuildState::Done,
        }
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Success,
    Failure {
        /// Last state reached before the failing step.
        failed_at: BuildState,
        /// The first error, rendered.
        reason: String,
    },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// Record of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    /// State the step leads to when it succeeds.
    pub target: BuildState,
    pub duration_ms: u64,
    pub success: bool,
}

/// Summary of a complete pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub final_state: BuildState,
    pub steps: Vec<StepRecord>,
    pub outcome: BuildOutcome,
}

impl BuildReport {
    /// Process exit status for this run.
    pub fn exit_code(&self) -> i32 {
        if self.outcome.is_success() {
            0
        } else {
            1
        }
    }

    /// Number of steps that passed.
    pub fn passed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.success).count()
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Front-end build pipeline.
pub struct Pipeline {
    config: BuildConfig,
    paths: PathSet,
    executor: Arc<dyn ToolExecutor>,
    reporter: Arc<dyn Reporter>,
}

impl Pipeline {
    pub fn new(
        config: BuildConfig,
        paths: PathSet,
        executor: Arc<dyn ToolExecutor>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            paths,
            executor,
            reporter,
        }
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    /// Drive the state machine from `Init` to a terminal state.
    pub async fn run(&self) -> BuildReport {
        let run_id = Uuid::new_v4().to_string();
        let span = build_span(&run_id);
        self.drive(run_id).instrument(span).await
    }

    async fn drive(&self, run_id: String) -> BuildReport {
        let started_at = Utc::now();
        let start = Instant::now();

        emit_build_started(&run_id, &self.paths.base_dir.to_string_lossy());

        let mut state = BuildState::Init;
        let mut records = Vec::new();
        let mut failure: Option<(BuildState, BuildError)> = None;

        while !state.is_terminal() {
            let Some(step) = state.pending_step() else {
                state = state.advance(true);
                continue;
            };

            emit_step_started(step.name());
            let step_start = Instant::now();
            let result = self.run_step(step).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;
            emit_step_finished(step.name(), duration_ms, result.is_ok());

            records.push(StepRecord {
                step,
                target: step.target(),
                duration_ms,
                success: result.is_ok(),
            });

            match result {
                Ok(next) => state = next,
                Err(err) => {
                    emit_step_failed(step.name(), &err);
                    failure = Some((state, err));
                    state = state.advance(false);
                }
            }
        }

        let outcome = match failure {
            None => BuildOutcome::Success,
            Some((failed_at, err)) => BuildOutcome::Failure {
                failed_at,
                reason: err.to_string(),
            },
        };
        self.reporter.finish(&outcome);

        let duration_ms = start.elapsed().as_millis() as u64;
        emit_build_finished(
            &run_id,
            duration_ms,
            &format!("{:?}", state),
            outcome.is_success(),
        );

        BuildReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            duration_ms,
            final_state: state,
            steps: records,
            outcome,
        }
    }

    /// Run `step` and return the state it reached.
    async fn run_step(&self, step: Step) -> Result<BuildState> {
        let executor = self.executor.as_ref();
        let (config, paths) = (&self.config, &self.paths);

        match step {
            Step::Lint => {
                self.reporter.phase("Linting JavaScript files");
                if config.pipeline.skip_checks {
                    self.reporter.confirm("SKIPPED");
                    return Ok(step.target());
                }
                let count = steps::lint(executor, config, paths).await?;
                self.reporter.confirm(&format!("OK ({} files)", count));
            }
            Step::Test => {
                self.reporter.phase("Running tests");
                if config.pipeline.skip_checks {
                    self.reporter.confirm("SKIPPED");
                    return Ok(step.target());
                }
                steps::run_tests(executor, config, paths).await?;
                self.reporter.confirm("OK");
            }
            Step::PrepareOutput => {
                self.reporter.phase(&format!(
                    "Creating output directory: {}",
                    paths.output_dir.display()
                ));
                steps::prepare_output(paths)?;
                self.reporter.confirm("OK");
            }
            Step::CompileStyles => {
                self.reporter.phase("Compiling Sass files");
                steps::compile_styles(executor, config, paths).await?;
                self.reporter.confirm("OK");
            }
            Step::BundleScripts => {
                self.reporter.phase("Compiling RequireJS files");
                steps::bundle_scripts(executor, config, paths).await?;
                self.reporter.confirm("OK");
            }
            Step::RewriteHtml => {
                self.reporter.phase("Compiling HTML");
                steps::rewrite_entry_html(&paths.entry_html, &paths.output_html, &config.markup)?;
                self.reporter.confirm("OK");
            }
        }

        info!(step = step.name(), "step complete");
        Ok(step.target())
    }
}
