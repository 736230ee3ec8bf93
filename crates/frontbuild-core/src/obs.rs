//! Structured observability hooks for the build lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via `build_span`
//! - Emission functions for key lifecycle events: build start, step start,
//!   step finish, build finish
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use tracing::info;

/// Span tagging every event of one build with its run_id.
///
/// # Example
///
/// ```ignore
/// drive().instrument(build_span("6f1c...")).await;
/// ```
pub fn build_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("frontbuild.run", run_id = %run_id)
}

/// Emit event: build started in `base_dir`.
pub fn emit_build_started(run_id: &str, base_dir: &str) {
    info!(event = "build.started", run_id = %run_id, base_dir = %base_dir);
}

/// Emit event: a step is about to run.
pub fn emit_step_started(step: &str) {
    info!(event = "step.started", step = %step);
}

/// Emit event: a step finished.
pub fn emit_step_finished(step: &str, duration_ms: u64, success: bool) {
    info!(
        event = "step.finished",
        step = %step,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Emit event: build finished with its terminal state.
pub fn emit_build_finished(run_id: &str, duration_ms: u64, final_state: &str, success: bool) {
    info!(
        event = "build.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        final_state = %final_state,
        success = success,
    );
}

/// Emit event: the step error that aborted the build (warning level).
pub fn emit_step_failed(step: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "step.failed", step = %step, error = %error);
}
