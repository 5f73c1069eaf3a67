//! Workflow stage engine.
//!
//! Walks the stage list of the resolved mode in order, then the vision
//! checks for returns. Each step emits a progress event, waits a simulated
//! delay and checks for an injected failure. Every run ends with exactly one
//! terminal event.

use super::timing::{DelayRange, Sleeper, TimingConfig, TokioSleeper};
use crate::context::WorkflowRequest;
use crate::core::event::UNKNOWN_STAGE;
use crate::core::{CompleteEvent, ProgressEvent, RunSummary, StageOutcome, WorkflowEvent, WorkflowMode};
use crate::errors::{AamsError, EXIT_SUCCESS, EXIT_WORKFLOW_FAILED};
use crate::events::EventSink;
use crate::stages::{checks_for, is_active_key, stages_for, StageResult, StageTemplate};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay ranges.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Seed for the delay generator. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl EngineConfig {
    /// Creates a new engine config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timing.
    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// How a workflow run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// All stages and checks succeeded.
    Succeeded,
    /// The run stopped at `stage`.
    Failed {
        /// Failing stage key, or `unknown`.
        stage: String,
        /// Failure message.
        message: String,
    },
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    /// Unique id of this run, used for log correlation.
    pub run_id: Uuid,
    /// The mode that ran.
    pub mode: WorkflowMode,
    /// The request id as supplied.
    pub request_id: serde_json::Value,
    /// How the run ended.
    pub outcome: WorkflowOutcome,
    /// Every stage and check that ran, in order.
    pub stages: Vec<StageResult>,
}

impl WorkflowReport {
    /// Returns true if the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == WorkflowOutcome::Succeeded
    }

    /// Returns the process exit code for this run.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_WORKFLOW_FAILED
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Stage,
    Vision,
}

/// Runs one workflow request to its terminal event.
pub struct WorkflowEngine {
    timing: TimingConfig,
    rng: StdRng,
    sink: Arc<dyn EventSink>,
    sleeper: Arc<dyn Sleeper>,
}

impl WorkflowEngine {
    /// Creates an engine that sleeps on the tokio timer.
    #[must_use]
    pub fn new(config: &EngineConfig, sink: Arc<dyn EventSink>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            timing: config.timing,
            rng,
            sink,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Runs `request` and emits its events.
    ///
    /// Returns an error only when an event could not be delivered. Injected
    /// failures are reported through [`WorkflowOutcome::Failed`].
    pub async fn run(&mut self, request: &WorkflowRequest) -> Result<WorkflowReport, AamsError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("workflow", %run_id, mode = %request.mode);
        self.run_inner(run_id, request).instrument(span).await
    }

    async fn run_inner(
        &mut self,
        run_id: Uuid,
        request: &WorkflowRequest,
    ) -> Result<WorkflowReport, AamsError> {
        let mode = request.mode;
        info!(request_id = %request.request_id, "Workflow starting");

        // The full sequence still runs; the stray key only shapes the terminal record.
        let stray_key = request
            .simulate
            .fail_stage()
            .filter(|key| !is_active_key(mode, key));
        if let Some(key) = &stray_key {
            warn!(fail_stage = %key, "Injected failure matches no stage in this mode");
        }

        self.emit(ProgressEvent::starting(&request.request_id, mode)).await?;
        self.pause(self.timing.setup).await;

        let mut stages = Vec::new();
        let mut failure = self
            .run_sequence(stages_for(mode), Phase::Stage, request, &mut stages)
            .await?;
        if failure.is_none() {
            failure = self
                .run_sequence(checks_for(mode), Phase::Vision, request, &mut stages)
                .await?;
        }

        let outcome = match (failure, stray_key) {
            (Some((stage, message)), _) => WorkflowOutcome::Failed { stage, message },
            (None, Some(key)) => WorkflowOutcome::Failed {
                stage: UNKNOWN_STAGE.to_string(),
                message: request
                    .simulate
                    .reason()
                    .unwrap_or_else(|| format!("{key} 단계를 찾을 수 없음")),
            },
            (None, None) => WorkflowOutcome::Succeeded,
        };

        let terminal = match &outcome {
            WorkflowOutcome::Succeeded => CompleteEvent::success(
                mode,
                RunSummary {
                    request_id: request.request_id.clone(),
                    includes: request.dispatch_includes.clone(),
                },
            ),
            WorkflowOutcome::Failed { stage, message } => {
                CompleteEvent::failure(stage.clone(), message.clone(), mode)
            }
        };
        self.emit(terminal).await?;

        let succeeded = outcome == WorkflowOutcome::Succeeded;
        info!(succeeded, stages = stages.len(), "Workflow finished");

        Ok(WorkflowReport {
            run_id,
            mode,
            request_id: request.request_id.clone(),
            outcome,
            stages,
        })
    }

    /// Runs templates in order, stopping at the first failure.
    async fn run_sequence(
        &mut self,
        templates: &[StageTemplate],
        phase: Phase,
        request: &WorkflowRequest,
        results: &mut Vec<StageResult>,
    ) -> Result<Option<(String, String)>, AamsError> {
        for template in templates {
            let outcome = self.run_stage(template, phase, request, results).await?;
            if let StageOutcome::Failed(reason) = outcome {
                return Ok(Some((template.key.to_string(), reason)));
            }
        }
        Ok(None)
    }

    async fn run_stage(
        &mut self,
        template: &StageTemplate,
        phase: Phase,
        request: &WorkflowRequest,
        results: &mut Vec<StageResult>,
    ) -> Result<StageOutcome, AamsError> {
        let (event, range) = match phase {
            Phase::Stage => (
                ProgressEvent::stage(template, request.mode),
                self.timing.work,
            ),
            Phase::Vision => (ProgressEvent::check(template), self.timing.vision),
        };
        self.emit(event).await?;

        let started_at = Utc::now();
        self.pause(range).await;

        let outcome = if request.simulate.targets(template.key) {
            let reason = request
                .simulate
                .reason()
                .unwrap_or_else(|| template.default_failure_message());
            warn!(stage = template.key, reason = %reason, "Injected failure");
            StageOutcome::Failed(reason)
        } else {
            debug!(stage = template.key, "Stage ok");
            StageOutcome::Ok
        };

        results.push(StageResult::from_outcome(template.key, started_at, &outcome));
        Ok(outcome)
    }

    async fn emit(&self, event: impl Into<WorkflowEvent>) -> Result<(), AamsError> {
        self.sink.emit(&event.into()).await
    }

    async fn pause(&mut self, range: DelayRange) {
        let duration = range.sample(&mut self.rng);
        self.sleeper.sleep(duration).await;
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
