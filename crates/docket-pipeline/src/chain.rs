use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::context::{Exchange, RequestContext};
use crate::executor::UpdateExecutor;
use crate::stage::{Stage, StageRecord};
use crate::stages::{
    AuditStage, ConditionalHeaderStage, CreateStage, IdentifierStage, LocationStage,
    NormalizeStage, ResultStage, UpdateStage,
};

// ---------------------------------------------------------------------------
// PipelineReport
// ---------------------------------------------------------------------------

/// Trace of one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Per-stage records in execution order.
    pub stage_results: Vec<StageRecord>,
    /// Total wall-clock time of the run.
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Name of the first stage after which the context was in error.
    pub fn failed_at(&self) -> Option<&str> {
        self.stage_results
            .iter()
            .find(|r| r.in_error)
            .map(|r| r.stage_name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// An ordered chain of stages sharing one [`RequestContext`].
///
/// The chain always runs to its end. Errors are recorded on the context and
/// later stages decide for themselves whether to act, so response
/// finalisation and auditing run on every path.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// An empty pipeline. Use [`Self::add_stage`] to append stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Replace or merge one identified document:
    /// conditional header -> identifier -> normalize -> update -> result -> audit
    pub fn document_write(executor: Arc<UpdateExecutor>) -> Self {
        let mut p = Self::new();
        p.add_stage(Box::new(ConditionalHeaderStage));
        p.add_stage(Box::new(IdentifierStage));
        p.add_stage(Box::new(NormalizeStage));
        p.add_stage(Box::new(UpdateStage::new(executor)));
        p.add_stage(Box::new(ResultStage));
        p.add_stage(Box::new(AuditStage));
        p
    }

    /// Create a document in a collection:
    /// conditional header -> create -> update -> result -> location -> audit
    pub fn collection_create(executor: Arc<UpdateExecutor>) -> Self {
        let mut p = Self::new();
        p.add_stage(Box::new(ConditionalHeaderStage));
        p.add_stage(Box::new(CreateStage));
        p.add_stage(Box::new(UpdateStage::new(executor)));
        p.add_stage(Box::new(ResultStage));
        p.add_stage(Box::new(LocationStage));
        p.add_stage(Box::new(AuditStage));
        p
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    /// Builder form of [`Self::add_stage`].
    pub fn with_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.add_stage(stage);
        self
    }

    /// Number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order against the context.
    pub async fn run(&self, exchange: &mut Exchange, context: &mut RequestContext) -> PipelineReport {
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            stage.handle(exchange, context).await;
            let record = StageRecord {
                stage_name: stage.name().to_string(),
                in_error: context.is_in_error(),
                elapsed: stage_start.elapsed(),
            };
            trace!(
                request_id = %context.request_id,
                stage = %record.stage_name,
                in_error = record.in_error,
                "stage completed"
            );
            stage_results.push(record);
        }

        PipelineReport {
            stage_results,
            elapsed: pipeline_start.elapsed(),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
