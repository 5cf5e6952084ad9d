use std::time::Duration;

use async_trait::async_trait;

use crate::context::{Exchange, RequestContext};

// ---------------------------------------------------------------------------
// Stage trait
// ---------------------------------------------------------------------------

/// A single processing step in a [`Pipeline`](crate::chain::Pipeline).
///
/// Every stage is invoked on every run, in order. A functional stage checks
/// [`RequestContext::is_in_error`] on entry and does nothing when an earlier
/// stage has failed. A stage that detects a failure records it with
/// [`RequestContext::fail`] and returns normally; it never stops the chain.
///
/// The trait is object-safe and `Send + Sync` so stages can be stored in
/// a `Vec<Box<dyn Stage>>`.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Human-readable name of this stage (e.g. "normalize", "update").
    fn name(&self) -> &str;

    /// Process the request.
    async fn handle(&self, exchange: &mut Exchange, context: &mut RequestContext);
}

// ---------------------------------------------------------------------------
// StageRecord
// ---------------------------------------------------------------------------

/// What the chain observed after one stage ran.
#[derive(Clone, Debug)]
pub struct StageRecord {
    /// Name of the stage.
    pub stage_name: String,
    /// Whether the context was in error after the stage returned.
    pub in_error: bool,
    /// Wall-clock time the stage took.
    pub elapsed: Duration,
}
