use async_trait::async_trait;

use crate::context::{Exchange, RequestContext};
use crate::error::PipelineError;
use crate::executor::Outcome;
use crate::stage::Stage;

/// Translates the executor's outcome into the response status, message,
/// and `ETag` header.
///
/// The `ETag` header is set whenever the result carries a tag, including
/// on conflict, so a caller can retry with the current tag. The internal
/// duplicate-key status never reaches the response; it is reported as a
/// conflict with its own message.
pub struct ResultStage;

#[async_trait]
impl Stage for ResultStage {
    fn name(&self) -> &str {
        "result"
    }

    async fn handle(&self, exchange: &mut Exchange, context: &mut RequestContext) {
        if context.is_in_error() {
            return;
        }
        let Some(result) = context.operation_result.clone() else {
            return;
        };

        if let Some(etag) = &result.etag {
            exchange.set_etag(etag);
        }

        match result.outcome {
            Outcome::Conflict => context.fail(PipelineError::conflict()),
            Outcome::DuplicateKey => context.fail(PipelineError::duplicate_key()),
            Outcome::Updated | Outcome::Created | Outcome::NotFound => {
                context.set_response_status(result.status())
            }
        }
    }
}
