use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::context::{Exchange, RequestContext};
use crate::error::PipelineError;
use crate::executor::{UpdateExecutor, UpdateRequest};
use crate::stage::Stage;

/// Hands the normalized content to the [`UpdateExecutor`] and stores the
/// [`OperationResult`](crate::executor::OperationResult) on the context.
pub struct UpdateStage {
    executor: Arc<UpdateExecutor>,
}

impl UpdateStage {
    pub fn new(executor: Arc<UpdateExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Stage for UpdateStage {
    fn name(&self) -> &str {
        "update"
    }

    async fn handle(&self, _exchange: &mut Exchange, context: &mut RequestContext) {
        if context.is_in_error() {
            return;
        }
        let Some(id) = context.document_id.clone() else {
            context.fail(PipelineError::InvalidIdentifier(
                "document id not resolved".into(),
            ));
            return;
        };
        let Some(content) = context.content_document().cloned() else {
            context.fail(PipelineError::no_data());
            return;
        };

        let request = UpdateRequest {
            collection: context.collection.clone(),
            id,
            filter: context.filter.clone(),
            shard_key: context.shard_key.clone(),
            content,
            etag: context.etag,
            mode: context.method.write_mode(),
            etag_check_required: context.etag_check_required,
        };

        match self.executor.update(request).await {
            Ok(result) => context.operation_result = Some(result),
            Err(e) => {
                error!(
                    request_id = %context.request_id,
                    collection = %context.collection,
                    error = %e,
                    "update failed"
                );
                context.fail(PipelineError::StoreFailure(e.to_string()));
            }
        }
    }
}
