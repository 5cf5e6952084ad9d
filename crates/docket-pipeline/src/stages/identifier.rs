use async_trait::async_trait;

use docket_types::DocId;

use crate::context::{Exchange, RequestContext};
use crate::error::PipelineError;
use crate::stage::Stage;

/// Resolves the raw URL identifier and its optional `id_type` into a typed
/// [`DocId`].
pub struct IdentifierStage;

#[async_trait]
impl Stage for IdentifierStage {
    fn name(&self) -> &str {
        "identifier"
    }

    async fn handle(&self, _exchange: &mut Exchange, context: &mut RequestContext) {
        if context.is_in_error() {
            return;
        }
        let Some(raw) = context.raw_id.as_deref() else {
            context.fail(PipelineError::InvalidIdentifier(
                "no document id in the URL".into(),
            ));
            return;
        };
        match DocId::parse(raw, context.id_type) {
            Ok(id) => context.document_id = Some(id),
            Err(e) => context.fail(PipelineError::InvalidIdentifier(e.to_string())),
        }
    }
}
