use async_trait::async_trait;
use tracing::{info, warn};

use crate::context::{Exchange, RequestContext};
use crate::stage::Stage;

/// Logs one line per request with its final status. Runs whether or not
/// an earlier stage failed.
pub struct AuditStage;

#[async_trait]
impl Stage for AuditStage {
    fn name(&self) -> &str {
        "audit"
    }

    async fn handle(&self, _exchange: &mut Exchange, context: &mut RequestContext) {
        let status = context.response_status().map(|s| s.as_u16()).unwrap_or(0);
        let id = context
            .document_id
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| context.raw_id.clone())
            .unwrap_or_default();

        match context.error() {
            Some(error) => warn!(
                request_id = %context.request_id,
                method = context.method.as_str(),
                collection = %context.collection,
                %id,
                status,
                %error,
                "write rejected"
            ),
            None => info!(
                request_id = %context.request_id,
                method = context.method.as_str(),
                collection = %context.collection,
                %id,
                status,
                "write completed"
            ),
        }
    }
}
