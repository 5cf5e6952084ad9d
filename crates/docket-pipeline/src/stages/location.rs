use async_trait::async_trait;
use hyper::StatusCode;
use tracing::warn;

use crate::context::{Exchange, RequestContext};
use crate::stage::Stage;

/// Points the `Location` header at a newly created document.
pub struct LocationStage;

#[async_trait]
impl Stage for LocationStage {
    fn name(&self) -> &str {
        "location"
    }

    async fn handle(&self, exchange: &mut Exchange, context: &mut RequestContext) {
        if context.is_in_error() || context.response_status() != Some(StatusCode::CREATED) {
            return;
        }
        let Some(id) = &context.document_id else {
            return;
        };
        let location = id.location(&context.collection.path());
        if !exchange.set_location(&location) {
            warn!(request_id = %context.request_id, %location, "location is not a valid header value");
        }
    }
}
