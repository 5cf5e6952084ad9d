use async_trait::async_trait;
use hyper::header::IF_MATCH;

use docket_types::EntityTag;

use crate::context::{Exchange, RequestContext};
use crate::error::PipelineError;
use crate::stage::Stage;

/// Reads the caller's entity tag from `If-Match`.
///
/// A header that is not a well-formed tag can never match a stored state,
/// so it is reported as a conflict straight away.
pub struct ConditionalHeaderStage;

#[async_trait]
impl Stage for ConditionalHeaderStage {
    fn name(&self) -> &str {
        "conditional-header"
    }

    async fn handle(&self, exchange: &mut Exchange, context: &mut RequestContext) {
        if context.is_in_error() {
            return;
        }
        let Some(raw) = exchange.request_header(&IF_MATCH) else {
            return;
        };
        match EntityTag::parse_header(raw) {
            Ok(tag) => context.etag = Some(tag),
            Err(_) => context.fail(PipelineError::conflict()),
        }
    }
}
