use async_trait::async_trait;

use docket_store::ID_FIELD;
use docket_types::{DocId, Document, Value};

use crate::context::{Exchange, RequestContext};
use crate::error::PipelineError;
use crate::stage::Stage;

const METADATA: &str = "metadata";
const FILENAME: &str = "filename";

/// Reshape an inbound payload into the canonical stored form.
///
/// 1. The payload must be a non-empty object.
/// 2. A payload without `metadata` is wrapped as `{ "metadata": <payload> }`.
///    A top-level `_id` of the original payload is also kept at the top
///    level so it still takes part in the id check below.
/// 3. `metadata.filename`, when present, is copied to a top-level `filename`.
/// 4. A missing top-level `_id` is set to `id`; a present one must equal it.
pub fn normalize_content(content: Option<Value>, id: &DocId) -> Result<Document, PipelineError> {
    let mut content = match content {
        None => return Err(PipelineError::no_data()),
        Some(Value::Document(doc)) => doc,
        Some(_) => return Err(PipelineError::not_an_object()),
    };
    if content.is_empty() {
        return Err(PipelineError::no_data());
    }

    if !content.contains_key(METADATA) {
        let original_id = content.get(ID_FIELD).cloned();
        content = Document::with(METADATA, Value::Document(content));
        if let Some(original_id) = original_id {
            content.insert(ID_FIELD, original_id);
        }
    }

    let filename = match content.get(METADATA) {
        Some(Value::Document(metadata)) => metadata.get(FILENAME).cloned(),
        _ => return Err(PipelineError::Input("metadata must be a json object".into())),
    };
    if let Some(filename) = filename {
        content.insert(FILENAME, filename);
    }

    let expected = id.to_value();
    match content.get(ID_FIELD) {
        None => {
            content.insert(ID_FIELD, expected);
        }
        Some(actual) if *actual == expected => {}
        Some(_) => return Err(PipelineError::id_mismatch()),
    }

    Ok(content)
}

/// Applies [`normalize_content`] to the context's payload in place.
pub struct NormalizeStage;

#[async_trait]
impl Stage for NormalizeStage {
    fn name(&self) -> &str {
        "normalize"
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
        match normalize_content(context.content.take(), &id) {
            Ok(doc) => context.content = Some(Value::Document(doc)),
            Err(e) => context.fail(e),
        }
    }
}
