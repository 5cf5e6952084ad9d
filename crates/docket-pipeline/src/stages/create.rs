use async_trait::async_trait;

use docket_store::ID_FIELD;
use docket_types::{DocId, IdType, ObjectId, Value};

use crate::context::{Exchange, RequestContext};
use crate::error::PipelineError;
use crate::stage::Stage;

/// Resolves the identifier of a collection-level create from the payload.
///
/// An `_id` string is read under the `id_type` query parameter when one is
/// given, so `{"_id": "100"}` with `id_type=NUMBER` stores the number 100.
/// Non-string ids keep their JSON type whatever `id_type` says.
/// Without an `_id` a fresh ObjectId is generated, which is only allowed
/// when the requested type is absent or `OID`.
pub struct CreateStage;

fn resolve_id(value: Option<&Value>, id_type: Option<IdType>) -> Result<DocId, PipelineError> {
    match (value, id_type) {
        (Some(Value::String(s)), Some(t)) => {
            DocId::parse(s, Some(t)).map_err(|e| PipelineError::InvalidIdentifier(e.to_string()))
        }
        (Some(v), _) => {
            DocId::from_value(v).map_err(|e| PipelineError::InvalidIdentifier(e.to_string()))
        }
        (None, None | Some(IdType::Oid)) => Ok(DocId::ObjectId(ObjectId::new())),
        (None, Some(t)) => Err(PipelineError::Input(format!(
            "_id must be provided when id_type is {t}"
        ))),
    }
}

#[async_trait]
impl Stage for CreateStage {
    fn name(&self) -> &str {
        "create"
    }

    async fn handle(&self, _exchange: &mut Exchange, context: &mut RequestContext) {
        if context.is_in_error() {
            return;
        }
        let mut content = match context.content.take() {
            None => return context.fail(PipelineError::no_data()),
            Some(Value::Document(doc)) => doc,
            Some(_) => return context.fail(PipelineError::not_an_object()),
        };
        if content.is_empty() {
            return context.fail(PipelineError::no_data());
        }

        match resolve_id(content.get(ID_FIELD), context.id_type) {
            Ok(id) => {
                content.insert(ID_FIELD, id.to_value());
                context.document_id = Some(id);
                context.content = Some(Value::Document(content));
            }
            Err(e) => context.fail(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestMethod;
    use docket_store::CollectionRef;
    use docket_types::Document;
    use hyper::StatusCode;

    fn ctx(body: &str, id_type: Option<IdType>) -> RequestContext {
        let mut ctx = RequestContext::new(CollectionRef::new("db", "coll"), RequestMethod::Post)
            .with_content(Some(Value::Document(Document::from_json_str(body).unwrap())));
        ctx.id_type = id_type;
        ctx
    }

    #[tokio::test]
    async fn string_id_is_coerced_by_id_type() {
        let mut c = ctx(r#"{"_id": "100", "a": 1}"#, Some(IdType::Number));
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        assert_eq!(c.document_id, Some(DocId::Int(100)));
        assert_eq!(c.content_document().unwrap().get("_id"), Some(&Value::Int(100)));
    }

    #[tokio::test]
    async fn untyped_id_is_taken_as_is() {
        let mut c = ctx(r#"{"_id": "100"}"#, None);
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        assert_eq!(c.document_id, Some(DocId::String("100".into())));
    }

    #[tokio::test]
    async fn missing_id_generates_object_id() {
        let mut c = ctx(r#"{"a": 1}"#, None);
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        let Some(DocId::ObjectId(oid)) = c.document_id else {
            panic!("expected generated ObjectId, got {:?}", c.document_id);
        };
        assert_eq!(c.content_document().unwrap().get("_id"), Some(&Value::ObjectId(oid)));
    }

    #[tokio::test]
    async fn missing_id_with_non_oid_type_is_rejected() {
        let mut c = ctx(r#"{"a": 1}"#, Some(IdType::Number));
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        assert_eq!(c.response_status(), Some(StatusCode::NOT_ACCEPTABLE));
        assert!(c.document_id.is_none());
    }

    #[tokio::test]
    async fn unparseable_typed_id_is_bad_request() {
        let mut c = ctx(r#"{"_id": "abc"}"#, Some(IdType::Number));
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        assert_eq!(c.response_status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn non_string_id_keeps_its_type_despite_id_type() {
        let mut c = ctx(
            r#"{"_id": {"$oid": "54c965cbc2e64568e235b711"}, "a": 1}"#,
            Some(IdType::String),
        );
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        let oid = ObjectId::from_hex("54c965cbc2e64568e235b711").unwrap();
        assert_eq!(c.document_id, Some(DocId::ObjectId(oid)));
        assert_eq!(c.content_document().unwrap().get("_id"), Some(&Value::ObjectId(oid)));
        assert!(c
            .document_id
            .as_ref()
            .unwrap()
            .location("/db/coll")
            .ends_with("?id_type=OID"));
    }

    #[tokio::test]
    async fn document_ids_are_unsupported() {
        let mut c = ctx(r#"{"_id": {"x": 1}}"#, None);
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        assert!(matches!(c.error(), Some(PipelineError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn empty_payload_is_no_data() {
        let mut c = ctx("{}", None);
        CreateStage.handle(&mut Exchange::default(), &mut c).await;
        assert_eq!(c.error(), Some(&PipelineError::no_data()));
    }
}
