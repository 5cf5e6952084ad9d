use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use hyper::header::{HeaderValue, ETAG};
use hyper::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use docket_pipeline::{Exchange, Pipeline, RequestContext, RequestMethod};
use docket_store::{etag_of, CollectionRef, DocumentStore};
use docket_types::{DocId, Document, IdType, Value};

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub document_write: Arc<Pipeline>,
    pub collection_create: Arc<Pipeline>,
}

/// Query parameters accepted by document endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentParams {
    pub id_type: Option<String>,
    pub filter: Option<String>,
    pub shardkey: Option<String>,
    /// Present (with any value) to force entity-tag verification.
    #[serde(rename = "checkEtag")]
    pub check_etag: Option<String>,
}

impl DocumentParams {
    fn id_type(&self) -> Result<Option<IdType>, ApiError> {
        self.id_type
            .as_deref()
            .map(str::parse::<IdType>)
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))
    }

    fn constraint(name: &str, raw: Option<&str>) -> Result<Option<Document>, ApiError> {
        raw.map(Document::from_json_str)
            .transpose()
            .map_err(|e| ApiError::bad_request(format!("invalid {name}: {e}")))
    }

    /// Copy the query parameters onto a fresh request context.
    fn apply(&self, context: &mut RequestContext, config: &ServerConfig) -> Result<(), ApiError> {
        context.id_type = self.id_type()?;
        context.filter = Self::constraint("filter", self.filter.as_deref())?;
        context.shard_key = Self::constraint("shardkey", self.shardkey.as_deref())?;
        context.etag_check_required = config
            .etag_policy(&context.collection)
            .requires_check(self.check_etag.is_some());
        Ok(())
    }
}

/// Empty body means no content; anything else must be JSON.
fn parse_body(body: &[u8]) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let json: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ApiError::not_acceptable("invalid json"))?;
    Value::from_json(json)
        .map(Some)
        .map_err(|e| ApiError::not_acceptable(e.to_string()))
}

/// Turn a finished pipeline run into the HTTP response.
fn respond(exchange: Exchange, context: &RequestContext) -> Response {
    let status = context
        .response_status()
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let headers = exchange.into_response_headers();
    if status.is_client_error() || status.is_server_error() {
        let message = context
            .response_message()
            .or(status.canonical_reason())
            .unwrap_or_default();
        (headers, ApiError::new(status, message)).into_response()
    } else {
        (status, headers).into_response()
    }
}

async fn run_write(
    state: &AppState,
    pipeline: &Pipeline,
    mut context: RequestContext,
    params: &DocumentParams,
    headers: HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    params.apply(&mut context, &state.config)?;
    context.content = parse_body(body)?;
    let mut exchange = Exchange::new(headers);
    let report = pipeline.run(&mut exchange, &mut context).await;
    if let Some(stage) = report.failed_at() {
        tracing::debug!(request_id = %context.request_id, stage, "pipeline failed");
    }
    Ok(respond(exchange, &context))
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "docket",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /{db}/{coll}/{id}`: the stored document with its `ETag`.
pub async fn get_document(
    State(state): State<AppState>,
    Path((db, coll, id)): Path<(String, String, String)>,
    Query(params): Query<DocumentParams>,
) -> Result<Response, ApiError> {
    let id = DocId::parse(&id, params.id_type()?).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let coll = CollectionRef::new(db, coll);
    let found = state.store.find(&coll, &id).await.map_err(|e| {
        error!(collection = %coll, %id, error = %e, "read failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Error handling the request")
    })?;
    let Some(doc) = found else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "document does not exist"));
    };

    let mut headers = HeaderMap::new();
    if let Some(tag) = etag_of(&doc) {
        if let Ok(v) = HeaderValue::from_str(&tag.header_value()) {
            headers.insert(ETAG, v);
        }
    }
    Ok((StatusCode::OK, headers, Json(doc.to_json())).into_response())
}

/// `PUT /{db}/{coll}/{id}`: replace.
pub async fn put_document(
    State(state): State<AppState>,
    Path((db, coll, id)): Path<(String, String, String)>,
    Query(params): Query<DocumentParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let context = RequestContext::for_document(CollectionRef::new(db, coll), RequestMethod::Put, id, None);
    run_write(&state, &state.document_write, context, &params, headers, &body).await
}

/// `PATCH /{db}/{coll}/{id}`: merge.
pub async fn patch_document(
    State(state): State<AppState>,
    Path((db, coll, id)): Path<(String, String, String)>,
    Query(params): Query<DocumentParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let context =
        RequestContext::for_document(CollectionRef::new(db, coll), RequestMethod::Patch, id, None);
    run_write(&state, &state.document_write, context, &params, headers, &body).await
}

/// `POST /{db}/{coll}`: create, id taken from the payload.
pub async fn post_document(
    State(state): State<AppState>,
    Path((db, coll)): Path<(String, String)>,
    Query(params): Query<DocumentParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let context = RequestContext::new(CollectionRef::new(db, coll), RequestMethod::Post);
    run_write(&state, &state.collection_create, context, &params, headers, &body).await
}
