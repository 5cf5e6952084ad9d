use hyper::header::{HeaderName, HeaderValue, ETAG, LOCATION};
use hyper::{HeaderMap, StatusCode};
use uuid::Uuid;

use docket_store::{CollectionRef, WriteMode};
use docket_types::{DocId, Document, EntityTag, IdType, Value};

use crate::error::PipelineError;
use crate::executor::OperationResult;

// ---------------------------------------------------------------------------
// RequestMethod
// ---------------------------------------------------------------------------

/// The mutation a request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMethod {
    /// Full replace of one identified document.
    Put,
    /// Partial merge into one identified document.
    Patch,
    /// Create in a collection; the id comes from the payload.
    Post,
}

impl RequestMethod {
    /// How the write combines with the stored document.
    pub fn write_mode(&self) -> WriteMode {
        match self {
            Self::Patch => WriteMode::Merge,
            Self::Put | Self::Post => WriteMode::Replace,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Post => "POST",
        }
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// The transport side of a request: headers in, headers out.
///
/// Stages read request headers and stage response headers here; the
/// transport copies them onto the real response once the chain completes.
#[derive(Debug, Default)]
pub struct Exchange {
    request_headers: HeaderMap,
    response_headers: HeaderMap,
}

impl Exchange {
    pub fn new(request_headers: HeaderMap) -> Self {
        Self {
            request_headers,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    /// A request header as text, if present and valid UTF-8.
    pub fn request_header(&self, name: &HeaderName) -> Option<&str> {
        self.request_headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn into_response_headers(self) -> HeaderMap {
        self.response_headers
    }

    /// Set the `ETag` response header.
    pub fn set_etag(&mut self, etag: &EntityTag) {
        if let Ok(v) = HeaderValue::from_str(&etag.header_value()) {
            self.response_headers.insert(ETAG, v);
        }
    }

    /// Set the `Location` response header. Values that are not valid header
    /// text are dropped.
    pub fn set_location(&mut self, location: &str) -> bool {
        match HeaderValue::from_str(location) {
            Ok(v) => {
                self.response_headers.insert(LOCATION, v);
                true
            }
            Err(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// RequestContext
// ---------------------------------------------------------------------------

/// Request-scoped state shared by every stage of one pipeline run.
///
/// Owned by the task serving the request and dropped with the response.
#[derive(Debug)]
pub struct RequestContext {
    /// Correlates log lines of one request.
    pub request_id: Uuid,
    pub collection: CollectionRef,
    pub method: RequestMethod,
    /// Identifier exactly as it appeared in the URL.
    pub raw_id: Option<String>,
    /// Explicit `id_type` from the query string.
    pub id_type: Option<IdType>,
    /// Resolved identifier, set by the identifier or create stage.
    pub document_id: Option<DocId>,
    /// Inbound payload; replaced in place by the normalized document.
    pub content: Option<Value>,
    pub filter: Option<Document>,
    pub shard_key: Option<Document>,
    /// Entity tag supplied by the caller.
    pub etag: Option<EntityTag>,
    pub etag_check_required: bool,
    pub operation_result: Option<OperationResult>,
    response_status: Option<StatusCode>,
    response_message: Option<String>,
    error: Option<PipelineError>,
}

impl RequestContext {
    pub fn new(collection: CollectionRef, method: RequestMethod) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            collection,
            method,
            raw_id: None,
            id_type: None,
            document_id: None,
            content: None,
            filter: None,
            shard_key: None,
            etag: None,
            etag_check_required: false,
            operation_result: None,
            response_status: None,
            response_message: None,
            error: None,
        }
    }

    /// Context for a write to one identified document.
    pub fn for_document(
        collection: CollectionRef,
        method: RequestMethod,
        raw_id: impl Into<String>,
        id_type: Option<IdType>,
    ) -> Self {
        let mut ctx = Self::new(collection, method);
        ctx.raw_id = Some(raw_id.into());
        ctx.id_type = id_type;
        ctx
    }

    pub fn with_content(mut self, content: Option<Value>) -> Self {
        self.content = content;
        self
    }

    pub fn is_in_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    /// Record a failure: sets the error flag, the status, and the public
    /// message. The first failure wins; later ones are ignored.
    pub fn fail(&mut self, error: PipelineError) {
        if self.error.is_some() {
            return;
        }
        self.response_status = Some(error.status());
        self.response_message = Some(error.public_message());
        self.error = Some(error);
    }

    pub fn set_response_status(&mut self, status: StatusCode) {
        self.response_status = Some(status);
    }

    pub fn response_status(&self) -> Option<StatusCode> {
        self.response_status
    }

    pub fn response_message(&self) -> Option<&str> {
        self.response_message.as_deref()
    }

    /// The normalized content, once a stage has produced it.
    pub fn content_document(&self) -> Option<&Document> {
        self.content.as_ref().and_then(Value::as_document)
    }
}
