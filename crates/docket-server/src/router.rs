use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all Docket endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/:db/:coll", post(handler::post_document))
        .route(
            "/:db/:coll/:id",
            get(handler::get_document)
                .put(handler::put_document)
                .patch(handler::patch_document),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
