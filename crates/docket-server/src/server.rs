use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use docket_pipeline::{Pipeline, UpdateExecutor};
use docket_store::{DocumentStore, InMemoryDocumentStore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Docket document server.
pub struct DocketServer {
    state: AppState,
}

impl DocketServer {
    /// A server over a fresh in-memory store.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryDocumentStore::new()))
    }

    pub fn with_store(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
        let executor = Arc::new(UpdateExecutor::new(
            Arc::clone(&store),
            config.executor_config(),
        ));
        let state = AppState {
            config: Arc::new(config),
            store,
            document_write: Arc::new(Pipeline::document_write(Arc::clone(&executor))),
            collection_create: Arc::new(Pipeline::collection_create(executor)),
        };
        Self { state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Create the unique indexes listed in the configuration.
    pub async fn apply_indexes(&self) -> ServerResult<()> {
        for coll in &self.state.config.collections {
            let coll_ref = coll.collection_ref();
            for index in &coll.unique_indexes {
                self.state
                    .store
                    .ensure_unique_index(&coll_ref, index.clone())
                    .await?;
                info!(collection = %coll_ref, index = %index.name, "unique index ready");
            }
        }
        Ok(())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        self.apply_indexes().await?;
        let app = self.router();
        let addr = self.state.config.bind_addr;
        let listener = TcpListener::bind(addr).await?;
        info!("Docket server listening on {addr}");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
