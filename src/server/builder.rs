//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::SalesService;
use crate::config::ServiceConfig;
use crate::core::service::QueryableSource;
use crate::storage::{RemoteSource, RemoteStore, TableSource};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder wiring configuration, data sources and the REST exposure
///
/// By default the local source is the configured CSV snapshot and the remote
/// source is a PostgREST client built from the `remote` section (when it is
/// complete and the `remote` feature is enabled). Both can be replaced, which
/// is how tests inject scripted stores.
pub struct ServerBuilder {
    config: ServiceConfig,
    local: Option<Arc<dyn QueryableSource>>,
    remote_store: Option<Arc<dyn RemoteStore>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            local: None,
            remote_store: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the CSV snapshot with another local source
    pub fn with_local_source(mut self, source: impl QueryableSource + 'static) -> Self {
        self.local = Some(Arc::new(source));
        self
    }

    /// Use this store instead of building a client from configuration
    pub fn with_remote_store(mut self, store: impl RemoteStore + 'static) -> Self {
        self.remote_store = Some(Arc::new(store));
        self
    }

    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Build the transport-agnostic service
    pub fn build_service(&mut self) -> Result<SalesService> {
        let local = match self.local.take() {
            Some(local) => local,
            None => Arc::new(TableSource::from_path(self.config.data.csv_path.clone())),
        };

        let options = self
            .config
            .remote
            .as_ref()
            .map(|r| r.options())
            .unwrap_or_default();

        let store = match self.remote_store.take() {
            Some(store) => Some(store),
            None => self.remote_store_from_config()?,
        };
        let remote = store.map(|store| {
            Arc::new(RemoteSource::new(store, options)) as Arc<dyn QueryableSource>
        });

        match &remote {
            Some(remote) => tracing::info!(
                remote = %remote.describe(),
                local = %local.describe(),
                "data sources configured"
            ),
            None => tracing::info!(
                local = %local.describe(),
                "no remote store configured, serving from local snapshot"
            ),
        }

        Ok(SalesService::new(local, remote))
    }

    #[cfg(feature = "remote")]
    fn remote_store_from_config(&self) -> Result<Option<Arc<dyn RemoteStore>>> {
        use crate::storage::PostgrestClient;

        let Some(remote) = self.config.active_remote() else {
            return Ok(None);
        };
        let client = PostgrestClient::new(&remote.url, &remote.api_key, remote.timeout())?;
        Ok(Some(Arc::new(client)))
    }

    #[cfg(not(feature = "remote"))]
    fn remote_store_from_config(&self) -> Result<Option<Arc<dyn RemoteStore>>> {
        if self.config.active_remote().is_some() {
            tracing::warn!("remote store configured but the `remote` feature is disabled");
        }
        Ok(None)
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let service = Arc::new(self.build_service()?);
        let custom_routes = std::mem::take(&mut self.custom_routes);
        RestExposure::build_router(service, &self.config.server.allowed_origins, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds to `server.bind` and stops on SIGTERM or Ctrl+C.
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.bind_addr()?;
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
