//! # Ride Admin Server
//!
//! Standalone server for the admin dashboard. Wires the configured backend
//! adapters into the dashboard service and serves the HTTP routes.

mod config;

pub use config::{
    load_config, parse_config, AppConfig, Backend, CollectionsConfig, ConfigError,
    FirebaseSettings, ServerConfig,
};

use ride_admin_adapter_firebase::{FirebaseStorage, FirestoreStore, IdentityToolkit};
use ride_admin_adapter_memory::{MemoryAuthProvider, MemoryDocumentStore, MemoryObjectStore};
use ride_admin_axum::{admin_routes, AppState, GuardLayer};
use ride_admin_core::traits::{AuthProvider, DocumentStore, ObjectStore};
use ride_admin_core::{SessionContext, SessionSubscription};
use ride_admin_dashboard::AdminApi;
use std::sync::Arc;

/// The admin server.
pub struct AdminServer {
    /// Server configuration.
    pub config: AppConfig,
    api: Arc<AdminApi>,
    auth: Arc<dyn AuthProvider>,
    session: SessionContext,
    _subscription: Option<SessionSubscription>,
}

impl AdminServer {
    /// Creates a server and its backend adapters.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let admin_config = config.admin_config()?;
        let session = SessionContext::new();

        let (store, objects, auth, subscription): (
            Arc<dyn DocumentStore>,
            Arc<dyn ObjectStore>,
            Arc<dyn AuthProvider>,
            Option<SessionSubscription>,
        ) = match (config.server.backend, &config.firebase) {
            (Backend::Firebase, Some(firebase)) => {
                let firebase = firebase.to_firebase_config();
                (
                    Arc::new(FirestoreStore::new(firebase.clone())),
                    Arc::new(FirebaseStorage::new(firebase.clone())),
                    Arc::new(IdentityToolkit::new(firebase)),
                    None,
                )
            }
            (Backend::Firebase, None) => {
                return Err(ConfigError::Missing("firebase".to_string()));
            }
            (Backend::Memory, _) => {
                let auth = MemoryAuthProvider::new();
                let subscription = session.attach(auth.listen());
                (
                    Arc::new(MemoryDocumentStore::new()),
                    Arc::new(MemoryObjectStore::new()),
                    Arc::new(auth),
                    Some(subscription),
                )
            }
        };

        Ok(Self {
            api: Arc::new(AdminApi::with_config(store, objects, admin_config)),
            auth,
            session,
            config,
            _subscription: subscription,
        })
    }

    /// Gets the dashboard service.
    pub fn api(&self) -> &AdminApi {
        &self.api
    }

    /// Gets the session context.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Builds the guarded HTTP router.
    pub fn router(&self) -> axum::Router {
        let state = AppState::new(self.api.clone(), self.auth.clone());
        admin_routes(state).layer(GuardLayer::new().verify_with(self.auth.clone()))
    }

    /// Serves HTTP until the process is stopped.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server.bind_addr();
        tracing::info!(
            backend = ?self.config.server.backend,
            "Starting Ride Admin Server on {}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Server ready");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Adds `createdAt` to users that lack it.
    pub async fn backfill_created_at(&self) -> Result<usize, Box<dyn std::error::Error>> {
        Ok(self.api.backfill_user_created_at().await?)
    }
}
