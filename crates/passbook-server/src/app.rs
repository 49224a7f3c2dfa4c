//! Router construction and shared application state.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use passbook_core::store::{RecordStore, StoreError};
use passbook_service::{AccountService, ServiceConfig};
use passbook_store::{JsonFileStore, MemoryStore, RemoteDocumentStore, RemoteStoreConfig};

use crate::api;
use crate::config::{BackendKind, ServerConfig};

/// Shared state injected into every handler.
pub struct AppState<S> {
    pub service: Arc<AccountService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

/// Build the account API router over a concrete store backend.
pub fn build_router<S: RecordStore + 'static>(service: AccountService<S>) -> Router {
    let state = AppState {
        service: Arc::new(service),
    };

    Router::new()
        .route("/domains/{name}", post(api::create_domain::<S>))
        .route(
            "/accounts/{domain}/{email}/{password}/{api_key}",
            post(api::create_account::<S>).delete(api::delete_account::<S>),
        )
        .route(
            "/sessions/{domain}/{email}/{password}/{api_key}",
            post(api::sign_in::<S>),
        )
        .route(
            "/accounts/{domain}/{email}/password/{new_password}/{api_key}",
            post(api::reset_password::<S>),
        )
        .route(
            "/accounts/{domain}/{email}/email/{new_email}/{api_key}",
            post(api::reset_email::<S>),
        )
        .route("/accounts/{domain}/{api_key}", get(api::list_accounts::<S>))
        // Single-tenant surface over the implicit global collection.
        .route(
            "/create/{email}/{password}",
            post(api::create_account_global::<S>),
        )
        .route("/signin/{email}/{password}", post(api::sign_in_global::<S>))
        .route("/users", get(api::list_accounts_global::<S>))
        .route("/wake", get(api::wake))
        .route("/healthz", get(api::health))
        .with_state(state)
}

/// Select the backend from configuration and wire the service. The
/// router type-erases the store, so each arm returns the same `Router`.
pub fn build(config: &ServerConfig) -> Result<Router, StoreError> {
    let service_config = ServiceConfig {
        pepper: config.pepper.clone(),
        ..Default::default()
    };

    let router = match config.backend {
        BackendKind::Memory => build_router(AccountService::new(
            Arc::new(MemoryStore::new()),
            service_config,
        )),
        BackendKind::File => build_router(AccountService::new(
            Arc::new(JsonFileStore::new(&config.data_path)),
            service_config,
        )),
        BackendKind::Remote => {
            // from_env guarantees the URL is present for this backend.
            let base_url = config.remote_url.clone().unwrap_or_default();
            let store_config = RemoteStoreConfig {
                base_url,
                token: config.remote_token.clone(),
                timeout: config.remote_timeout,
            };
            build_router(AccountService::new(
                Arc::new(RemoteDocumentStore::new(store_config)?),
                service_config,
            ))
        }
    };
    Ok(router)
}
