pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod utils;
pub mod validation;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::adapters::PostgresDirectoryStore;
use crate::config::Config;
use crate::gateway::HttpNotificationGateway;
use crate::middleware::staff_auth;
use crate::ports::{DirectoryStore, NotificationGateway};
use crate::services::{
    ConfirmationService, ManualPaymentReporter, PaymentRecordStore, ReconciliationMatcher,
    ReminderScheduler,
};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Config,
    pub store: PaymentRecordStore,
    pub reporter: ManualPaymentReporter,
    pub confirmation: ConfirmationService,
    pub matcher: ReconciliationMatcher,
    pub scheduler: ReminderScheduler,
}

impl AppState {
    /// Production wiring: directory rows live in the shared database, the
    /// notification gateway is reached over HTTP.
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        let directory: Arc<dyn DirectoryStore> = Arc::new(PostgresDirectoryStore::new(db.clone()));
        let gateway: Arc<dyn NotificationGateway> = Arc::new(HttpNotificationGateway::new(
            config.notify_gateway_url.clone(),
        ));

        Self::with_collaborators(db, config, directory, gateway)
    }

    /// Wiring with explicit collaborators, used by tests to plug in mocks.
    pub fn with_collaborators(
        db: sqlx::PgPool,
        config: Config,
        directory: Arc<dyn DirectoryStore>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        let store = PaymentRecordStore::new(db.clone(), directory.clone(), gateway.clone());
        let reporter = ManualPaymentReporter::new(
            db.clone(),
            directory,
            config.duplicate_report_window_minutes,
            config.reminder_delay_minutes,
        );
        let confirmation = ConfirmationService::new(store.clone());
        let matcher = ReconciliationMatcher::new(store.clone(), config.match_epsilon.clone());
        let scheduler = ReminderScheduler::new(
            db.clone(),
            gateway,
            config.staff_channel.clone(),
            config.reminder_scan_interval_minutes,
        );

        Self {
            db,
            config,
            store,
            reporter,
            confirmation,
            matcher,
            scheduler,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route(
            "/claims",
            post(handlers::claims::report_claim).get(handlers::claims::list_claims),
        )
        .route("/claims/:id", get(handlers::claims::get_claim))
        .route("/claims/:id/confirm", post(handlers::claims::confirm_claim))
        .route(
            "/claims/:id/not-received",
            post(handlers::claims::mark_not_received),
        )
        .route(
            "/reconciliation/import",
            post(handlers::reconciliation::import_extract),
        )
        .layer(from_fn_with_state(state.config.clone(), staff_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(staff_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
