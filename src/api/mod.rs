use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, FlaggedLoanNotifier, FraudRuleEvaluator, LogMailer, LoanService, Mailer,
    SeaOrmAuthService, SeaOrmLoanService,
};

pub mod auth;
mod error;
pub mod loans;
pub mod observability;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub loan_service: Arc<dyn LoanService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires the services around an open store.
pub fn create_app_state(
    config: Config,
    store: Store,
    mailer: Arc<dyn Mailer>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let auth_service = Arc::new(SeaOrmAuthService::new(store.clone(), &config));

    let notifier = FlaggedLoanNotifier::new(store.clone(), mailer, config.notifications.clone());
    let loan_service = Arc::new(SeaOrmLoanService::new(
        store.clone(),
        FraudRuleEvaluator::new(config.fraud.clone()),
        notifier,
    ));

    Arc::new(AppState {
        config: Arc::new(config),
        store,
        auth_service,
        loan_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

/// Opens the configured database and delivers mail through [`LogMailer`].
pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(create_app_state(
        config,
        store,
        Arc::new(LogMailer),
        prometheus_handle,
    ))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(protected_routes)
        .route("/account/registration/", post(auth::register))
        .route("/account/login/", post(auth::login))
        .route("/account/token/refresh/", post(auth::refresh))
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/account/logout/", post(auth::logout))
        .route("/loan/loan-request/{user_id}/", post(loans::loan_request))
        .route(
            "/loan/retrieve-all-loans/{user_id}/",
            get(loans::retrieve_all_loans),
        )
        .route(
            "/loan/admin/loan/{loan_id}/",
            put(loans::update_loan_status).patch(loans::update_loan_status),
        )
        .route("/loan/admin/flagged-loans/", get(loans::flagged_loans))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
