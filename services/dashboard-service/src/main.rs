mod auth;
mod config;
mod tokens;
mod wallet;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::{Arc, Weak};
use tf_auth_adapter::{
    FirebaseIdentityProvider, IdentityError, IdentityProvider, InMemoryIdentityProvider,
};
use tf_dashboard_core::{DashboardError, FormGuard, Session};
use tf_wallet_provider::WalletProvider;
use tf_wallet_rpc::HttpWalletProvider;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::ServiceConfig;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);
pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

/// The single in-memory page state: who is signed in and which wallet
/// session they hold.
pub(crate) struct AppState {
    pub(crate) config: ServiceConfig,
    pub(crate) wallet: Option<Arc<dyn WalletProvider>>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) session: RwLock<Option<Session>>,
    pub(crate) create_guard: FormGuard,
    pub(crate) transfer_guard: FormGuard,
    pub(crate) burn_guard: FormGuard,
}

impl AppState {
    pub(crate) fn new(
        config: ServiceConfig,
        wallet: Option<Arc<dyn WalletProvider>>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config,
            wallet,
            identity,
            session: RwLock::new(None),
            create_guard: FormGuard::new("create token"),
            transfer_guard: FormGuard::new("transfer"),
            burn_guard: FormGuard::new("burn"),
        }
    }

    /// The connected session of the signed-in user, or the reason there is
    /// none. A session left over from another user counts as not connected.
    pub(crate) async fn active_session(&self) -> Result<(Session, Arc<dyn WalletProvider>), ApiError> {
        let user = self
            .identity
            .current_user()
            .ok_or_else(|| api_error(DashboardError::NotAuthenticated))?;
        let wallet = self
            .wallet
            .clone()
            .ok_or_else(|| api_error(DashboardError::WalletMissing))?;
        let session = self
            .session
            .read()
            .await
            .clone()
            .filter(|session| session.user().user_id == user.user_id)
            .ok_or_else(|| api_error(DashboardError::NotConnected))?;
        Ok((session, wallet))
    }

    /// Clears the wallet session unless it belongs to `user_id`. Returns
    /// whether a session was dropped.
    pub(crate) async fn retain_session_for(&self, user_id: Option<&str>) -> bool {
        let mut session = self.session.write().await;
        let stale = session
            .as_ref()
            .is_some_and(|s| Some(s.user().user_id.as_str()) != user_id);
        if stale {
            *session = None;
        }
        stale
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;

    let wallet: Option<Arc<dyn WalletProvider>> = match HttpWalletProvider::from_env() {
        Some(provider) => {
            info!(endpoint = provider.endpoint(), "using JSON-RPC wallet provider");
            Some(Arc::new(provider))
        }
        None => {
            warn!("no wallet endpoint configured; wallet connect will report a missing wallet");
            None
        }
    };

    let identity: Arc<dyn IdentityProvider> = match FirebaseIdentityProvider::from_env() {
        Some(provider) => {
            info!("using Firebase identity provider");
            Arc::new(provider)
        }
        None => {
            info!("FIREBASE_API_KEY unset; using in-memory identity provider");
            Arc::new(InMemoryIdentityProvider::new())
        }
    };

    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(config, wallet, identity));
    spawn_session_watch(&state);
    let app = build_router(state);

    info!("dashboard-service listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/route", get(auth::route))
        .route("/wallet/connect", post(wallet::connect))
        .route("/tokens", get(tokens::list).post(tokens::create))
        .route("/tokens/{address}", get(tokens::details))
        .route("/tokens/{address}/transfer", post(tokens::transfer))
        .route("/tokens/{address}/burn", post(tokens::burn))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Drops the wallet session whenever the signed-in user changes.
fn spawn_session_watch(state: &Arc<AppState>) {
    let mut feed = state.identity.subscribe();
    let state: Weak<AppState> = Arc::downgrade(state);
    tokio::spawn(async move {
        while feed.changed().await.is_ok() {
            let user_id = feed.borrow_and_update().as_ref().map(|u| u.user_id.clone());
            let Some(state) = state.upgrade() else {
                break;
            };
            if state.retain_session_for(user_id.as_deref()).await {
                info!("signed-in user changed; clearing wallet session");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "dashboard-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "dashboard-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Maps a dashboard failure to a status code and its display message.
pub(crate) fn api_error(err: DashboardError) -> ApiError {
    let message = err.user_message();
    match &err {
        DashboardError::Validation(_)
        | DashboardError::InvalidAmount(_)
        | DashboardError::InvalidRecipient
        | DashboardError::Identity(IdentityError::SignUpFailed { .. }) => bad_request(&message),
        DashboardError::NotAuthenticated
        | DashboardError::Identity(IdentityError::SignInFailed { .. }) => unauthorized(&message),
        DashboardError::WalletMissing
        | DashboardError::NotConnected
        | DashboardError::NoAccounts
        | DashboardError::NetworkMismatch { .. }
        | DashboardError::Busy(_) => conflict(&message),
        DashboardError::NetworkUnverified(_)
        | DashboardError::Wallet(_)
        | DashboardError::Decode(_)
        | DashboardError::Reverted { .. }
        | DashboardError::ReceiptTimeout { .. } => {
            warn!(error = %err, "upstream failure");
            bad_gateway(&message)
        }
    }
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub(crate) fn unauthorized(message: &str) -> ApiError {
    error_response(StatusCode::UNAUTHORIZED, message)
}

pub(crate) fn conflict(message: &str) -> ApiError {
    error_response(StatusCode::CONFLICT, message)
}

pub(crate) fn bad_gateway(message: &str) -> ApiError {
    error_response(StatusCode::BAD_GATEWAY, message)
}

fn error_response(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}
