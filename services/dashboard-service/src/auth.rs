use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tf_api_types::{AuthUserResponse, CredentialsRequest, CurrentUserResponse, LogoutResponse, RouteResponse};
use tf_auth_adapter::{AuthenticatedUser, IdentityError};
use tf_dashboard_core::{DashboardError, Route, resolve_route};
use tracing::{info, warn};

use crate::{AppState, ApiResult, api_error};

#[derive(Debug, Deserialize)]
pub(crate) struct RouteQuery {
    path: Option<String>,
}

pub(crate) async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<AuthUserResponse> {
    let user = state
        .identity
        .create_account(&request.email, &request.password)
        .await
        .map_err(identity_failure)?;
    state.retain_session_for(Some(user.user_id.as_str())).await;
    info!(user_id = %user.user_id, "account created");
    Ok(Json(user_response(&user)))
}

pub(crate) async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<AuthUserResponse> {
    let user = state
        .identity
        .sign_in(&request.email, &request.password)
        .await
        .map_err(identity_failure)?;
    state.retain_session_for(Some(user.user_id.as_str())).await;
    info!(user_id = %user.user_id, "signed in");
    Ok(Json(user_response(&user)))
}

/// Signs out and drops the wallet session; the page goes back to login.
pub(crate) async fn logout(State(state): State<Arc<AppState>>) -> ApiResult<LogoutResponse> {
    state.identity.sign_out().await.map_err(identity_failure)?;
    *state.session.write().await = None;
    info!("signed out");
    Ok(Json(LogoutResponse {
        signed_out: true,
        redirect_to: Route::Login.path().to_owned(),
    }))
}

pub(crate) async fn me(State(state): State<Arc<AppState>>) -> Json<CurrentUserResponse> {
    let user = state.identity.current_user();
    let account = match &user {
        Some(user) => state
            .session
            .read()
            .await
            .as_ref()
            .filter(|session| session.user().user_id == user.user_id)
            .map(|session| session.account().to_string()),
        None => None,
    };
    Json(CurrentUserResponse {
        user: user.as_ref().map(user_response),
        account,
    })
}

pub(crate) async fn route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> Json<RouteResponse> {
    let requested = query.path.unwrap_or_else(|| Route::Dashboard.path().to_owned());
    let resolved = resolve_route(&requested, state.identity.current_user().is_some());
    Json(RouteResponse {
        requested,
        resolved: resolved.path().to_owned(),
    })
}

fn user_response(user: &AuthenticatedUser) -> AuthUserResponse {
    AuthUserResponse {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
    }
}

fn identity_failure(err: IdentityError) -> crate::ApiError {
    warn!(reason = err.reason(), "identity provider request failed");
    api_error(DashboardError::Identity(err))
}
