use axum::{Json, extract::State};
use std::sync::Arc;
use tf_api_types::WalletConnectResponse;
use tf_dashboard_core::connect as connect_session;
use tf_dashboard_core::display::short_address;
use tracing::warn;

use crate::{AppState, ApiResult, api_error};

/// Connects the wallet for the signed-in user. A failed attempt leaves no
/// session behind.
pub(crate) async fn connect(State(state): State<Arc<AppState>>) -> ApiResult<WalletConnectResponse> {
    let user = state.identity.current_user();
    let result = connect_session(state.wallet.as_deref(), &state.config.dashboard, user.as_ref()).await;

    let mut slot = state.session.write().await;
    let session = match result {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "wallet connect failed");
            *slot = None;
            return Err(api_error(err));
        }
    };

    let response = WalletConnectResponse {
        account: session.account().to_string(),
        short_account: short_address(&session.account()),
        chain_id: session.chain_id().to_string(),
        network_name: state.config.network().name.clone(),
        network_outcome: session.network_outcome().as_str().to_owned(),
        factory_code_present: session.factory_code_present(),
    };
    *slot = Some(session);
    Ok(Json(response))
}
