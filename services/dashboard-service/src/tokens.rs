use alloy_primitives::Address;
use axum::{
    Json,
    extract::{Path, State},
};
use std::str::FromStr;
use std::sync::Arc;
use tf_api_types::{
    BurnRequest, CreateTokenRequest, CreateTokenResponse, TokenActionResponse, TokenDetailsResponse,
    TokenListResponse, TokenSummary, TransferRequest,
};
use tf_dashboard_core::display::{explorer_address_url, short_address};
use tf_dashboard_core::{
    BurnForm, CreateTokenForm, NetworkConfig, TokenActionOutcome, TransferForm, burn as burn_tokens,
    create_token, list_tokens, token_details, transfer as transfer_tokens,
};

use crate::{AppState, ApiError, ApiResult, api_error, bad_request};

pub(crate) async fn list(State(state): State<Arc<AppState>>) -> ApiResult<TokenListResponse> {
    let (session, wallet) = state.active_session().await?;
    let tokens = list_tokens(wallet.as_ref(), &session).await.map_err(api_error)?;
    Ok(Json(TokenListResponse {
        owner: session.account().to_string(),
        tokens: summaries(&tokens, state.config.network()),
    }))
}

pub(crate) async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTokenRequest>,
) -> ApiResult<CreateTokenResponse> {
    let (session, wallet) = state.active_session().await?;
    let _busy = state.create_guard.try_begin().map_err(api_error)?;

    let form = CreateTokenForm::from(request);
    let created = create_token(wallet.as_ref(), &session, &form)
        .await
        .map_err(api_error)?;
    Ok(Json(CreateTokenResponse {
        tx_hash: created.tx_hash,
        message: created.message.to_owned(),
        tokens: summaries(&created.tokens, state.config.network()),
    }))
}

pub(crate) async fn details(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> ApiResult<TokenDetailsResponse> {
    let token = parse_token(&address)?;
    let (session, wallet) = state.active_session().await?;
    let details = token_details(wallet.as_ref(), &session, token)
        .await
        .map_err(api_error)?;
    Ok(Json(TokenDetailsResponse {
        address: details.address.to_string(),
        short_address: short_address(&details.address),
        name: details.name,
        symbol: details.symbol,
        decimals: details.decimals,
        balance: details.balance_text,
        balance_display: details.balance_display,
    }))
}

pub(crate) async fn transfer(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Json(request): Json<TransferRequest>,
) -> ApiResult<TokenActionResponse> {
    let token = parse_token(&address)?;
    let (session, wallet) = state.active_session().await?;
    let _busy = state.transfer_guard.try_begin().map_err(api_error)?;

    let outcome = transfer_tokens(wallet.as_ref(), &session, token, &TransferForm::from(request))
        .await
        .map_err(api_error)?;
    Ok(Json(action_response(outcome)))
}

pub(crate) async fn burn(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Json(request): Json<BurnRequest>,
) -> ApiResult<TokenActionResponse> {
    let token = parse_token(&address)?;
    let (session, wallet) = state.active_session().await?;
    let _busy = state.burn_guard.try_begin().map_err(api_error)?;

    let outcome = burn_tokens(wallet.as_ref(), &session, token, &BurnForm::from(request))
        .await
        .map_err(api_error)?;
    Ok(Json(action_response(outcome)))
}

fn parse_token(address: &str) -> Result<Address, ApiError> {
    Address::from_str(address).map_err(|_| bad_request("invalid token address"))
}

fn summaries(tokens: &[Address], network: &NetworkConfig) -> Vec<TokenSummary> {
    tokens
        .iter()
        .map(|token| TokenSummary {
            address: token.to_string(),
            short_address: short_address(token),
            explorer_url: network
                .explorer_base()
                .map(|base| explorer_address_url(base, token))
                .unwrap_or_default(),
        })
        .collect()
}

fn action_response(outcome: TokenActionOutcome) -> TokenActionResponse {
    TokenActionResponse {
        tx_hash: outcome.tx_hash,
        message: outcome.message,
        balance: outcome.balance_text,
        balance_display: outcome.balance_display,
    }
}
