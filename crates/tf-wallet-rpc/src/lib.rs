use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tf_wallet_provider::{ProviderError, WalletProvider};
use tracing::{debug, warn};

pub const WALLET_RPC_URL_ENV: &str = "TOKENFORGE_WALLET_RPC_URL";

/// JSON-RPC 2.0 wallet reached over HTTP.
///
/// Suits a wallet bridge or a development node with unlocked accounts. The
/// endpoint is taken from the constructor or, failing that, from
/// `TOKENFORGE_WALLET_RPC_URL`.
pub struct HttpWalletProvider {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpWalletProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// `None` when no endpoint is configured, i.e. there is no wallet.
    pub fn from_env() -> Option<Self> {
        std::env::var(WALLET_RPC_URL_ENV)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map(Self::new)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ── JSON-RPC envelope ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[async_trait]
impl WalletProvider for HttpWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, endpoint = %self.endpoint, "wallet rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(format!("{method}: {err}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let parsed = match serde_json::from_str::<RpcResponse>(&text) {
            Ok(parsed) => parsed,
            Err(err) if status.is_success() => {
                return Err(ProviderError::InvalidResponse(format!("{method}: {err}")));
            }
            Err(_) => {
                return Err(ProviderError::Transport(format!("{method}: HTTP {status}: {text}")));
            }
        };

        decode_response(method, parsed)
    }
}

fn decode_response(method: &str, response: RpcResponse) -> Result<Value, ProviderError> {
    if let Some(error) = response.error {
        warn!(method, code = error.code, "wallet rpc error: {}", error.message);
        return Err(ProviderError::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }
    // a missing result is a JSON null (e.g. an unknown receipt)
    Ok(response.result.unwrap_or(Value::Null))
}
