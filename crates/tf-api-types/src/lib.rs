use serde::{Deserialize, Serialize};

/// Hex quantity chain identifier as reported by the wallet (`0xaa36a7`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Numeric value of the hex quantity, if it parses.
    pub fn as_u64(&self) -> Option<u64> {
        let trimmed = self.0.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))?;
        if digits.is_empty() {
            return None;
        }
        u64::from_str_radix(digits, 16).ok()
    }

    /// Compares by numeric value so `0xAA36A7` matches `0xaa36a7`.
    /// Falls back to exact string comparison when either side is not hex.
    pub fn matches(&self, other: &ChainId) -> bool {
        match (self.as_u64(), other.as_u64()) {
            (Some(left), Some(right)) => left == right,
            _ => self.0 == other.0,
        }
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters of a `wallet_addEthereumChain` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

// ── dashboard-service request/response bodies ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: Option<AuthUserResponse>,
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub signed_out: bool,
    pub redirect_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub requested: String,
    pub resolved: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConnectResponse {
    pub account: String,
    pub short_account: String,
    pub chain_id: String,
    pub network_name: String,
    pub network_outcome: String,
    pub factory_code_present: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSummary {
    pub address: String,
    pub short_address: String,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListResponse {
    pub owner: String,
    pub tokens: Vec<TokenSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    pub symbol: String,
    pub initial_supply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenResponse {
    pub tx_hash: String,
    pub message: String,
    pub tokens: Vec<TokenSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDetailsResponse {
    pub address: String,
    pub short_address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub balance: String,
    pub balance_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnRequest {
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenActionResponse {
    pub tx_hash: String,
    pub message: String,
    pub balance: String,
    pub balance_display: String,
}
