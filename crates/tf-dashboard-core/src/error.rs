use tf_api_types::ChainId;
use tf_auth_adapter::IdentityError;
use tf_contracts::DecodeError;
use tf_units::UnitsError;
use tf_wallet_provider::ProviderError;
use thiserror::Error;

/// Everything a dashboard action can fail with. The `Display` text is the
/// message shown to the user.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no wallet is available; install or configure a wallet provider")]
    WalletMissing,
    #[error("please sign in first")]
    NotAuthenticated,
    #[error("please connect your wallet first")]
    NotConnected,
    #[error("the wallet did not return any accounts")]
    NoAccounts,
    #[error("please switch to {network} network. Current network ID: {current}")]
    NetworkMismatch {
        network: String,
        expected: ChainId,
        current: ChainId,
        #[source]
        cause: ProviderError,
    },
    #[error("could not verify network")]
    NetworkUnverified(#[source] ProviderError),
    #[error("{0}")]
    Validation(&'static str),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] UnitsError),
    #[error("invalid recipient address")]
    InvalidRecipient,
    #[error("a {0} request is already in progress")]
    Busy(&'static str),
    #[error("{}", .0.wallet_message())]
    Wallet(#[from] ProviderError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },
    #[error("transaction {tx_hash} was not confirmed after {attempts} checks")]
    ReceiptTimeout { tx_hash: String, attempts: u32 },
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl DashboardError {
    /// Message to display for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Wallet(err) if err.is_user_rejected() => "request rejected in wallet".to_owned(),
            other => other.to_string(),
        }
    }
}
