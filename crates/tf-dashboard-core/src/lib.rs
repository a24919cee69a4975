//! Dashboard flows: wallet session negotiation, token deployment through the
//! factory, and per-token transfer and burn.
//!
//! Every contract operation takes the [`Session`] it runs under. A session
//! only comes out of [`connect`], which negotiates the wallet network first.

pub mod busy;
pub mod config;
pub mod display;
pub mod error;
pub mod factory;
pub mod forms;
pub mod navigation;
pub mod negotiation;
pub mod session;
pub mod token;
pub mod tx;

pub use busy::{BusyToken, FormGuard};
pub use config::{DashboardConfig, NetworkConfig, ReceiptPolling};
pub use error::DashboardError;
pub use factory::{CreatedToken, create_token, list_tokens};
pub use forms::{BurnForm, CreateTokenForm, TransferForm};
pub use navigation::{Route, resolve_route};
pub use negotiation::{NetworkOutcome, ensure_network};
pub use session::{Session, connect};
pub use token::{TokenActionOutcome, TokenDetails, burn, token_details, transfer};

#[cfg(test)]
pub(crate) mod testing {
    use alloy_primitives::{Address, U256};
    use tf_auth_adapter::AuthenticatedUser;
    use tf_wallet_provider::InMemoryWallet;

    use crate::{DashboardConfig, ReceiptPolling, Session, connect};

    pub const ACCOUNT: Address = Address::new([0xac; 20]);
    pub const FACTORY: Address = Address::new([0xfa; 20]);
    pub const TOKEN: Address = Address::new([0x70; 20]);

    pub fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "user-1".to_owned(),
            email: "ada@example.com".to_owned(),
            id_token: None,
        }
    }

    pub fn config() -> DashboardConfig {
        DashboardConfig {
            factory: FACTORY,
            receipts: ReceiptPolling::immediate(3),
            ..DashboardConfig::default()
        }
    }

    /// Sepolia wallet with one 18-decimal token holding `balance` base units.
    pub fn wallet_with_token(balance: U256) -> InMemoryWallet {
        InMemoryWallet::new(ACCOUNT, "0xaa36a7")
            .with_factory(FACTORY)
            .with_token(TOKEN, "Forge Token", "FRG", 18, ACCOUNT, balance)
    }

    pub async fn session(wallet: &InMemoryWallet) -> Session {
        connect(Some(wallet), &config(), Some(&user())).await.unwrap()
    }
}
