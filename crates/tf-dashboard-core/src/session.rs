use alloy_primitives::Address;
use tf_api_types::ChainId;
use tf_auth_adapter::AuthenticatedUser;
use tf_wallet_provider::{WalletProvider, WalletProviderExt};
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::negotiation::{NetworkOutcome, ensure_network};

/// A signed-in user bound to a wallet account on the expected chain.
///
/// Only [`connect`] builds one, so holding a `Session` means the network was
/// negotiated.
#[derive(Debug, Clone)]
pub struct Session {
    user: AuthenticatedUser,
    account: Address,
    chain_id: ChainId,
    network_outcome: NetworkOutcome,
    factory_code_present: Option<bool>,
    config: DashboardConfig,
}

impl Session {
    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn network_outcome(&self) -> NetworkOutcome {
        self.network_outcome
    }

    /// Whether the factory address held code at connect time; `None` if the
    /// lookup itself failed.
    pub fn factory_code_present(&self) -> Option<bool> {
        self.factory_code_present
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
}

pub async fn connect<W>(
    wallet: Option<&W>,
    config: &DashboardConfig,
    user: Option<&AuthenticatedUser>,
) -> Result<Session, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    let user = user.ok_or(DashboardError::NotAuthenticated)?;
    let wallet = wallet.ok_or(DashboardError::WalletMissing)?;

    let accounts = wallet.request_accounts().await.map_err(|err| {
        warn!(%err, "wallet refused account access");
        DashboardError::Wallet(err)
    })?;
    let account = *accounts.first().ok_or(DashboardError::NoAccounts)?;

    let network_outcome = ensure_network(wallet, &config.network).await?;

    let factory_code_present = match wallet.get_code(config.factory).await {
        Ok(code) => {
            let present = !code.is_empty();
            if !present {
                warn!(factory = %config.factory, "no contract code at factory address");
            }
            Some(present)
        }
        Err(err) => {
            debug!(%err, "factory code lookup failed");
            None
        }
    };

    info!(
        user = %user.email,
        %account,
        outcome = network_outcome.as_str(),
        "wallet connected"
    );

    Ok(Session {
        user: user.clone(),
        account,
        chain_id: config.network.chain_id().clone(),
        network_outcome,
        factory_code_present,
        config: config.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_wallet_provider::{InMemoryWallet, ProviderError};

    use crate::testing::{ACCOUNT, FACTORY, config, user};

    #[tokio::test]
    async fn connect_binds_first_account_and_expected_chain() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7").with_factory(FACTORY);
        let session = connect(Some(&wallet), &config(), Some(&user())).await.unwrap();

        assert_eq!(session.account(), ACCOUNT);
        assert_eq!(session.chain_id().0, "0xaa36a7");
        assert_eq!(session.network_outcome(), NetworkOutcome::AlreadyActive);
        assert_eq!(session.factory_code_present(), Some(true));
        assert_eq!(session.user().email, "ada@example.com");
        assert_eq!(
            wallet.methods().await,
            vec!["eth_requestAccounts", "eth_chainId", "eth_getCode"]
        );
    }

    #[tokio::test]
    async fn missing_wallet_is_reported() {
        let err = connect::<InMemoryWallet>(None, &config(), Some(&user()))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::WalletMissing));
    }

    #[tokio::test]
    async fn connect_requires_a_signed_in_user() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7");
        let err = connect(Some(&wallet), &config(), None).await.unwrap_err();
        assert!(matches!(err, DashboardError::NotAuthenticated));
        assert!(wallet.requests().await.is_empty());
    }

    #[tokio::test]
    async fn empty_account_list_is_rejected() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7").without_accounts();
        let err = connect(Some(&wallet), &config(), Some(&user())).await.unwrap_err();
        assert!(matches!(err, DashboardError::NoAccounts));
    }

    #[tokio::test]
    async fn rejected_account_access_surfaces_wallet_message() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7").rejecting("eth_requestAccounts");
        let err = connect(Some(&wallet), &config(), Some(&user())).await.unwrap_err();
        assert_eq!(err.to_string(), "User rejected the request.");
        assert_eq!(err.user_message(), "request rejected in wallet");
    }

    #[tokio::test]
    async fn code_lookup_failure_is_not_fatal() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7")
            .with_failure("eth_getCode", ProviderError::Transport("timeout".to_owned()));
        let session = connect(Some(&wallet), &config(), Some(&user())).await.unwrap();
        assert_eq!(session.factory_code_present(), None);
    }

    #[tokio::test]
    async fn factory_without_code_is_recorded() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7");
        let session = connect(Some(&wallet), &config(), Some(&user())).await.unwrap();
        assert_eq!(session.factory_code_present(), Some(false));
    }

    #[tokio::test]
    async fn mismatched_wallet_switches_before_session_exists() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0x1").with_known_chain("0xaa36a7");
        let session = connect(Some(&wallet), &config(), Some(&user())).await.unwrap();
        assert_eq!(session.network_outcome(), NetworkOutcome::Switched);
        assert_eq!(session.chain_id().0, "0xaa36a7");
    }
}
