use serde::Serialize;
use tf_wallet_provider::{WalletProvider, WalletProviderExt};
use tracing::{info, warn};

use crate::config::NetworkConfig;
use crate::error::DashboardError;

/// How the wallet ended up on the expected chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkOutcome {
    AlreadyActive,
    Switched,
    /// The wallet did not know the chain and accepted the descriptor.
    Registered,
}

impl NetworkOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyActive => "already_active",
            Self::Switched => "switched",
            Self::Registered => "registered",
        }
    }
}

/// Brings the wallet onto `network`.
///
/// Issues at most one switch request and, if the wallet reports the chain as
/// unrecognized, one add-chain request. Nothing is retried.
pub async fn ensure_network<W>(
    wallet: &W,
    network: &NetworkConfig,
) -> Result<NetworkOutcome, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    let expected = network.chain_id();
    let current = wallet.chain_id().await.map_err(|err| {
        warn!(%err, "failed to read wallet chain id");
        DashboardError::NetworkUnverified(err)
    })?;

    if current.matches(expected) {
        return Ok(NetworkOutcome::AlreadyActive);
    }

    info!(%current, %expected, "wallet on wrong network; requesting switch");
    let mismatch = |cause| DashboardError::NetworkMismatch {
        network: network.name.clone(),
        expected: expected.clone(),
        current: current.clone(),
        cause,
    };

    match wallet.switch_chain(expected).await {
        Ok(()) => Ok(NetworkOutcome::Switched),
        Err(err) if err.is_unrecognized_chain() => {
            info!(%expected, "wallet does not know the chain; requesting registration");
            match wallet.add_chain(&network.descriptor).await {
                Ok(()) => Ok(NetworkOutcome::Registered),
                Err(err) => {
                    warn!(%err, "chain registration failed");
                    Err(mismatch(err))
                }
            }
        }
        Err(err) => {
            warn!(%err, "network switch failed");
            Err(mismatch(err))
        }
    }
}
