use alloy_primitives::U256;
use tf_wallet_provider::{TransactionReceipt, TransactionRequest, WalletProvider, WalletProviderExt};
use tracing::{debug, info, warn};

use crate::config::ReceiptPolling;
use crate::error::DashboardError;

/// `estimate * percent / 100`, saturating.
pub fn with_gas_buffer(estimate: U256, percent: u64) -> U256 {
    estimate.saturating_mul(U256::from(percent)) / U256::from(100u8)
}

/// Polls until the transaction is mined. A receipt without success status is
/// reported as [`DashboardError::Reverted`].
pub async fn wait_for_receipt<W>(
    wallet: &W,
    tx_hash: &str,
    polling: ReceiptPolling,
) -> Result<TransactionReceipt, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    for attempt in 1..=polling.max_attempts {
        if let Some(receipt) = wallet.transaction_receipt(tx_hash).await? {
            if !receipt.succeeded() {
                warn!(tx_hash, status = ?receipt.status, "transaction reverted");
                return Err(DashboardError::Reverted {
                    tx_hash: tx_hash.to_owned(),
                });
            }
            debug!(tx_hash, attempt, block = ?receipt.block_number, "transaction mined");
            return Ok(receipt);
        }
        if attempt < polling.max_attempts {
            tokio::time::sleep(polling.interval).await;
        }
    }

    Err(DashboardError::ReceiptTimeout {
        tx_hash: tx_hash.to_owned(),
        attempts: polling.max_attempts,
    })
}

/// Sends `tx` and waits for its receipt; returns the transaction hash.
pub async fn send_and_confirm<W>(
    wallet: &W,
    tx: &TransactionRequest,
    polling: ReceiptPolling,
) -> Result<String, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    let tx_hash = wallet.send_transaction(tx).await?;
    info!(%tx_hash, to = %tx.to, "transaction sent");
    wait_for_receipt(wallet, &tx_hash, polling).await?;
    Ok(tx_hash)
}
