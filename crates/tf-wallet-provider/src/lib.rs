//! EIP-1193 wallet capability.
//!
//! The dashboard never reaches for a global wallet object; it is handed a
//! [`WalletProvider`] and sequences JSON-RPC requests through it. Typed
//! helpers for the handful of methods it uses live on [`WalletProviderExt`].

mod memory;

pub use memory::{InMemoryWallet, RecordedRequest};

use alloy_primitives::{Address, U256, hex};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tf_api_types::{ChainDescriptor, ChainId};
use thiserror::Error;
use std::str::FromStr;

/// The user dismissed or rejected the wallet prompt.
pub const USER_REJECTED: i64 = 4001;
/// The wallet has no record of the requested chain.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("{message} (code {code})")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("wallet transport error: {0}")]
    Transport(String),
    #[error("unexpected wallet response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for code 4902, including wallets that nest it under
    /// `data.originalError.code`.
    pub fn is_unrecognized_chain(&self) -> bool {
        match self {
            Self::Rpc { code, data, .. } => {
                *code == UNRECOGNIZED_CHAIN
                    || data
                        .as_ref()
                        .and_then(|d| d.pointer("/originalError/code"))
                        .and_then(Value::as_i64)
                        == Some(UNRECOGNIZED_CHAIN)
            }
            _ => false,
        }
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code() == Some(USER_REJECTED)
    }

    /// The message a wallet attached to the failure, without the code suffix.
    pub fn wallet_message(&self) -> String {
        match self {
            Self::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
    pub gas: Option<U256>,
}

impl TransactionRequest {
    fn to_json(&self) -> Value {
        let mut tx = json!({
            "from": self.from.to_string(),
            "to": self.to.to_string(),
            "data": hex::encode_prefixed(&self.data),
        });
        if let Some(gas) = self.gas {
            tx["gas"] = Value::String(quantity(gas));
        }
        tx
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
}

impl TransactionReceipt {
    /// Post-Byzantium success flag (`status == 0x1`).
    pub fn succeeded(&self) -> bool {
        self.status
            .as_deref()
            .and_then(|s| U256::from_str(s).ok())
            .is_some_and(|s| s == U256::from(1u8))
    }
}

#[async_trait]
pub trait WalletProviderExt: WalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.request("eth_requestAccounts", json!([])).await?;
        let entries: Vec<String> = serde_json::from_value(value)
            .map_err(|err| ProviderError::InvalidResponse(format!("eth_requestAccounts: {err}")))?;
        entries
            .iter()
            .map(|entry| {
                Address::from_str(entry).map_err(|err| {
                    ProviderError::InvalidResponse(format!("account '{entry}': {err}"))
                })
            })
            .collect()
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let value = self.request("eth_chainId", json!([])).await?;
        value
            .as_str()
            .map(ChainId::new)
            .ok_or_else(|| ProviderError::InvalidResponse(format!("eth_chainId: {value}")))
    }

    async fn switch_chain(&self, chain_id: &ChainId) -> Result<(), ProviderError> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.0 }]),
        )
        .await?;
        Ok(())
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError> {
        let params = serde_json::to_value(descriptor)
            .map_err(|err| ProviderError::InvalidResponse(format!("chain descriptor: {err}")))?;
        self.request("wallet_addEthereumChain", Value::Array(vec![params]))
            .await?;
        Ok(())
    }

    async fn get_code(&self, address: Address) -> Result<Vec<u8>, ProviderError> {
        let value = self
            .request("eth_getCode", json!([address.to_string(), "latest"]))
            .await?;
        decode_hex_value("eth_getCode", &value)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        let value = self
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": hex::encode_prefixed(&data) }, "latest"]),
            )
            .await?;
        decode_hex_value("eth_call", &value)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, ProviderError> {
        let value = self
            .request("eth_estimateGas", Value::Array(vec![tx.to_json()]))
            .await?;
        value
            .as_str()
            .and_then(|s| U256::from_str(s).ok())
            .ok_or_else(|| ProviderError::InvalidResponse(format!("eth_estimateGas: {value}")))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, ProviderError> {
        let value = self
            .request("eth_sendTransaction", Value::Array(vec![tx.to_json()]))
            .await?;
        value
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or_else(|| ProviderError::InvalidResponse(format!("eth_sendTransaction: {value}")))
    }

    async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let value = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| ProviderError::InvalidResponse(format!("eth_getTransactionReceipt: {err}")))
    }
}

impl<T: WalletProvider + ?Sized> WalletProviderExt for T {}

/// Hex quantity encoding (`0x` + minimal lowercase digits).
pub fn quantity(value: U256) -> String {
    format!("0x{value:x}")
}

fn decode_hex_value(method: &str, value: &Value) -> Result<Vec<u8>, ProviderError> {
    let text = value
        .as_str()
        .ok_or_else(|| ProviderError::InvalidResponse(format!("{method}: {value}")))?;
    hex::decode(text).map_err(|err| ProviderError::InvalidResponse(format!("{method}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_chain_detected_in_nested_data() {
        let direct = ProviderError::rpc(UNRECOGNIZED_CHAIN, "Unrecognized chain ID");
        assert!(direct.is_unrecognized_chain());

        let nested = ProviderError::Rpc {
            code: -32603,
            message: "Internal error".to_owned(),
            data: Some(json!({ "originalError": { "code": 4902 } })),
        };
        assert!(nested.is_unrecognized_chain());

        let rejected = ProviderError::rpc(USER_REJECTED, "User rejected the request.");
        assert!(!rejected.is_unrecognized_chain());
        assert!(rejected.is_user_rejected());
        assert_eq!(rejected.wallet_message(), "User rejected the request.");
    }

    #[test]
    fn receipt_status_parsing() {
        let ok: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "status": "0x1",
            "blockNumber": "0x10"
        }))
        .unwrap();
        assert!(ok.succeeded());

        let reverted = TransactionReceipt {
            status: Some("0x0".to_owned()),
            ..ok.clone()
        };
        assert!(!reverted.succeeded());

        let legacy = TransactionReceipt { status: None, ..ok };
        assert!(!legacy.succeeded());
    }

    #[test]
    fn transaction_json_uses_hex_quantities() {
        let tx = TransactionRequest {
            from: Address::repeat_byte(0x11),
            to: Address::repeat_byte(0x22),
            data: vec![0xde, 0xad],
            gas: Some(U256::from(240_000u64)),
        };
        let value = tx.to_json();
        assert_eq!(value["data"], "0xdead");
        assert_eq!(value["gas"], "0x3a980");
    }
}
