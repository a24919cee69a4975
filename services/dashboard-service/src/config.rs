use alloy_primitives::Address;
use anyhow::Context;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tf_api_types::ChainId;
use tf_dashboard_core::{DashboardConfig, NetworkConfig, ReceiptPolling};

pub(crate) const BIND_ADDR_ENV: &str = "TOKENFORGE_BIND_ADDR";
pub(crate) const FACTORY_ADDRESS_ENV: &str = "TOKENFORGE_FACTORY_ADDRESS";
pub(crate) const CHAIN_ID_ENV: &str = "TOKENFORGE_CHAIN_ID";
pub(crate) const CHAIN_NAME_ENV: &str = "TOKENFORGE_CHAIN_NAME";
pub(crate) const CHAIN_RPC_URL_ENV: &str = "TOKENFORGE_CHAIN_RPC_URL";
pub(crate) const EXPLORER_URL_ENV: &str = "TOKENFORGE_EXPLORER_URL";
pub(crate) const CURRENCY_NAME_ENV: &str = "TOKENFORGE_CURRENCY_NAME";
pub(crate) const CURRENCY_SYMBOL_ENV: &str = "TOKENFORGE_CURRENCY_SYMBOL";
pub(crate) const CURRENCY_DECIMALS_ENV: &str = "TOKENFORGE_CURRENCY_DECIMALS";
pub(crate) const RECEIPT_POLL_MS_ENV: &str = "TOKENFORGE_RECEIPT_POLL_MS";
pub(crate) const RECEIPT_MAX_ATTEMPTS_ENV: &str = "TOKENFORGE_RECEIPT_MAX_ATTEMPTS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Startup configuration. Wallet and identity endpoints are read by their own
/// adapters (`TOKENFORGE_WALLET_RPC_URL`, `FIREBASE_API_KEY`).
#[derive(Debug, Clone)]
pub(crate) struct ServiceConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) dashboard: DashboardConfig,
}

impl ServiceConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let bind_addr = var(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = SocketAddr::from_str(&bind_addr)
            .with_context(|| format!("{BIND_ADDR_ENV} is not a socket address: {bind_addr}"))?;

        let mut dashboard = DashboardConfig::default();
        if let Some(factory) = var(FACTORY_ADDRESS_ENV) {
            dashboard.factory = Address::from_str(&factory)
                .with_context(|| format!("{FACTORY_ADDRESS_ENV} is not an address: {factory}"))?;
        }

        let network = &mut dashboard.network;
        if let Some(chain_id) = var(CHAIN_ID_ENV) {
            let chain_id = ChainId::new(chain_id);
            if chain_id.as_u64().is_none() {
                anyhow::bail!("{CHAIN_ID_ENV} must be a hex quantity like 0xaa36a7, got {chain_id}");
            }
            network.descriptor.chain_id = chain_id;
        }
        if let Some(name) = var(CHAIN_NAME_ENV) {
            network.descriptor.chain_name = format!("{name} Network");
            network.name = name;
        }
        if let Some(rpc_url) = var(CHAIN_RPC_URL_ENV) {
            network.descriptor.rpc_urls = vec![rpc_url];
        }
        if let Some(explorer) = var(EXPLORER_URL_ENV) {
            network.descriptor.block_explorer_urls = vec![explorer];
        }

        let currency = &mut network.descriptor.native_currency;
        if let Some(name) = var(CURRENCY_NAME_ENV) {
            currency.name = name;
        }
        if let Some(symbol) = var(CURRENCY_SYMBOL_ENV) {
            currency.symbol = symbol;
        }
        if let Some(decimals) = var(CURRENCY_DECIMALS_ENV) {
            currency.decimals = decimals
                .parse()
                .with_context(|| format!("{CURRENCY_DECIMALS_ENV} must be 0-255: {decimals}"))?;
        }

        let defaults = ReceiptPolling::default();
        let interval = match var(RECEIPT_POLL_MS_ENV) {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .with_context(|| format!("{RECEIPT_POLL_MS_ENV} must be milliseconds: {ms}"))?,
            ),
            None => defaults.interval,
        };
        let max_attempts = match var(RECEIPT_MAX_ATTEMPTS_ENV) {
            Some(n) => n
                .parse()
                .with_context(|| format!("{RECEIPT_MAX_ATTEMPTS_ENV} must be a number: {n}"))?,
            None => defaults.max_attempts,
        };
        if max_attempts == 0 {
            anyhow::bail!("{RECEIPT_MAX_ATTEMPTS_ENV} must be at least 1");
        }
        dashboard.receipts = ReceiptPolling {
            interval,
            max_attempts,
        };

        Ok(Self {
            bind_addr,
            dashboard,
        })
    }

    pub(crate) fn network(&self) -> &NetworkConfig {
        &self.dashboard.network
    }
}
