use alloy_primitives::{Address, address};
use std::time::Duration;
use tf_api_types::{ChainDescriptor, ChainId, NativeCurrency};

pub const SEPOLIA_CHAIN_ID: &str = "0xaa36a7";
pub const DEFAULT_FACTORY_ADDRESS: Address = address!("0xE32Af55ef214292298F5A6C8399953A265493D83");
/// Gas limit sent with `createToken`, as a percentage of the estimate.
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 120;

/// The network every contract call must run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Short name used in messages ("Sepolia").
    pub name: String,
    pub descriptor: ChainDescriptor,
}

impl NetworkConfig {
    pub fn sepolia() -> Self {
        Self {
            name: "Sepolia".to_owned(),
            descriptor: ChainDescriptor {
                chain_id: ChainId::new(SEPOLIA_CHAIN_ID),
                chain_name: "Sepolia Test Network".to_owned(),
                native_currency: NativeCurrency {
                    name: "Sepolia ETH".to_owned(),
                    symbol: "SepoliaETH".to_owned(),
                    decimals: 18,
                },
                rpc_urls: vec!["https://sepolia.infura.io/v3/".to_owned()],
                block_explorer_urls: vec!["https://sepolia.etherscan.io/".to_owned()],
            },
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.descriptor.chain_id
    }

    pub fn explorer_base(&self) -> Option<&str> {
        self.descriptor.block_explorer_urls.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolling {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 90,
        }
    }
}

impl ReceiptPolling {
    /// No delay between checks; for wallets that mine instantly.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub factory: Address,
    pub network: NetworkConfig,
    pub receipts: ReceiptPolling,
    pub gas_buffer_percent: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            factory: DEFAULT_FACTORY_ADDRESS,
            network: NetworkConfig::sepolia(),
            receipts: ReceiptPolling::default(),
            gas_buffer_percent: DEFAULT_GAS_BUFFER_PERCENT,
        }
    }
}
