//! ABI surface of the external contracts the dashboard talks to.
//!
//! The factory deploys burnable ERC-20 tokens with a fixed 18 decimals and
//! indexes them by owner. Nothing here executes contract logic; it only
//! builds calldata and decodes return data.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolType, SolValue, sol, sol_data};
use thiserror::Error;

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface ITokenFactory {
        event TokenCreated(address indexed owner, address indexed token, string name, string symbol, uint256 initialSupply);

        function createToken(string memory name, string memory symbol, uint256 initialSupply) external returns (address);
        function getTokensByOwner(address owner) external view returns (address[] memory);
    }
}

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IBurnableToken {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function burn(uint256 amount) external returns (bool);
    }
}

/// Decimals of every token the factory deploys.
pub const FACTORY_TOKEN_DECIMALS: u8 = 18;

#[derive(Debug, Error)]
#[error("failed to decode {call} return data: {source}")]
pub struct DecodeError {
    pub call: &'static str,
    #[source]
    pub source: alloy_sol_types::Error,
}

pub fn create_token_calldata(name: &str, symbol: &str, initial_supply: U256) -> Vec<u8> {
    ITokenFactory::createTokenCall {
        name: name.to_owned(),
        symbol: symbol.to_owned(),
        initialSupply: initial_supply,
    }
    .abi_encode()
}

pub fn tokens_by_owner_calldata(owner: Address) -> Vec<u8> {
    ITokenFactory::getTokensByOwnerCall { owner }.abi_encode()
}

pub fn name_calldata() -> Vec<u8> {
    IBurnableToken::nameCall {}.abi_encode()
}

pub fn symbol_calldata() -> Vec<u8> {
    IBurnableToken::symbolCall {}.abi_encode()
}

pub fn decimals_calldata() -> Vec<u8> {
    IBurnableToken::decimalsCall {}.abi_encode()
}

pub fn balance_of_calldata(owner: Address) -> Vec<u8> {
    IBurnableToken::balanceOfCall { owner }.abi_encode()
}

pub fn transfer_calldata(to: Address, amount: U256) -> Vec<u8> {
    IBurnableToken::transferCall { to, amount }.abi_encode()
}

pub fn burn_calldata(amount: U256) -> Vec<u8> {
    IBurnableToken::burnCall { amount }.abi_encode()
}

pub fn decode_address_list(call: &'static str, data: &[u8]) -> Result<Vec<Address>, DecodeError> {
    <Vec<Address> as SolValue>::abi_decode(data).map_err(|source| DecodeError { call, source })
}

pub fn decode_string(call: &'static str, data: &[u8]) -> Result<String, DecodeError> {
    <String as SolValue>::abi_decode(data).map_err(|source| DecodeError { call, source })
}

/// `uint8` return values. `u8` itself maps to bytes in Solidity types, so
/// decoding goes through `sol_data::Uint<8>`.
pub fn decode_u8(call: &'static str, data: &[u8]) -> Result<u8, DecodeError> {
    <sol_data::Uint<8> as SolType>::abi_decode(data).map_err(|source| DecodeError { call, source })
}

pub fn decode_u256(call: &'static str, data: &[u8]) -> Result<U256, DecodeError> {
    <U256 as SolValue>::abi_decode(data).map_err(|source| DecodeError { call, source })
}

/// Encodes a single return value the way a contract would, used by fakes.
pub fn encode_return<T: SolValue>(value: T) -> Vec<u8> {
    (value,).abi_encode_params()
}

/// Encodes a `uint8` return value.
pub fn encode_u8_return(value: u8) -> Vec<u8> {
    <sol_data::Uint<8> as SolType>::abi_encode(&value)
}

/// First four bytes of calldata, if present.
pub fn selector(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4).and_then(|bytes| bytes.try_into().ok())
}
