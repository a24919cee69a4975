use alloy_primitives::{Address, U256, hex};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::str::FromStr;
use tf_api_types::{ChainDescriptor, ChainId};
use tf_contracts::{IBurnableToken, ITokenFactory, encode_return, encode_u8_return, selector};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{METHOD_NOT_FOUND, ProviderError, UNRECOGNIZED_CHAIN, USER_REJECTED, WalletProvider};

const EXECUTION_REVERTED: i64 = 3;
const DEFAULT_GAS_ESTIMATE: u64 = 200_000;
// Stand-in bytecode so eth_getCode reports a deployed contract.
const CONTRACT_CODE: &str = "0x6080604052";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone)]
struct MockToken {
    name: String,
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, U256>,
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    factory: Option<Address>,
    tokens: HashMap<Address, MockToken>,
    owners: HashMap<Address, Vec<Address>>,
    deployed: u64,
}

#[derive(Debug, Default)]
struct WalletState {
    accounts: Vec<Address>,
    active_chain: Option<ChainId>,
    known_chains: Vec<ChainId>,
    failures: HashMap<String, ProviderError>,
    ledger: Ledger,
    receipts: HashMap<String, Value>,
    sent: u64,
    log: Vec<RecordedRequest>,
}

/// Wallet fake with an in-memory chain, token factory and burnable tokens.
///
/// Every request is appended to a log so tests can assert call order.
#[derive(Default)]
pub struct InMemoryWallet {
    state: Mutex<WalletState>,
}

impl InMemoryWallet {
    /// A wallet unlocked for `account`, active on (and aware of) `chain_id`.
    pub fn new(account: Address, chain_id: impl Into<String>) -> Self {
        let chain_id = ChainId::new(chain_id);
        let state = WalletState {
            accounts: vec![account],
            active_chain: Some(chain_id.clone()),
            known_chains: vec![chain_id],
            ..WalletState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_known_chain(mut self, chain_id: impl Into<String>) -> Self {
        let chain_id = ChainId::new(chain_id);
        let state = self.state.get_mut();
        if !state.known_chains.iter().any(|known| known.matches(&chain_id)) {
            state.known_chains.push(chain_id);
        }
        self
    }

    pub fn without_accounts(mut self) -> Self {
        self.state.get_mut().accounts.clear();
        self
    }

    pub fn with_factory(mut self, factory: Address) -> Self {
        self.state.get_mut().ledger.factory = Some(factory);
        self
    }

    /// Deploys a token directly, owned by `owner` and indexed under them.
    pub fn with_token(
        mut self,
        token: Address,
        name: &str,
        symbol: &str,
        decimals: u8,
        owner: Address,
        balance: U256,
    ) -> Self {
        let ledger = &mut self.state.get_mut().ledger;
        ledger.tokens.insert(
            token,
            MockToken {
                name: name.to_owned(),
                symbol: symbol.to_owned(),
                decimals,
                balances: HashMap::from([(owner, balance)]),
            },
        );
        ledger.owners.entry(owner).or_default().push(token);
        self
    }

    /// Every later call to `method` fails with `error`.
    pub fn with_failure(mut self, method: &str, error: ProviderError) -> Self {
        self.state.get_mut().failures.insert(method.to_owned(), error);
        self
    }

    /// Shorthand for a 4001 user rejection on `method`.
    pub fn rejecting(self, method: &str) -> Self {
        self.with_failure(method, ProviderError::rpc(USER_REJECTED, "User rejected the request."))
    }

    pub async fn clear_failure(&self, method: &str) {
        self.state.lock().await.failures.remove(method);
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.log.clone()
    }

    pub async fn methods(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .log
            .iter()
            .map(|entry| entry.method.clone())
            .collect()
    }

    pub async fn active_chain(&self) -> Option<ChainId> {
        self.state.lock().await.active_chain.clone()
    }

    pub async fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.state
            .lock()
            .await
            .ledger
            .tokens
            .get(&token)
            .and_then(|t| t.balances.get(&owner).copied())
            .unwrap_or_default()
    }

    pub async fn tokens_of(&self, owner: Address) -> Vec<Address> {
        self.state
            .lock()
            .await
            .ledger
            .owners
            .get(&owner)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl WalletProvider for InMemoryWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let mut state = self.state.lock().await;
        state.log.push(RecordedRequest {
            method: method.to_owned(),
            params: params.clone(),
        });
        debug!(method, "in-memory wallet request");

        if let Some(error) = state.failures.get(method) {
            return Err(error.clone());
        }

        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(
                state
                    .accounts
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
            )),
            "eth_chainId" => state
                .active_chain
                .as_ref()
                .map(|c| Value::String(c.0.clone()))
                .ok_or_else(|| ProviderError::Transport("wallet is disconnected".to_owned())),
            "wallet_switchEthereumChain" => {
                let requested = param_str(&params, "/0/chainId")?;
                let requested = ChainId::new(requested);
                let Some(known) = state
                    .known_chains
                    .iter()
                    .find(|known| known.matches(&requested))
                    .cloned()
                else {
                    return Err(ProviderError::rpc(
                        UNRECOGNIZED_CHAIN,
                        format!("Unrecognized chain ID \"{requested}\"."),
                    ));
                };
                state.active_chain = Some(known);
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let descriptor: ChainDescriptor = params
                    .get(0)
                    .cloned()
                    .ok_or_else(|| invalid_params("missing chain descriptor"))
                    .and_then(|v| {
                        serde_json::from_value(v).map_err(|err| invalid_params(&err.to_string()))
                    })?;
                let chain_id = descriptor.chain_id.clone();
                if !state.known_chains.iter().any(|known| known.matches(&chain_id)) {
                    state.known_chains.push(chain_id.clone());
                }
                state.active_chain = Some(chain_id);
                Ok(Value::Null)
            }
            "eth_getCode" => {
                let address = param_address(&params, "/0")?;
                let ledger = &state.ledger;
                let deployed =
                    ledger.factory == Some(address) || ledger.tokens.contains_key(&address);
                Ok(Value::String(if deployed { CONTRACT_CODE } else { "0x" }.to_owned()))
            }
            "eth_call" => {
                let to = param_address(&params, "/0/to")?;
                let data = param_bytes(&params, "/0/data")?;
                let output = read_call(&state.ledger, to, &data)?;
                Ok(Value::String(hex::encode_prefixed(output)))
            }
            "eth_estimateGas" => {
                let (from, to, data) = tx_params(&params)?;
                let mut scratch = state.ledger.clone();
                execute(&mut scratch, from, to, &data)?;
                Ok(Value::String(format!("0x{DEFAULT_GAS_ESTIMATE:x}")))
            }
            "eth_sendTransaction" => {
                let (from, to, data) = tx_params(&params)?;
                if !state.accounts.contains(&from) {
                    return Err(ProviderError::rpc(
                        USER_REJECTED,
                        "The requested account has not been authorized by the user.",
                    ));
                }

                state.sent += 1;
                let tx_hash = {
                    let mut hasher = Sha256::new();
                    hasher.update(state.sent.to_be_bytes());
                    hasher.update(from.as_slice());
                    hasher.update(to.as_slice());
                    hasher.update(&data);
                    hex::encode_prefixed(hasher.finalize())
                };

                let status = match execute(&mut state.ledger, from, to, &data) {
                    Ok(()) => "0x1",
                    Err(err) => {
                        debug!(%err, "in-memory transaction reverted");
                        "0x0"
                    }
                };
                let block_number = format!("0x{:x}", state.sent);
                state.receipts.insert(
                    tx_hash.clone(),
                    json!({
                        "transactionHash": tx_hash,
                        "status": status,
                        "blockNumber": block_number,
                    }),
                );
                Ok(Value::String(tx_hash))
            }
            "eth_getTransactionReceipt" => {
                let tx_hash = param_str(&params, "/0")?;
                Ok(state.receipts.get(tx_hash).cloned().unwrap_or(Value::Null))
            }
            other => Err(ProviderError::rpc(
                METHOD_NOT_FOUND,
                format!("the method {other} does not exist/is not available"),
            )),
        }
    }
}

fn read_call(ledger: &Ledger, to: Address, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
    if ledger.factory == Some(to) {
        let call = ITokenFactory::getTokensByOwnerCall::abi_decode(data)
            .map_err(|_| reverted("unknown factory call"))?;
        let tokens = ledger.owners.get(&call.owner).cloned().unwrap_or_default();
        return Ok(encode_return(tokens));
    }

    let Some(token) = ledger.tokens.get(&to) else {
        // calls to an address without code return empty data
        return Ok(Vec::new());
    };

    let sel = selector(data);
    if sel == Some(IBurnableToken::nameCall::SELECTOR) {
        Ok(encode_return(token.name.clone()))
    } else if sel == Some(IBurnableToken::symbolCall::SELECTOR) {
        Ok(encode_return(token.symbol.clone()))
    } else if sel == Some(IBurnableToken::decimalsCall::SELECTOR) {
        Ok(encode_u8_return(token.decimals))
    } else if sel == Some(IBurnableToken::balanceOfCall::SELECTOR) {
        let call = IBurnableToken::balanceOfCall::abi_decode(data)
            .map_err(|_| reverted("malformed balanceOf"))?;
        Ok(encode_return(
            token.balances.get(&call.owner).copied().unwrap_or_default(),
        ))
    } else {
        Err(reverted("unknown token call"))
    }
}

fn execute(ledger: &mut Ledger, from: Address, to: Address, data: &[u8]) -> Result<(), ProviderError> {
    if ledger.factory == Some(to) {
        let call = ITokenFactory::createTokenCall::abi_decode(data)
            .map_err(|_| reverted("unknown factory transaction"))?;
        ledger.deployed += 1;
        let digest = Sha256::digest(format!("token:{}:{}", to, ledger.deployed).as_bytes());
        let token = Address::from_slice(&digest[12..]);
        ledger.tokens.insert(
            token,
            MockToken {
                name: call.name,
                symbol: call.symbol,
                decimals: tf_contracts::FACTORY_TOKEN_DECIMALS,
                balances: HashMap::from([(from, call.initialSupply)]),
            },
        );
        ledger.owners.entry(from).or_default().push(token);
        return Ok(());
    }

    let token = ledger
        .tokens
        .get_mut(&to)
        .ok_or_else(|| reverted("no contract at target address"))?;

    let sel = selector(data);
    if sel == Some(IBurnableToken::transferCall::SELECTOR) {
        let call = IBurnableToken::transferCall::abi_decode(data)
            .map_err(|_| reverted("malformed transfer"))?;
        let sender = token.balances.get(&from).copied().unwrap_or_default();
        let remaining = sender
            .checked_sub(call.amount)
            .ok_or_else(|| reverted("transfer amount exceeds balance"))?;
        token.balances.insert(from, remaining);
        let receiver = token.balances.entry(call.to).or_default();
        *receiver = receiver.saturating_add(call.amount);
        Ok(())
    } else if sel == Some(IBurnableToken::burnCall::SELECTOR) {
        let call = IBurnableToken::burnCall::abi_decode(data)
            .map_err(|_| reverted("malformed burn"))?;
        let holder = token.balances.get(&from).copied().unwrap_or_default();
        let remaining = holder
            .checked_sub(call.amount)
            .ok_or_else(|| reverted("burn amount exceeds balance"))?;
        token.balances.insert(from, remaining);
        Ok(())
    } else {
        Err(reverted("unknown token transaction"))
    }
}

fn tx_params(params: &Value) -> Result<(Address, Address, Vec<u8>), ProviderError> {
    Ok((
        param_address(params, "/0/from")?,
        param_address(params, "/0/to")?,
        param_bytes(params, "/0/data")?,
    ))
}

fn param_str<'a>(params: &'a Value, pointer: &str) -> Result<&'a str, ProviderError> {
    params
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params(&format!("missing {pointer}")))
}

fn param_address(params: &Value, pointer: &str) -> Result<Address, ProviderError> {
    let text = param_str(params, pointer)?;
    Address::from_str(text).map_err(|err| invalid_params(&format!("{pointer}: {err}")))
}

fn param_bytes(params: &Value, pointer: &str) -> Result<Vec<u8>, ProviderError> {
    let text = param_str(params, pointer)?;
    hex::decode(text).map_err(|err| invalid_params(&format!("{pointer}: {err}")))
}

fn invalid_params(message: &str) -> ProviderError {
    ProviderError::rpc(-32602, format!("invalid params: {message}"))
}

fn reverted(reason: &str) -> ProviderError {
    ProviderError::rpc(EXECUTION_REVERTED, format!("execution reverted: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TransactionRequest, WalletProviderExt};

    const ACCOUNT: Address = Address::new([0x0a; 20]);
    const FACTORY: Address = Address::new([0xfa; 20]);

    #[tokio::test]
    async fn switch_to_unknown_chain_reports_4902_until_added() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0x1");

        let err = wallet.switch_chain(&ChainId::new("0xaa36a7")).await.unwrap_err();
        assert!(err.is_unrecognized_chain());
        assert_eq!(wallet.active_chain().await, Some(ChainId::new("0x1")));

        let wallet = wallet.with_known_chain("0xaa36a7");
        wallet.switch_chain(&ChainId::new("0xaa36a7")).await.unwrap();
        assert_eq!(wallet.chain_id().await.unwrap(), ChainId::new("0xaa36a7"));
    }

    #[tokio::test]
    async fn factory_deploys_tokens_for_sender() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7").with_factory(FACTORY);
        let data = tf_contracts::create_token_calldata("Forge", "FRG", U256::from(1_000u64));
        let tx = TransactionRequest {
            from: ACCOUNT,
            to: FACTORY,
            data,
            gas: None,
        };

        assert_eq!(wallet.estimate_gas(&tx).await.unwrap(), U256::from(DEFAULT_GAS_ESTIMATE));
        let hash = wallet.send_transaction(&tx).await.unwrap();
        let receipt = wallet.transaction_receipt(&hash).await.unwrap().unwrap();
        assert!(receipt.succeeded());

        let tokens = wallet.tokens_of(ACCOUNT).await;
        assert_eq!(tokens.len(), 1);
        assert_eq!(wallet.balance_of(tokens[0], ACCOUNT).await, U256::from(1_000u64));
        assert_eq!(wallet.get_code(tokens[0]).await.unwrap(), hex::decode(CONTRACT_CODE).unwrap());
    }

    #[tokio::test]
    async fn overdrawn_transfer_fails_estimate_and_reverts_on_send() {
        let token = Address::repeat_byte(0x70);
        let wallet = InMemoryWallet::new(ACCOUNT, "0xaa36a7").with_token(
            token,
            "Forge",
            "FRG",
            18,
            ACCOUNT,
            U256::from(5u8),
        );
        let tx = TransactionRequest {
            from: ACCOUNT,
            to: token,
            data: tf_contracts::transfer_calldata(Address::repeat_byte(0x0b), U256::from(6u8)),
            gas: None,
        };

        let err = wallet.estimate_gas(&tx).await.unwrap_err();
        assert_eq!(err.code(), Some(EXECUTION_REVERTED));

        let hash = wallet.send_transaction(&tx).await.unwrap();
        let receipt = wallet.transaction_receipt(&hash).await.unwrap().unwrap();
        assert!(!receipt.succeeded());
        assert_eq!(wallet.balance_of(token, ACCOUNT).await, U256::from(5u8));
    }

    #[tokio::test]
    async fn scripted_rejection_is_returned_and_logged() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0x1").rejecting("eth_requestAccounts");
        let err = wallet.request_accounts().await.unwrap_err();
        assert!(err.is_user_rejected());
        assert_eq!(wallet.methods().await, vec!["eth_requestAccounts".to_owned()]);

        wallet.clear_failure("eth_requestAccounts").await;
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![ACCOUNT]);
    }
}
