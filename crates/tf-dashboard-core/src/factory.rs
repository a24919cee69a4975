use alloy_primitives::Address;
use tf_contracts::{FACTORY_TOKEN_DECIMALS, create_token_calldata, decode_address_list, tokens_by_owner_calldata};
use tf_units::parse_units;
use tf_wallet_provider::{TransactionRequest, WalletProvider, WalletProviderExt};
use tracing::{debug, info};

use crate::error::DashboardError;
use crate::forms::CreateTokenForm;
use crate::session::Session;
use crate::tx::{send_and_confirm, with_gas_buffer};

pub const TOKEN_CREATED_MESSAGE: &str = "token created successfully";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedToken {
    pub tx_hash: String,
    /// The owner's token list, re-read after the deployment was mined.
    pub tokens: Vec<Address>,
    pub message: &'static str,
}

/// Deploys a token through the factory with the session account as owner.
pub async fn create_token<W>(
    wallet: &W,
    session: &Session,
    form: &CreateTokenForm,
) -> Result<CreatedToken, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    form.validate()?;
    let config = session.config();
    let name = form.name.trim();
    let symbol = form.symbol.trim();
    let supply = parse_units(&form.initial_supply, FACTORY_TOKEN_DECIMALS)?;

    let mut tx = TransactionRequest {
        from: session.account(),
        to: config.factory,
        data: create_token_calldata(name, symbol, supply),
        gas: None,
    };
    let estimate = wallet.estimate_gas(&tx).await?;
    let gas = with_gas_buffer(estimate, config.gas_buffer_percent);
    debug!(%estimate, %gas, "createToken gas");
    tx.gas = Some(gas);

    info!(name, symbol, %supply, factory = %config.factory, "creating token");
    let tx_hash = send_and_confirm(wallet, &tx, config.receipts).await?;
    let tokens = list_tokens(wallet, session).await?;

    Ok(CreatedToken {
        tx_hash,
        tokens,
        message: TOKEN_CREATED_MESSAGE,
    })
}

pub async fn list_tokens<W>(wallet: &W, session: &Session) -> Result<Vec<Address>, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    let factory = session.config().factory;
    let output = wallet
        .call(factory, tokens_by_owner_calldata(session.account()))
        .await?;
    let tokens = decode_address_list("getTokensByOwner", &output)?;
    debug!(owner = %session.account(), count = tokens.len(), "fetched owned tokens");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use tf_contracts::ITokenFactory;
    use alloy_sol_types::SolCall;
    use tf_wallet_provider::{InMemoryWallet, ProviderError};

    use crate::connect;
    use crate::testing::{ACCOUNT, FACTORY, TOKEN, config, session, user, wallet_with_token};

    fn form(name: &str, symbol: &str, supply: &str) -> CreateTokenForm {
        CreateTokenForm {
            name: name.to_owned(),
            symbol: symbol.to_owned(),
            initial_supply: supply.to_owned(),
        }
    }

    #[tokio::test]
    async fn empty_field_makes_no_wallet_request() {
        let wallet = wallet_with_token(U256::ZERO);
        let session = session(&wallet).await;
        let before = wallet.requests().await.len();

        let err = create_token(&wallet, &session, &form("Forge", "FRG", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        assert_eq!(wallet.requests().await.len(), before);
    }

    #[tokio::test]
    async fn deploys_with_scaled_supply_and_gas_buffer() {
        let wallet = wallet_with_token(U256::ZERO);
        let session = session(&wallet).await;

        let created = create_token(&wallet, &session, &form(" Forge ", "FRG", "1000.5"))
            .await
            .unwrap();
        assert_eq!(created.message, TOKEN_CREATED_MESSAGE);
        assert_eq!(created.tokens.len(), 2);
        assert_eq!(created.tokens[0], TOKEN);

        let requests = wallet.requests().await;
        let send = requests
            .iter()
            .find(|r| r.method == "eth_sendTransaction")
            .unwrap();
        assert_eq!(send.params[0]["gas"], "0x3a980");

        let data = alloy_primitives::hex::decode(send.params[0]["data"].as_str().unwrap()).unwrap();
        let call = ITokenFactory::createTokenCall::abi_decode(&data).unwrap();
        assert_eq!(call.name, "Forge");
        assert_eq!(
            call.initialSupply,
            U256::from(1_000_500_000_000_000_000_000u128)
        );

        let new_token = created.tokens[1];
        assert_eq!(
            wallet.balance_of(new_token, ACCOUNT).await,
            call.initialSupply
        );
    }

    #[tokio::test]
    async fn switch_precedes_any_create_token_call() {
        let wallet = InMemoryWallet::new(ACCOUNT, "0x1")
            .with_known_chain("0xaa36a7")
            .with_factory(FACTORY);
        let session = connect(Some(&wallet), &config(), Some(&user())).await.unwrap();
        create_token(&wallet, &session, &form("Forge", "FRG", "1"))
            .await
            .unwrap();

        let requests = wallet.requests().await;
        let switches: Vec<usize> = requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.method == "wallet_switchEthereumChain")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(switches.len(), 1);
        assert_eq!(requests[switches[0]].params[0]["chainId"], "0xaa36a7");

        let first_send = requests
            .iter()
            .position(|r| r.method == "eth_sendTransaction")
            .unwrap();
        assert!(switches[0] < first_send);
    }

    #[tokio::test]
    async fn rejected_signature_is_reported_and_nothing_deployed() {
        let wallet = wallet_with_token(U256::ZERO).rejecting("eth_sendTransaction");
        let session = session(&wallet).await;
        let err = create_token(&wallet, &session, &form("Forge", "FRG", "10"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "request rejected in wallet");
        assert_eq!(wallet.tokens_of(ACCOUNT).await, vec![TOKEN]);
    }

    #[tokio::test]
    async fn unparseable_supply_is_rejected_before_estimate() {
        let wallet = wallet_with_token(U256::ZERO);
        let session = session(&wallet).await;
        let err = create_token(&wallet, &session, &form("Forge", "FRG", "1e18"))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidAmount(_)));
        assert!(!wallet.methods().await.contains(&"eth_estimateGas".to_owned()));
    }

    #[tokio::test]
    async fn list_surfaces_call_failures() {
        let wallet = wallet_with_token(U256::ZERO);
        let ok_session = session(&wallet).await;
        assert_eq!(list_tokens(&wallet, &ok_session).await.unwrap(), vec![TOKEN]);

        let failing = wallet_with_token(U256::ZERO)
            .with_failure("eth_call", ProviderError::Transport("offline".to_owned()));
        let failing_session = session(&failing).await;
        let err = list_tokens(&failing, &failing_session).await.unwrap_err();
        assert!(matches!(err, DashboardError::Wallet(_)));
    }
}
