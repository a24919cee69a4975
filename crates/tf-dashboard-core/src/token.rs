use alloy_primitives::{Address, U256};
use tf_contracts::{
    balance_of_calldata, burn_calldata, decimals_calldata, decode_string, decode_u8, decode_u256,
    name_calldata, symbol_calldata, transfer_calldata,
};
use tf_units::parse_units;
use tf_wallet_provider::{TransactionRequest, WalletProvider, WalletProviderExt};
use tracing::info;

use crate::display::display_balance;
use crate::error::DashboardError;
use crate::forms::{BurnForm, TransferForm};
use crate::session::Session;
use crate::tx::send_and_confirm;

/// On-chain token metadata and the session account's balance, read fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDetails {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub balance: U256,
    pub balance_text: String,
    /// The balance rounded to four places.
    pub balance_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenActionOutcome {
    pub tx_hash: String,
    pub balance: U256,
    pub balance_text: String,
    pub balance_display: String,
    pub message: String,
}

pub async fn token_details<W>(
    wallet: &W,
    session: &Session,
    token: Address,
) -> Result<TokenDetails, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    let name = decode_string("name", &wallet.call(token, name_calldata()).await?)?;
    let symbol = symbol_of(wallet, token).await?;
    let decimals = decimals_of(wallet, token).await?;
    let balance = balance_of(wallet, token, session.account()).await?;
    let (balance_text, balance_display) = display_balance(balance, decimals)?;

    Ok(TokenDetails {
        address: token,
        name,
        symbol,
        decimals,
        balance,
        balance_text,
        balance_display,
    })
}

pub async fn transfer<W>(
    wallet: &W,
    session: &Session,
    token: Address,
    form: &TransferForm,
) -> Result<TokenActionOutcome, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    let recipient = form.validate()?;
    let amount_text = form.amount.trim();
    let decimals = decimals_of(wallet, token).await?;
    let symbol = symbol_of(wallet, token).await?;
    let amount = parse_units(amount_text, decimals)?;

    let tx = TransactionRequest {
        from: session.account(),
        to: token,
        data: transfer_calldata(recipient, amount),
        gas: None,
    };
    info!(%token, %recipient, %amount, "transferring tokens");
    let tx_hash = send_and_confirm(wallet, &tx, session.config().receipts).await?;

    let message = format!("successfully transferred {amount_text} {symbol} to {recipient}");
    settle(wallet, session, token, decimals, tx_hash, message).await
}

pub async fn burn<W>(
    wallet: &W,
    session: &Session,
    token: Address,
    form: &BurnForm,
) -> Result<TokenActionOutcome, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    form.validate()?;
    let amount_text = form.amount.trim();
    let decimals = decimals_of(wallet, token).await?;
    let symbol = symbol_of(wallet, token).await?;
    let amount = parse_units(amount_text, decimals)?;

    let tx = TransactionRequest {
        from: session.account(),
        to: token,
        data: burn_calldata(amount),
        gas: None,
    };
    info!(%token, %amount, "burning tokens");
    let tx_hash = send_and_confirm(wallet, &tx, session.config().receipts).await?;

    let message = format!("successfully burned {amount_text} {symbol}");
    settle(wallet, session, token, decimals, tx_hash, message).await
}

/// Re-reads the account balance after a mined transaction.
async fn settle<W>(
    wallet: &W,
    session: &Session,
    token: Address,
    decimals: u8,
    tx_hash: String,
    message: String,
) -> Result<TokenActionOutcome, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    let balance = balance_of(wallet, token, session.account()).await?;
    let (balance_text, balance_display) = display_balance(balance, decimals)?;
    Ok(TokenActionOutcome {
        tx_hash,
        balance,
        balance_text,
        balance_display,
        message,
    })
}

async fn symbol_of<W>(wallet: &W, token: Address) -> Result<String, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    Ok(decode_string("symbol", &wallet.call(token, symbol_calldata()).await?)?)
}

async fn decimals_of<W>(wallet: &W, token: Address) -> Result<u8, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    Ok(decode_u8("decimals", &wallet.call(token, decimals_calldata()).await?)?)
}

async fn balance_of<W>(wallet: &W, token: Address, owner: Address) -> Result<U256, DashboardError>
where
    W: WalletProvider + ?Sized,
{
    Ok(decode_u256(
        "balanceOf",
        &wallet.call(token, balance_of_calldata(owner)).await?,
    )?)
}
