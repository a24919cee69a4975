use alloy_primitives::{Address, U256};
use tf_units::{UnitsError, format_units, round_display};

/// Fractional places shown on the balance line.
pub const BALANCE_DISPLAY_PLACES: usize = 4;

/// `0x1234...abcd`: the first six and last four characters of the checksummed
/// address.
pub fn short_address(address: &Address) -> String {
    let text = address.to_string();
    format!("{}...{}", &text[..6], &text[text.len() - 4..])
}

pub fn explorer_address_url(base: &str, address: &Address) -> String {
    format!("{}/address/{address}", base.trim_end_matches('/'))
}

/// Exact balance text and its four-place display form.
pub fn display_balance(balance: U256, decimals: u8) -> Result<(String, String), UnitsError> {
    let exact = format_units(balance, decimals)?;
    let rounded = round_display(&exact, BALANCE_DISPLAY_PLACES)?;
    Ok((exact, rounded))
}
