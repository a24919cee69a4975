//! Form input as typed by the user, validated before any wallet request.

use alloy_primitives::Address;
use std::str::FromStr;
use tf_api_types::{BurnRequest, CreateTokenRequest, TransferRequest};

use crate::error::DashboardError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTokenForm {
    pub name: String,
    pub symbol: String,
    pub initial_supply: String,
}

impl CreateTokenForm {
    pub fn validate(&self) -> Result<(), DashboardError> {
        if is_blank(&self.name) || is_blank(&self.symbol) || is_blank(&self.initial_supply) {
            return Err(DashboardError::Validation("please fill all fields"));
        }
        Ok(())
    }
}

impl From<CreateTokenRequest> for CreateTokenForm {
    fn from(request: CreateTokenRequest) -> Self {
        Self {
            name: request.name,
            symbol: request.symbol,
            initial_supply: request.initial_supply,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub recipient: String,
    pub amount: String,
}

impl TransferForm {
    /// Returns the parsed recipient.
    pub fn validate(&self) -> Result<Address, DashboardError> {
        if is_blank(&self.recipient) || is_blank(&self.amount) {
            return Err(DashboardError::Validation("please fill in all fields"));
        }
        parse_recipient(self.recipient.trim())
    }
}

impl From<TransferRequest> for TransferForm {
    fn from(request: TransferRequest) -> Self {
        Self {
            recipient: request.recipient,
            amount: request.amount,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BurnForm {
    pub amount: String,
}

impl BurnForm {
    pub fn validate(&self) -> Result<(), DashboardError> {
        if is_blank(&self.amount) {
            return Err(DashboardError::Validation("please enter amount to burn"));
        }
        Ok(())
    }
}

impl From<BurnRequest> for BurnForm {
    fn from(request: BurnRequest) -> Self {
        Self {
            amount: request.amount,
        }
    }
}

/// Single-case hex is taken as-is; mixed case must carry a valid ERC-55
/// checksum.
fn parse_recipient(text: &str) -> Result<Address, DashboardError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    let parsed = if has_lower && has_upper {
        Address::parse_checksummed(text, None).ok()
    } else {
        Address::from_str(text).ok()
    };
    parsed.ok_or(DashboardError::InvalidRecipient)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_counts_as_empty() {
        let form = CreateTokenForm {
            name: "Forge".to_owned(),
            symbol: "   ".to_owned(),
            initial_supply: "1000".to_owned(),
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "please fill all fields");
    }

    #[test]
    fn transfer_recipient_must_be_an_address() {
        let form = TransferForm {
            recipient: "not-an-address".to_owned(),
            amount: "1".to_owned(),
        };
        assert!(matches!(form.validate(), Err(DashboardError::InvalidRecipient)));

        let form = TransferForm {
            recipient: " 0x1111111111111111111111111111111111111111 ".to_owned(),
            amount: "1".to_owned(),
        };
        assert_eq!(form.validate().unwrap(), Address::repeat_byte(0x11));

        let empty = TransferForm::default();
        assert_eq!(empty.validate().unwrap_err().to_string(), "please fill in all fields");
    }

    #[test]
    fn mixed_case_recipient_needs_a_valid_checksum() {
        let form = |recipient: &str| TransferForm {
            recipient: recipient.to_owned(),
            amount: "1".to_owned(),
        };

        let mistyped = form("0xe32Af55ef214292298F5A6C8399953A265493D83");
        assert!(matches!(mistyped.validate(), Err(DashboardError::InvalidRecipient)));

        let checksummed = form("0xE32Af55ef214292298F5A6C8399953A265493D83");
        let lower = form("0xe32af55ef214292298f5a6c8399953a265493d83");
        let upper = form("0xE32AF55EF214292298F5A6C8399953A265493D83");
        let expected = checksummed.validate().unwrap();
        assert_eq!(lower.validate().unwrap(), expected);
        assert_eq!(upper.validate().unwrap(), expected);
    }

    #[test]
    fn burn_needs_an_amount() {
        assert_eq!(
            BurnForm::default().validate().unwrap_err().to_string(),
            "please enter amount to burn"
        );
        assert!(BurnForm { amount: "0.5".to_owned() }.validate().is_ok());
    }
}
