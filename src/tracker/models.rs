use crate::error::RegistryError;

/// Telegram chat identifier
pub type ChatId = i64;

/// Length of a base58-encoded Solana public key as accepted by the bot
pub const ADDRESS_LEN: usize = 44;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    pub address: String,
    pub name: String,
    pub selected: bool,
}

impl Wallet {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            selected: false,
        }
    }
}

/// 44 ASCII characters; no base58 or checksum validation. The address ends up
/// in button payloads, which Telegram caps at 64 bytes.
pub fn validate_address(address: &str) -> Result<(), RegistryError> {
    if address.len() == ADDRESS_LEN && address.is_ascii() {
        Ok(())
    } else {
        Err(RegistryError::InvalidAddress(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address_length() {
        assert!(validate_address(&"A".repeat(44)).is_ok());
        assert_eq!(
            validate_address(&"A".repeat(43)),
            Err(RegistryError::InvalidAddress("A".repeat(43)))
        );
        assert!(validate_address(&"A".repeat(45)).is_err());
        assert!(validate_address("").is_err());
    }

    #[test]
    fn test_validate_address_rejects_non_ascii() {
        let accented = "é".repeat(44);
        assert_eq!(accented.chars().count(), ADDRESS_LEN);
        assert_eq!(
            validate_address(&accented),
            Err(RegistryError::InvalidAddress(accented.clone()))
        );
        assert!(validate_address(&format!("{}é", "A".repeat(42))).is_err());
    }

    #[test]
    fn test_new_wallet_is_unselected() {
        let wallet = Wallet::new("addr", "main");
        assert!(!wallet.selected);
        assert_eq!(wallet.name, "main");
    }
}
