use thiserror::Error;

/// Length in bytes of a payment or stake credential.
pub const CREDENTIAL_LEN: usize = 28;

/// Human readable prefix shared by mainnet (`addr`) and testnet (`addr_test`) addresses.
const SHELLEY_PREFIX: &str = "addr";

/// Errors returned when decoding a Shelley address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The address is not valid bech32.
    #[error("invalid bech32 address {address}: {reason}")]
    Bech32 {
        /// The offending address.
        address: String,
        /// Decoder message.
        reason: String,
    },
    /// The human readable part is not an `addr` prefix.
    #[error("unexpected address prefix: {0}")]
    UnexpectedPrefix(String),
    /// The payload is too short to carry a payment credential.
    #[error("address payload too short: {0} bytes")]
    TooShort(usize),
}

/// A decoded Shelley-era address.
///
/// Byte 0 is the header (address type and network). Bytes `1..29` hold the payment
/// credential and, for base addresses, bytes `29..57` hold the stake credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShelleyAddress {
    bytes: Vec<u8>,
}

impl ShelleyAddress {
    /// Returns `true` if the bech32 text carries a Shelley address prefix.
    pub fn is_shelley(address: &str) -> bool {
        address.starts_with(SHELLEY_PREFIX)
    }

    /// Decodes a bech32 Shelley address.
    pub fn from_bech32(address: &str) -> Result<Self, AddressError> {
        let (hrp, bytes) = bech32::decode(address).map_err(|err| AddressError::Bech32 {
            address: address.to_string(),
            reason: err.to_string(),
        })?;

        if !hrp.as_str().starts_with(SHELLEY_PREFIX) {
            return Err(AddressError::UnexpectedPrefix(hrp.to_string()));
        }
        if bytes.len() < 1 + CREDENTIAL_LEN {
            return Err(AddressError::TooShort(bytes.len()));
        }

        Ok(Self { bytes })
    }

    /// Raw address bytes, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the address, returning its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The payment credential (key hash or script hash).
    pub fn payment_credential(&self) -> &[u8] {
        &self.bytes[1..1 + CREDENTIAL_LEN]
    }

    /// The stake credential, present on base addresses only.
    pub fn stake_credential(&self) -> Option<&[u8]> {
        self.bytes.get(1 + CREDENTIAL_LEN..1 + 2 * CREDENTIAL_LEN)
    }
}
