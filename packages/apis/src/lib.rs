pub mod error;
pub mod gravity_api;
mod validate;

use bech32::{FromBase32, Variant};
use cosmwasm_std::CanonicalAddr;

/// new_canonical_addr converts a bech32 address to a canonical address
/// ported from cosmwasm-std/testing/mock.rs
pub fn new_canonical_addr(addr: &str, prefix: &str) -> Result<CanonicalAddr, ApiError> {
    let (decoded_prefix, decoded_data, variant) =
        bech32::decode(addr).map_err(|e| ApiError::InvalidAddressString(e.to_string()))?;
    // check bech32 prefix
    if decoded_prefix != prefix {
        return Err(ApiError::InvalidAddressString(
            "wrong bech32 prefix".to_string(),
        ));
    }
    // check bech32 variant
    if variant == Variant::Bech32m {
        return Err(ApiError::InvalidAddressString(
            "wrong bech32 variant".to_string(),
        ));
    }
    // check bech32 data
    let bytes = Vec::<u8>::from_base32(&decoded_data)
        .map_err(|_| ApiError::InvalidAddressString("invalid bech32 data".to_string()))?;
    if bytes.is_empty() || bytes.len() > 255 {
        return Err(ApiError::InvalidAddressString(
            "Invalid canonical address length".to_string(),
        ));
    }
    Ok(bytes.into())
}

pub use error::ApiError;
pub use validate::{validate_eth_address, validate_invalidation_id, Validate};
