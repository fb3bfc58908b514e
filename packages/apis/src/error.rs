use hex::FromHexError;
use thiserror::Error;

use cosmwasm_std::StdError;

#[derive(Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Std(#[from] StdError),
    #[error("{0}")]
    HexError(#[from] FromHexError),
    #[error("Invalid Ethereum address: {0}")]
    InvalidEthAddress(String),
    #[error("Invalid address string: {0}")]
    InvalidAddressString(String),
    #[error("Event nonce must be greater than zero")]
    ZeroEventNonce,
    #[error("Empty cosmos denom")]
    EmptyDenom,
    #[error("Empty signature")]
    EmptySignature,
    #[error("Invalidation id is not {0} bytes long")]
    InvalidInvalidationId(usize),
    #[error("Outgoing batch {0} has no transactions")]
    EmptyBatch(u64),
    #[error("Transaction {id} token {token} does not match batch token {batch_token}")]
    BatchTokenMismatch {
        id: u64,
        token: String,
        batch_token: String,
    },
    #[error("Duplicate Ethereum address in validator set: {0}")]
    DuplicateMember(String),
}
