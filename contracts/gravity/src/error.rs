use cosmwasm_std::StdError;
use cw_controllers::AdminError;
use cw_utils::PaymentError;
use hex::FromHexError;
use thiserror::Error;

use gravity_apis::ApiError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    StdError(#[from] StdError),
    #[error("{0}")]
    Payment(#[from] PaymentError),
    #[error("{0}")]
    HexError(#[from] FromHexError),
    #[error("{0}")]
    Admin(#[from] AdminError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    // Integrity faults. These abort the end block pass and with it the block
    #[error("Vote from unknown validator {0}")]
    UnknownValidator(String),
    #[error("Confirmation from orchestrator {0} that maps to no validator")]
    UnknownOrchestrator(String),
    #[error("Invalid validator address {address}: {reason}")]
    InvalidValidatorAddress { address: String, reason: String },
    #[error("Attempted to observe event {nonce} while the last observed event is {last}")]
    OutOfOrderObservation { nonce: u64, last: u64 },

    // Claim / confirmation submission
    #[error("Sender {0} is not a registered orchestrator")]
    NotOrchestrator(String),
    #[error("Validator {0} not found")]
    ValidatorNotFound(String),
    #[error("Validator {0} is not bonded")]
    ValidatorNotBonded(String),
    #[error("Validator {0} has no Ethereum address set")]
    EthAddressNotSet(String),
    #[error("Non contiguous event nonce, expected {expected} got {got}")]
    NonContiguousEventNonce { expected: u64, got: u64 },
    #[error("Validator {validator} already voted on event {nonce}")]
    DuplicateVote { validator: String, nonce: u64 },
    #[error("Orchestrator {0} is already registered")]
    OrchestratorAlreadyRegistered(String),
    #[error("Validator {0} already has delegate keys set")]
    ValidatorAlreadyRegistered(String),
    #[error("Ethereum address {0} is already in use")]
    EthAddressInUse(String),
    #[error("Signer {got} does not match the registered Ethereum address {expected}")]
    EthSignerMismatch { expected: String, got: String },
    #[error("Valset {0} not found")]
    ValsetNotFound(u64),
    #[error("Batch {nonce} for token {token_contract} not found")]
    BatchNotFound { token_contract: String, nonce: u64 },
    #[error("Logic call {invalidation_id}/{invalidation_nonce} not found")]
    LogicCallNotFound {
        invalidation_id: String,
        invalidation_nonce: u64,
    },
    #[error("Batch {nonce} for token {token_contract} already exists")]
    BatchAlreadyExists { token_contract: String, nonce: u64 },
    #[error("Logic call {invalidation_id}/{invalidation_nonce} already exists")]
    LogicCallAlreadyExists {
        invalidation_id: String,
        invalidation_nonce: u64,
    },
    #[error("Duplicate confirmation from {0}")]
    DuplicateConfirmation(String),
}

impl ContractError {
    /// Integrity faults signal corrupted state rather than bad input
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            ContractError::UnknownValidator(_)
                | ContractError::UnknownOrchestrator(_)
                | ContractError::InvalidValidatorAddress { .. }
                | ContractError::OutOfOrderObservation { .. }
        )
    }
}
