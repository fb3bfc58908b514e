use std::collections::HashSet;

use crate::error::ApiError;
use crate::gravity_api::{
    BridgeValidator, Claim, Erc20Token, OutgoingLogicCall, OutgoingTxBatch, INVALIDATION_ID_SIZE,
};

const ETH_ADDRESS_LEN: usize = 20;

/// A trait for validating the API structs / input.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// `validate_eth_address` checks for a 0x-prefixed, 20 byte hex encoded address
pub fn validate_eth_address(addr: &str) -> Result<(), ApiError> {
    let stripped = addr
        .strip_prefix("0x")
        .ok_or_else(|| ApiError::InvalidEthAddress(addr.to_string()))?;
    let bytes = hex::decode(stripped)?;
    if bytes.len() != ETH_ADDRESS_LEN {
        return Err(ApiError::InvalidEthAddress(addr.to_string()));
    }
    Ok(())
}

pub fn validate_invalidation_id(id: &str) -> Result<(), ApiError> {
    let bytes = hex::decode(id)?;
    if bytes.len() != INVALIDATION_ID_SIZE {
        return Err(ApiError::InvalidInvalidationId(INVALIDATION_ID_SIZE));
    }
    Ok(())
}

impl Validate for BridgeValidator {
    fn validate(&self) -> Result<(), ApiError> {
        validate_eth_address(&self.ethereum_address)
    }
}

impl Validate for Erc20Token {
    fn validate(&self) -> Result<(), ApiError> {
        validate_eth_address(&self.contract)
    }
}

impl Validate for Claim {
    fn validate(&self) -> Result<(), ApiError> {
        if self.event_nonce() == 0 {
            return Err(ApiError::ZeroEventNonce);
        }
        match self {
            Claim::SendToCosmos {
                token_contract,
                ethereum_sender,
                ..
            } => {
                validate_eth_address(token_contract)?;
                // The receiver is checked when the claim is applied, since a bad
                // receiver must not block the event nonce from advancing
                validate_eth_address(ethereum_sender)
            }
            Claim::BatchSendToEth { token_contract, .. } => validate_eth_address(token_contract),
            Claim::Erc20Deployed {
                cosmos_denom,
                token_contract,
                ..
            } => {
                if cosmos_denom.is_empty() {
                    return Err(ApiError::EmptyDenom);
                }
                validate_eth_address(token_contract)
            }
            Claim::LogicCallExecuted {
                invalidation_id, ..
            } => validate_invalidation_id(invalidation_id),
            Claim::ValsetUpdated {
                members,
                reward_token,
                ..
            } => {
                let mut seen = HashSet::new();
                for member in members {
                    member.validate()?;
                    if !seen.insert(member.ethereum_address.to_lowercase()) {
                        return Err(ApiError::DuplicateMember(member.ethereum_address.clone()));
                    }
                }
                reward_token
                    .as_deref()
                    .map(validate_eth_address)
                    .transpose()?;
                Ok(())
            }
        }
    }
}

impl Validate for OutgoingTxBatch {
    fn validate(&self) -> Result<(), ApiError> {
        validate_eth_address(&self.token_contract)?;
        if self.transactions.is_empty() {
            return Err(ApiError::EmptyBatch(self.batch_nonce));
        }
        for tx in &self.transactions {
            validate_eth_address(&tx.dest_address)?;
            for token in [&tx.erc20_token, &tx.erc20_fee] {
                if token.contract != self.token_contract {
                    return Err(ApiError::BatchTokenMismatch {
                        id: tx.id,
                        token: token.contract.clone(),
                        batch_token: self.token_contract.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Validate for OutgoingLogicCall {
    fn validate(&self) -> Result<(), ApiError> {
        validate_eth_address(&self.logic_contract_address)?;
        validate_invalidation_id(&self.invalidation_id)?;
        for token in self.transfers.iter().chain(self.fees.iter()) {
            token.validate()?;
        }
        Ok(())
    }
}
