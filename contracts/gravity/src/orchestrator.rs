use cosmwasm_std::{Addr, Event, Storage};

use gravity_apis::gravity_api::{BatchConfirm, LogicCallConfirm, ValsetConfirm};
use gravity_apis::{validate_eth_address, validate_invalidation_id, ApiError};

use crate::error::ContractError;
use crate::keeper::StakingKeeper;
use crate::state::orchestrator::{
    ETH_ADDRESS_VALIDATOR, ORCHESTRATOR_VALIDATOR, VALIDATOR_ETH_ADDRESS,
};
use crate::state::outgoing::{BATCHES, BATCH_CONFIRMS, LOGIC_CALLS, LOGIC_CALL_CONFIRMS};
use crate::state::valset::{VALSETS, VALSET_CONFIRMS};

/// Registers the delegate keys of `validator`: the orchestrator account submitting claims
/// and confirmations on its behalf, and the Ethereum address it signs with.
/// Keys are set once, `is_admin` lets the admin act for any validator
pub(crate) fn set_orchestrator_address(
    storage: &mut dyn Storage,
    staking: &dyn StakingKeeper,
    sender: &Addr,
    is_admin: bool,
    validator: &str,
    orchestrator: &Addr,
    eth_address: &str,
) -> Result<Event, ContractError> {
    let info = staking
        .validator(validator)?
        .ok_or_else(|| ContractError::ValidatorNotFound(validator.to_string()))?;
    if !is_admin && sender.as_str() != info.account {
        return Err(ContractError::Unauthorized);
    }
    validate_eth_address(eth_address)?;

    if VALIDATOR_ETH_ADDRESS.has(storage, validator) {
        return Err(ContractError::ValidatorAlreadyRegistered(
            validator.to_string(),
        ));
    }
    if ORCHESTRATOR_VALIDATOR.has(storage, orchestrator.as_str()) {
        return Err(ContractError::OrchestratorAlreadyRegistered(
            orchestrator.to_string(),
        ));
    }
    let eth_key = eth_address.to_lowercase();
    if ETH_ADDRESS_VALIDATOR.has(storage, &eth_key) {
        return Err(ContractError::EthAddressInUse(eth_address.to_string()));
    }

    ORCHESTRATOR_VALIDATOR.save(storage, orchestrator.as_str(), &validator.to_string())?;
    VALIDATOR_ETH_ADDRESS.save(storage, validator, &eth_address.to_string())?;
    ETH_ADDRESS_VALIDATOR.save(storage, &eth_key, &validator.to_string())?;

    Ok(Event::new("set_orchestrator_address")
        .add_attribute("validator", validator)
        .add_attribute("orchestrator", orchestrator)
        .add_attribute("eth_address", eth_address))
}

/// Checks that `sender` is a registered orchestrator signing with its validator's Ethereum
/// address. Signatures themselves are verified before they reach the contract
fn check_signer(
    storage: &dyn Storage,
    sender: &Addr,
    eth_signer: &str,
    signature: &str,
) -> Result<String, ContractError> {
    if signature.is_empty() {
        return Err(ApiError::EmptySignature.into());
    }
    let operator = ORCHESTRATOR_VALIDATOR
        .may_load(storage, sender.as_str())?
        .ok_or_else(|| ContractError::NotOrchestrator(sender.to_string()))?;
    let registered = VALIDATOR_ETH_ADDRESS
        .may_load(storage, &operator)?
        .ok_or_else(|| ContractError::EthAddressNotSet(operator.clone()))?;
    if !registered.eq_ignore_ascii_case(eth_signer) {
        return Err(ContractError::EthSignerMismatch {
            expected: registered,
            got: eth_signer.to_string(),
        });
    }
    Ok(operator)
}

pub(crate) fn confirm_valset(
    storage: &mut dyn Storage,
    sender: &Addr,
    nonce: u64,
    eth_address: String,
    signature: String,
) -> Result<Event, ContractError> {
    let operator = check_signer(storage, sender, &eth_address, &signature)?;
    if !VALSETS.has(storage, nonce) {
        return Err(ContractError::ValsetNotFound(nonce));
    }
    let key = (nonce, sender.as_str());
    if VALSET_CONFIRMS.has(storage, key) {
        return Err(ContractError::DuplicateConfirmation(sender.to_string()));
    }
    VALSET_CONFIRMS.save(
        storage,
        key,
        &ValsetConfirm {
            nonce,
            orchestrator: sender.to_string(),
            eth_address,
            signature,
        },
    )?;
    Ok(Event::new("valset_confirm")
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("validator", operator))
}

pub(crate) fn confirm_batch(
    storage: &mut dyn Storage,
    sender: &Addr,
    token_contract: String,
    nonce: u64,
    eth_signer: String,
    signature: String,
) -> Result<Event, ContractError> {
    let operator = check_signer(storage, sender, &eth_signer, &signature)?;
    if !BATCHES.has(storage, (token_contract.as_str(), nonce)) {
        return Err(ContractError::BatchNotFound {
            token_contract,
            nonce,
        });
    }
    let key = (token_contract.as_str(), nonce, sender.as_str());
    if BATCH_CONFIRMS.has(storage, key) {
        return Err(ContractError::DuplicateConfirmation(sender.to_string()));
    }
    BATCH_CONFIRMS.save(
        storage,
        key,
        &BatchConfirm {
            token_contract: token_contract.clone(),
            nonce,
            orchestrator: sender.to_string(),
            eth_signer,
            signature,
        },
    )?;
    Ok(Event::new("batch_confirm")
        .add_attribute("token_contract", token_contract)
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("validator", operator))
}

pub(crate) fn confirm_logic_call(
    storage: &mut dyn Storage,
    sender: &Addr,
    invalidation_id: String,
    invalidation_nonce: u64,
    eth_signer: String,
    signature: String,
) -> Result<Event, ContractError> {
    validate_invalidation_id(&invalidation_id)?;
    let operator = check_signer(storage, sender, &eth_signer, &signature)?;
    if !LOGIC_CALLS.has(storage, (invalidation_id.as_str(), invalidation_nonce)) {
        return Err(ContractError::LogicCallNotFound {
            invalidation_id,
            invalidation_nonce,
        });
    }
    let key = (invalidation_id.as_str(), invalidation_nonce, sender.as_str());
    if LOGIC_CALL_CONFIRMS.has(storage, key) {
        return Err(ContractError::DuplicateConfirmation(sender.to_string()));
    }
    LOGIC_CALL_CONFIRMS.save(
        storage,
        key,
        &LogicCallConfirm {
            invalidation_id: invalidation_id.clone(),
            invalidation_nonce,
            orchestrator: sender.to_string(),
            eth_signer,
            signature,
        },
    )?;
    Ok(Event::new("logic_call_confirm")
        .add_attribute("invalidation_id", invalidation_id)
        .add_attribute("invalidation_nonce", invalidation_nonce.to_string())
        .add_attribute("validator", operator))
}
