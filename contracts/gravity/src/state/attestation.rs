use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdResult, Storage};
use cw_storage_plus::{Item, Map};

use gravity_apis::gravity_api::Attestation;

/// Attestations by (event nonce, claim hash). Conflicting claims at one nonce
/// live side by side under different hashes
pub const ATTESTATIONS: Map<(u64, &[u8]), Attestation> = Map::new("attestations");
/// Nonce of the last Ethereum event applied to state
pub const LAST_OBSERVED_EVENT_NONCE: Item<u64> = Item::new("last_observed_event_nonce");
pub const LAST_OBSERVED_ETH_HEIGHT: Item<LastObservedEthHeight> =
    Item::new("last_observed_eth_height");
/// Highest event nonce each validator (by operator address) has submitted a claim for
pub const LAST_EVENT_NONCE_BY_VALIDATOR: Map<&str, u64> = Map::new("last_event_nonce_by_val");

/// Ethereum block height of the last observed deposit or withdrawal
#[cw_serde]
#[derive(Default)]
pub struct LastObservedEthHeight {
    pub cosmos_block_height: u64,
    pub ethereum_block_height: u64,
}

pub fn last_observed_event_nonce(storage: &dyn Storage) -> StdResult<u64> {
    Ok(LAST_OBSERVED_EVENT_NONCE
        .may_load(storage)?
        .unwrap_or_default())
}

pub fn last_observed_eth_height(storage: &dyn Storage) -> StdResult<u64> {
    Ok(LAST_OBSERVED_ETH_HEIGHT
        .may_load(storage)?
        .unwrap_or_default()
        .ethereum_block_height)
}

/// A validator submitting its first claim starts right behind the last observed event,
/// instead of replaying the whole history
pub fn last_event_nonce_by_validator(storage: &dyn Storage, operator: &str) -> StdResult<u64> {
    match LAST_EVENT_NONCE_BY_VALIDATOR.may_load(storage, operator)? {
        Some(nonce) => Ok(nonce),
        None => Ok(last_observed_event_nonce(storage)?.saturating_sub(1)),
    }
}
