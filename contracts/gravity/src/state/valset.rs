use cosmwasm_std::{Order, StdResult, Storage};
use cw_storage_plus::{Bound, Item, Map};

use gravity_apis::gravity_api::{Valset, ValsetConfirm};

/// Valset requests by nonce
pub const VALSETS: Map<u64, Valset> = Map::new("valsets");
/// Valset confirmations by (valset nonce, orchestrator)
pub const VALSET_CONFIRMS: Map<(u64, &str), ValsetConfirm> = Map::new("valset_confirms");
pub const LATEST_VALSET_NONCE: Item<u64> = Item::new("latest_valset_nonce");
/// Last valset the Ethereum contract reported as accepted
pub const LAST_OBSERVED_VALSET: Item<Valset> = Item::new("last_observed_valset");
/// Height of the last block in which a validator started unbonding
pub const LAST_UNBONDING_HEIGHT: Item<u64> = Item::new("last_unbonding_height");
pub const LAST_SLASHED_VALSET_NONCE: Item<u64> = Item::new("last_slashed_valset_nonce");

pub fn latest_valset(storage: &dyn Storage) -> StdResult<Option<Valset>> {
    match LATEST_VALSET_NONCE.may_load(storage)? {
        Some(nonce) => VALSETS.may_load(storage, nonce),
        None => Ok(None),
    }
}

pub fn valset_confirmers(storage: &dyn Storage, nonce: u64) -> StdResult<Vec<String>> {
    VALSET_CONFIRMS
        .prefix(nonce)
        .keys(storage, None, None, Order::Ascending)
        .collect()
}

pub fn delete_valset(storage: &mut dyn Storage, nonce: u64) -> StdResult<()> {
    VALSETS.remove(storage, nonce);
    for orchestrator in valset_confirmers(storage, nonce)? {
        VALSET_CONFIRMS.remove(storage, (nonce, orchestrator.as_str()));
    }
    Ok(())
}

/// Valsets after `after_nonce`, ascending
pub fn valsets_after(storage: &dyn Storage, after_nonce: u64) -> StdResult<Vec<Valset>> {
    VALSETS
        .range(
            storage,
            Some(Bound::exclusive(after_nonce)),
            None,
            Order::Ascending,
        )
        .map(|item| item.map(|(_, v)| v))
        .collect()
}
