use cosmwasm_std::{Order, StdResult, Storage};
use cw_storage_plus::{Item, Map};

use gravity_apis::gravity_api::{
    BatchConfirm, LogicCallConfirm, OutgoingLogicCall, OutgoingTxBatch,
};

/// Outgoing batches by (token contract, batch nonce)
pub const BATCHES: Map<(&str, u64), OutgoingTxBatch> = Map::new("batches");
/// Batch confirmations by (token contract, batch nonce, orchestrator)
pub const BATCH_CONFIRMS: Map<(&str, u64, &str), BatchConfirm> = Map::new("batch_confirms");
/// Outgoing logic calls by (invalidation id, invalidation nonce)
pub const LOGIC_CALLS: Map<(&str, u64), OutgoingLogicCall> = Map::new("logic_calls");
/// Logic call confirmations by (invalidation id, invalidation nonce, orchestrator)
pub const LOGIC_CALL_CONFIRMS: Map<(&str, u64, &str), LogicCallConfirm> =
    Map::new("logic_call_confirms");
pub const LAST_SLASHED_BATCH_BLOCK: Item<u64> = Item::new("last_slashed_batch_block");
pub const LAST_SLASHED_LOGIC_CALL_BLOCK: Item<u64> = Item::new("last_slashed_logic_call_block");

/// Cosmos denom by ERC20 contract, for Cosmos-originated tokens
pub const ERC20_TO_DENOM: Map<&str, String> = Map::new("erc20_to_denom");
pub const DENOM_TO_ERC20: Map<&str, String> = Map::new("denom_to_erc20");

/// Voucher denom of an Ethereum-originated token
pub fn voucher_denom(token_contract: &str) -> String {
    format!("gravity{token_contract}")
}

pub fn all_batches(storage: &dyn Storage) -> StdResult<Vec<OutgoingTxBatch>> {
    BATCHES
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, b)| b))
        .collect()
}

pub fn all_logic_calls(storage: &dyn Storage) -> StdResult<Vec<OutgoingLogicCall>> {
    LOGIC_CALLS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, c)| c))
        .collect()
}

pub fn batch_confirmers(
    storage: &dyn Storage,
    token_contract: &str,
    nonce: u64,
) -> StdResult<Vec<String>> {
    BATCH_CONFIRMS
        .prefix((token_contract, nonce))
        .keys(storage, None, None, Order::Ascending)
        .collect()
}

pub fn logic_call_confirmers(
    storage: &dyn Storage,
    invalidation_id: &str,
    invalidation_nonce: u64,
) -> StdResult<Vec<String>> {
    LOGIC_CALL_CONFIRMS
        .prefix((invalidation_id, invalidation_nonce))
        .keys(storage, None, None, Order::Ascending)
        .collect()
}

pub fn delete_batch(storage: &mut dyn Storage, token_contract: &str, nonce: u64) -> StdResult<()> {
    BATCHES.remove(storage, (token_contract, nonce));
    for orchestrator in batch_confirmers(storage, token_contract, nonce)? {
        BATCH_CONFIRMS.remove(storage, (token_contract, nonce, orchestrator.as_str()));
    }
    Ok(())
}

pub fn delete_logic_call(
    storage: &mut dyn Storage,
    invalidation_id: &str,
    invalidation_nonce: u64,
) -> StdResult<()> {
    LOGIC_CALLS.remove(storage, (invalidation_id, invalidation_nonce));
    for orchestrator in logic_call_confirmers(storage, invalidation_id, invalidation_nonce)? {
        LOGIC_CALL_CONFIRMS.remove(storage, (invalidation_id, invalidation_nonce, orchestrator.as_str()));
    }
    Ok(())
}
