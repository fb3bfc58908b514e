use cosmwasm_std::Order::{Ascending, Descending};
use cosmwasm_std::{Deps, Env, StdResult};
use cw_storage_plus::{Bound, PrefixBound};

use gravity_apis::gravity_api::{OutgoingLogicCall, OutgoingTxBatch, Valset};
use gravity_bindings::GravityQuery;

use crate::error::ContractError;
use crate::keeper::ChainKeeper;
use crate::msg::{
    AttestationResponse, AttestationsResponse, BatchConfirmsResponse, BatchResponse,
    BatchesResponse, LogicCallConfirmsResponse, LogicCallResponse, LogicCallsResponse,
    ValsetConfirmsResponse, ValsetResponse, ValsetsResponse,
};
use crate::state::attestation::{LastObservedEthHeight, ATTESTATIONS, LAST_OBSERVED_ETH_HEIGHT};
use crate::state::config::{Config, Params, CONFIG, PARAMS};
use crate::state::orchestrator::{ORCHESTRATOR_VALIDATOR, VALIDATOR_ETH_ADDRESS};
use crate::state::outgoing::{
    BATCHES, BATCH_CONFIRMS, DENOM_TO_ERC20, ERC20_TO_DENOM, LOGIC_CALLS, LOGIC_CALL_CONFIRMS,
};
use crate::state::valset::{LAST_OBSERVED_VALSET, LATEST_VALSET_NONCE, VALSETS, VALSET_CONFIRMS};
use crate::valset;

// Settings for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;
/// Outgoing batches and logic calls are listed without cursor
const MAX_OUTGOING: u32 = 100;
const MAX_PENDING_VALSETS: usize = 5;

pub fn config(deps: Deps<GravityQuery>) -> StdResult<Config> {
    CONFIG.load(deps.storage)
}

pub fn params(deps: Deps<GravityQuery>) -> StdResult<Params> {
    PARAMS.load(deps.storage)
}

pub fn current_valset(deps: Deps<GravityQuery>, env: &Env) -> StdResult<Valset> {
    let keeper = ChainKeeper::new(deps.querier);
    let params = PARAMS.load(deps.storage)?;
    valset::current_valset(deps.storage, env, &keeper, &params)
}

pub fn valset(deps: Deps<GravityQuery>, nonce: u64) -> StdResult<ValsetResponse> {
    let valset = VALSETS.may_load(deps.storage, nonce)?;
    Ok(ValsetResponse { valset })
}

pub fn latest_valset_nonce(deps: Deps<GravityQuery>) -> StdResult<u64> {
    Ok(LATEST_VALSET_NONCE
        .may_load(deps.storage)?
        .unwrap_or_default())
}

pub fn last_observed_valset(deps: Deps<GravityQuery>) -> StdResult<Option<Valset>> {
    LAST_OBSERVED_VALSET.may_load(deps.storage)
}

/// Get list of valset requests.
/// `start_after`: The nonce to start after, if any.
/// `reverse`: List in descending order if present and true, otherwise in ascending order.
pub fn valsets(
    deps: Deps<GravityQuery>,
    start_after: Option<u64>,
    limit: Option<u32>,
    reverse: Option<bool>,
) -> StdResult<ValsetsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_after = start_after.map(Bound::exclusive);
    let (start, end, order) = if reverse.unwrap_or(false) {
        (None, start_after, Descending)
    } else {
        (start_after, None, Ascending)
    };
    let valsets = VALSETS
        .range(deps.storage, start, end, order)
        .take(limit)
        .map(|item| item.map(|(_, v)| v))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(ValsetsResponse { valsets })
}

pub fn valset_confirms(deps: Deps<GravityQuery>, nonce: u64) -> StdResult<ValsetConfirmsResponse> {
    let confirms = VALSET_CONFIRMS
        .prefix(nonce)
        .range(deps.storage, None, None, Ascending)
        .map(|item| item.map(|(_, c)| c))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(ValsetConfirmsResponse { confirms })
}

/// Latest valsets not confirmed by `orchestrator`, newest first
pub fn last_pending_valsets(
    deps: Deps<GravityQuery>,
    orchestrator: String,
) -> Result<ValsetsResponse, ContractError> {
    let orchestrator = deps.api.addr_validate(&orchestrator)?;
    let valsets = VALSETS
        .range(deps.storage, None, None, Descending)
        .filter(|item| match item {
            Ok((nonce, _)) => {
                !VALSET_CONFIRMS.has(deps.storage, (*nonce, orchestrator.as_str()))
            }
            Err(_) => true, // don't filter errors
        })
        .take(MAX_PENDING_VALSETS)
        .map(|item| item.map(|(_, v)| v))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(ValsetsResponse { valsets })
}

pub fn last_observed_eth_height(deps: Deps<GravityQuery>) -> StdResult<LastObservedEthHeight> {
    Ok(LAST_OBSERVED_ETH_HEIGHT
        .may_load(deps.storage)?
        .unwrap_or_default())
}

pub fn last_event_nonce_by_validator(
    deps: Deps<GravityQuery>,
    validator: String,
) -> StdResult<u64> {
    crate::state::attestation::last_event_nonce_by_validator(deps.storage, &validator)
}

/// Attestations in descending nonce order, starting below `start_after` if given
pub fn attestations(
    deps: Deps<GravityQuery>,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<AttestationsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let attestations = ATTESTATIONS
        .prefix_range(
            deps.storage,
            None,
            start_after.map(PrefixBound::exclusive),
            Descending,
        )
        .take(limit)
        .map(|item| item.map(|(_, att)| att))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(AttestationsResponse { attestations })
}

pub fn attestation(
    deps: Deps<GravityQuery>,
    nonce: u64,
    claim_hash: String,
) -> Result<AttestationResponse, ContractError> {
    let hash = hex::decode(claim_hash)?;
    let attestation = ATTESTATIONS.may_load(deps.storage, (nonce, hash.as_slice()))?;
    Ok(AttestationResponse { attestation })
}

pub fn outgoing_tx_batches(
    deps: Deps<GravityQuery>,
    limit: Option<u32>,
) -> StdResult<BatchesResponse> {
    let limit = limit.unwrap_or(MAX_OUTGOING).min(MAX_OUTGOING) as usize;
    let batches = BATCHES
        .range(deps.storage, None, None, Ascending)
        .take(limit)
        .map(|item| item.map(|(_, b)| b))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(BatchesResponse { batches })
}

pub fn outgoing_tx_batch(
    deps: Deps<GravityQuery>,
    token_contract: String,
    nonce: u64,
) -> StdResult<BatchResponse> {
    let batch = BATCHES.may_load(deps.storage, (token_contract.as_str(), nonce))?;
    Ok(BatchResponse { batch })
}

pub fn batch_confirms(
    deps: Deps<GravityQuery>,
    token_contract: String,
    nonce: u64,
) -> StdResult<BatchConfirmsResponse> {
    let confirms = BATCH_CONFIRMS
        .prefix((token_contract.as_str(), nonce))
        .range(deps.storage, None, None, Ascending)
        .map(|item| item.map(|(_, c)| c))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(BatchConfirmsResponse { confirms })
}

pub fn last_pending_batch(
    deps: Deps<GravityQuery>,
    orchestrator: String,
) -> Result<BatchResponse, ContractError> {
    let orchestrator = deps.api.addr_validate(&orchestrator)?;
    let batch = first_unconfirmed(
        BATCHES.range(deps.storage, None, None, Ascending),
        |b: &OutgoingTxBatch| {
            BATCH_CONFIRMS.has(
                deps.storage,
                (b.token_contract.as_str(), b.batch_nonce, orchestrator.as_str()),
            )
        },
    )?;
    Ok(BatchResponse { batch })
}

pub fn outgoing_logic_calls(
    deps: Deps<GravityQuery>,
    limit: Option<u32>,
) -> StdResult<LogicCallsResponse> {
    let limit = limit.unwrap_or(MAX_OUTGOING).min(MAX_OUTGOING) as usize;
    let calls = LOGIC_CALLS
        .range(deps.storage, None, None, Ascending)
        .take(limit)
        .map(|item| item.map(|(_, c)| c))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(LogicCallsResponse { calls })
}

pub fn outgoing_logic_call(
    deps: Deps<GravityQuery>,
    invalidation_id: String,
    invalidation_nonce: u64,
) -> StdResult<LogicCallResponse> {
    let call = LOGIC_CALLS.may_load(
        deps.storage,
        (invalidation_id.as_str(), invalidation_nonce),
    )?;
    Ok(LogicCallResponse { call })
}

pub fn logic_call_confirms(
    deps: Deps<GravityQuery>,
    invalidation_id: String,
    invalidation_nonce: u64,
) -> StdResult<LogicCallConfirmsResponse> {
    let confirms = LOGIC_CALL_CONFIRMS
        .prefix((invalidation_id.as_str(), invalidation_nonce))
        .range(deps.storage, None, None, Ascending)
        .map(|item| item.map(|(_, c)| c))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(LogicCallConfirmsResponse { confirms })
}

pub fn last_pending_logic_call(
    deps: Deps<GravityQuery>,
    orchestrator: String,
) -> Result<LogicCallResponse, ContractError> {
    let orchestrator = deps.api.addr_validate(&orchestrator)?;
    let call = first_unconfirmed(
        LOGIC_CALLS.range(deps.storage, None, None, Ascending),
        |c: &OutgoingLogicCall| {
            LOGIC_CALL_CONFIRMS.has(
                deps.storage,
                (
                    c.invalidation_id.as_str(),
                    c.invalidation_nonce,
                    orchestrator.as_str(),
                ),
            )
        },
    )?;
    Ok(LogicCallResponse { call })
}

fn first_unconfirmed<K, T>(
    items: impl Iterator<Item = StdResult<(K, T)>>,
    confirmed: impl Fn(&T) -> bool,
) -> StdResult<Option<T>> {
    for item in items {
        let (_, artifact) = item?;
        if !confirmed(&artifact) {
            return Ok(Some(artifact));
        }
    }
    Ok(None)
}

pub fn orchestrator_validator(
    deps: Deps<GravityQuery>,
    orchestrator: String,
) -> StdResult<Option<String>> {
    ORCHESTRATOR_VALIDATOR.may_load(deps.storage, &orchestrator)
}

pub fn eth_address_by_validator(
    deps: Deps<GravityQuery>,
    validator: String,
) -> StdResult<Option<String>> {
    VALIDATOR_ETH_ADDRESS.may_load(deps.storage, &validator)
}

pub fn erc20_to_denom(deps: Deps<GravityQuery>, erc20: String) -> StdResult<Option<String>> {
    ERC20_TO_DENOM.may_load(deps.storage, &erc20)
}

pub fn denom_to_erc20(deps: Deps<GravityQuery>, denom: String) -> StdResult<Option<String>> {
    DENOM_TO_ERC20.may_load(deps.storage, &denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    use cosmwasm_std::{Binary, Storage, Uint128};
    use gravity_apis::gravity_api::{BatchConfirm, BridgeValidator, LogicCallConfirm, ValsetConfirm};
    use gravity_bindings_test::mock_dependencies;

    use crate::test_utils::{deposit, eth_address, orchestrator, store_attestation, token_contract};

    fn store_valset(storage: &mut dyn Storage, nonce: u64) {
        let valset = Valset {
            nonce,
            members: vec![BridgeValidator {
                power: u32::MAX as u64,
                ethereum_address: eth_address(1),
            }],
            height: nonce * 10,
            reward_amount: Uint128::zero(),
            reward_token: None,
        };
        VALSETS.save(storage, nonce, &valset).unwrap();
    }

    fn confirm_valset(storage: &mut dyn Storage, nonce: u64, n: u8) {
        let orch = orchestrator(n);
        let confirm = ValsetConfirm {
            nonce,
            orchestrator: orch.clone(),
            eth_address: eth_address(n),
            signature: "sig".to_string(),
        };
        VALSET_CONFIRMS
            .save(storage, (nonce, orch.as_str()), &confirm)
            .unwrap();
    }

    fn store_batch(storage: &mut dyn Storage, nonce: u64) {
        let batch = OutgoingTxBatch {
            batch_nonce: nonce,
            batch_timeout: 1000,
            transactions: vec![],
            token_contract: token_contract(),
            block: nonce,
        };
        BATCHES
            .save(storage, (batch.token_contract.as_str(), nonce), &batch)
            .unwrap();
    }

    fn confirm_batch(storage: &mut dyn Storage, nonce: u64, n: u8) {
        let token = token_contract();
        let orch = orchestrator(n);
        let confirm = BatchConfirm {
            token_contract: token.clone(),
            nonce,
            orchestrator: orch.clone(),
            eth_signer: eth_address(n),
            signature: "sig".to_string(),
        };
        BATCH_CONFIRMS
            .save(storage, (token.as_str(), nonce, orch.as_str()), &confirm)
            .unwrap();
    }

    fn invalidation_id() -> String {
        hex::encode([5u8; 32])
    }

    fn store_logic_call(storage: &mut dyn Storage, nonce: u64) {
        let call = OutgoingLogicCall {
            transfers: vec![],
            fees: vec![],
            logic_contract_address: eth_address(7),
            payload: Binary::from(b"call".as_slice()),
            timeout: 1000,
            invalidation_id: invalidation_id(),
            invalidation_nonce: nonce,
            block: nonce,
        };
        LOGIC_CALLS
            .save(storage, (call.invalidation_id.as_str(), nonce), &call)
            .unwrap();
    }

    fn confirm_logic_call(storage: &mut dyn Storage, nonce: u64, n: u8) {
        let id = invalidation_id();
        let orch = orchestrator(n);
        let confirm = LogicCallConfirm {
            invalidation_id: id.clone(),
            invalidation_nonce: nonce,
            orchestrator: orch.clone(),
            eth_signer: eth_address(n),
            signature: "sig".to_string(),
        };
        LOGIC_CALL_CONFIRMS
            .save(storage, (id.as_str(), nonce, orch.as_str()), &confirm)
            .unwrap();
    }

    fn nonces(res: ValsetsResponse) -> Vec<u64> {
        res.valsets.into_iter().map(|v| v.nonce).collect()
    }

    #[test]
    fn last_pending_valsets_newest_first_without_confirmed() {
        let mut deps = mock_dependencies();
        for nonce in 1..=7 {
            store_valset(&mut deps.storage, nonce);
        }
        confirm_valset(&mut deps.storage, 7, 1);
        confirm_valset(&mut deps.storage, 5, 1);

        let res = last_pending_valsets(deps.as_ref(), orchestrator(1)).unwrap();
        assert_eq!(nonces(res), vec![6, 4, 3, 2, 1]);

        // Capped for an orchestrator that confirmed nothing
        let res = last_pending_valsets(deps.as_ref(), orchestrator(2)).unwrap();
        assert_eq!(nonces(res), vec![7, 6, 5, 4, 3]);

        let err = last_pending_valsets(deps.as_ref(), "not an address".to_string()).unwrap_err();
        assert!(matches!(err, ContractError::StdError(_)));
    }

    #[test]
    fn valsets_paginate_both_ways() {
        let mut deps = mock_dependencies();
        for nonce in 1..=3 {
            store_valset(&mut deps.storage, nonce);
        }

        let res = valsets(deps.as_ref(), None, None, None).unwrap();
        assert_eq!(nonces(res), vec![1, 2, 3]);
        let res = valsets(deps.as_ref(), Some(1), None, Some(false)).unwrap();
        assert_eq!(nonces(res), vec![2, 3]);
        let res = valsets(deps.as_ref(), None, Some(2), Some(true)).unwrap();
        assert_eq!(nonces(res), vec![3, 2]);
        let res = valsets(deps.as_ref(), Some(3), None, Some(true)).unwrap();
        assert_eq!(nonces(res), vec![2, 1]);
    }

    #[test]
    fn last_pending_batch_is_oldest_unconfirmed() {
        let mut deps = mock_dependencies();
        store_batch(&mut deps.storage, 1);
        store_batch(&mut deps.storage, 2);
        confirm_batch(&mut deps.storage, 1, 1);

        let res = last_pending_batch(deps.as_ref(), orchestrator(1)).unwrap();
        assert_eq!(res.batch.unwrap().batch_nonce, 2);
        let res = last_pending_batch(deps.as_ref(), orchestrator(2)).unwrap();
        assert_eq!(res.batch.unwrap().batch_nonce, 1);

        confirm_batch(&mut deps.storage, 2, 1);
        let res = last_pending_batch(deps.as_ref(), orchestrator(1)).unwrap();
        assert_eq!(res.batch, None);
    }

    #[test]
    fn last_pending_logic_call_is_oldest_unconfirmed() {
        let mut deps = mock_dependencies();
        store_logic_call(&mut deps.storage, 1);
        store_logic_call(&mut deps.storage, 2);
        confirm_logic_call(&mut deps.storage, 1, 1);

        let res = last_pending_logic_call(deps.as_ref(), orchestrator(1)).unwrap();
        assert_eq!(res.call.unwrap().invalidation_nonce, 2);
        let res = last_pending_logic_call(deps.as_ref(), orchestrator(2)).unwrap();
        assert_eq!(res.call.unwrap().invalidation_nonce, 1);

        confirm_logic_call(&mut deps.storage, 2, 1);
        let res = last_pending_logic_call(deps.as_ref(), orchestrator(1)).unwrap();
        assert_eq!(res.call, None);
    }

    #[test]
    fn attestations_descend_from_start_after() {
        let mut deps = mock_dependencies();
        let mut hashes = vec![];
        for nonce in 1..=4 {
            hashes.push(store_attestation(
                &mut deps.storage,
                deposit(nonce, nonce * 10),
                &[1],
            ));
        }
        let event_nonces = |res: AttestationsResponse| -> Vec<u64> {
            res.attestations
                .iter()
                .map(|att| att.claim.event_nonce())
                .collect()
        };

        let res = attestations(deps.as_ref(), None, None).unwrap();
        assert_eq!(event_nonces(res), vec![4, 3, 2, 1]);
        let res = attestations(deps.as_ref(), Some(3), None).unwrap();
        assert_eq!(event_nonces(res), vec![2, 1]);
        let res = attestations(deps.as_ref(), Some(4), Some(1)).unwrap();
        assert_eq!(event_nonces(res), vec![3]);

        let res = attestation(deps.as_ref(), 2, hex::encode(&hashes[1])).unwrap();
        assert_eq!(res.attestation.unwrap().claim.event_nonce(), 2);
        let res = attestation(deps.as_ref(), 3, hex::encode(&hashes[1])).unwrap();
        assert_eq!(res.attestation, None);
        let err = attestation(deps.as_ref(), 2, "zz".to_string()).unwrap_err();
        assert!(matches!(err, ContractError::HexError(_)));
    }
}
