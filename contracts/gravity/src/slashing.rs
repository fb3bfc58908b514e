//! Slashing of validators that fail to confirm bridge artifacts.
//!
//! Valsets, batches and logic calls all follow the same protocol: once an artifact is older
//! than its signing window, every validator that was active when it was created and did
//! not confirm it gets slashed and jailed. `ConfirmationProtocol` captures what differs
//! between the three, `slash_unconfirmed` is the shared routine.
use std::collections::BTreeSet;

use cosmwasm_std::{Api, Decimal, Env, Event, Order, StdResult, Storage};
use cw_storage_plus::Bound;

use gravity_apis::gravity_api::{OutgoingLogicCall, OutgoingTxBatch, Valset};
use gravity_bindings::ValidatorInfo;

use crate::error::ContractError;
use crate::keeper::Keepers;
use crate::state::config::Params;
use crate::state::orchestrator::ORCHESTRATOR_VALIDATOR;
use crate::state::outgoing::{
    all_batches, all_logic_calls, batch_confirmers, logic_call_confirmers,
    LAST_SLASHED_BATCH_BLOCK, LAST_SLASHED_LOGIC_CALL_BLOCK,
};
use crate::state::valset::{
    valset_confirmers, LAST_SLASHED_VALSET_NONCE, LAST_UNBONDING_HEIGHT, VALSETS,
};

pub(crate) trait ConfirmationProtocol {
    type Artifact;

    const KIND: &'static str;

    /// Whether bonded validators without signing info are still held to the artifact
    const SLASH_WITHOUT_SIGNING_INFO: bool;

    fn window(params: &Params) -> u64;

    fn slash_fraction(params: &Params) -> Decimal;

    /// Artifacts not slashed for yet, created at or before `max_height`, oldest first
    fn unslashed(storage: &dyn Storage, max_height: u64) -> StdResult<Vec<Self::Artifact>>;

    /// Cosmos block height the artifact was created at
    fn height(artifact: &Self::Artifact) -> u64;

    fn id(artifact: &Self::Artifact) -> String;

    /// Orchestrator addresses that confirmed the artifact
    fn confirmations(storage: &dyn Storage, artifact: &Self::Artifact) -> StdResult<Vec<String>>;

    fn mark_slashed(storage: &mut dyn Storage, artifact: &Self::Artifact) -> StdResult<()>;

    /// Window after the start of an unbonding during which unbonding validators are
    /// still expected to confirm. `None` if unbonding validators are never slashed
    fn unbond_slashing_window(_params: &Params) -> Option<u64> {
        None
    }
}

pub(crate) struct ValsetConfirmations;

impl ConfirmationProtocol for ValsetConfirmations {
    type Artifact = Valset;

    const KIND: &'static str = "valset";
    const SLASH_WITHOUT_SIGNING_INFO: bool = false;

    fn window(params: &Params) -> u64 {
        params.signed_valsets_window
    }

    fn slash_fraction(params: &Params) -> Decimal {
        params.slash_fraction_valset
    }

    fn unslashed(storage: &dyn Storage, max_height: u64) -> StdResult<Vec<Valset>> {
        let last_slashed = LAST_SLASHED_VALSET_NONCE
            .may_load(storage)?
            .unwrap_or_default();
        VALSETS
            .range(
                storage,
                Some(Bound::exclusive(last_slashed)),
                None,
                Order::Ascending,
            )
            .filter(|item| !matches!(item, Ok((_, v)) if v.height > max_height))
            .map(|item| item.map(|(_, v)| v))
            .collect()
    }

    fn height(valset: &Valset) -> u64 {
        valset.height
    }

    fn id(valset: &Valset) -> String {
        valset.nonce.to_string()
    }

    fn confirmations(storage: &dyn Storage, valset: &Valset) -> StdResult<Vec<String>> {
        valset_confirmers(storage, valset.nonce)
    }

    fn mark_slashed(storage: &mut dyn Storage, valset: &Valset) -> StdResult<()> {
        LAST_SLASHED_VALSET_NONCE.save(storage, &valset.nonce)
    }

    fn unbond_slashing_window(params: &Params) -> Option<u64> {
        Some(params.unbond_slashing_valsets_window)
    }
}

pub(crate) struct BatchConfirmations;

impl ConfirmationProtocol for BatchConfirmations {
    type Artifact = OutgoingTxBatch;

    const KIND: &'static str = "batch";
    const SLASH_WITHOUT_SIGNING_INFO: bool = true;

    fn window(params: &Params) -> u64 {
        params.signed_batches_window
    }

    fn slash_fraction(params: &Params) -> Decimal {
        params.slash_fraction_batch
    }

    fn unslashed(storage: &dyn Storage, max_height: u64) -> StdResult<Vec<OutgoingTxBatch>> {
        let last_slashed = LAST_SLASHED_BATCH_BLOCK
            .may_load(storage)?
            .unwrap_or_default();
        let mut batches: Vec<_> = all_batches(storage)?
            .into_iter()
            .filter(|b| b.block > last_slashed && b.block <= max_height)
            .collect();
        batches.sort_by_key(|b| b.block);
        Ok(batches)
    }

    fn height(batch: &OutgoingTxBatch) -> u64 {
        batch.block
    }

    fn id(batch: &OutgoingTxBatch) -> String {
        format!("{}/{}", batch.token_contract, batch.batch_nonce)
    }

    fn confirmations(storage: &dyn Storage, batch: &OutgoingTxBatch) -> StdResult<Vec<String>> {
        batch_confirmers(storage, &batch.token_contract, batch.batch_nonce)
    }

    fn mark_slashed(storage: &mut dyn Storage, batch: &OutgoingTxBatch) -> StdResult<()> {
        LAST_SLASHED_BATCH_BLOCK.save(storage, &batch.block)
    }
}

pub(crate) struct LogicCallConfirmations;

impl ConfirmationProtocol for LogicCallConfirmations {
    type Artifact = OutgoingLogicCall;

    const KIND: &'static str = "logic_call";
    const SLASH_WITHOUT_SIGNING_INFO: bool = true;

    fn window(params: &Params) -> u64 {
        params.signed_logic_calls_window
    }

    fn slash_fraction(params: &Params) -> Decimal {
        params.slash_fraction_logic_call
    }

    fn unslashed(storage: &dyn Storage, max_height: u64) -> StdResult<Vec<OutgoingLogicCall>> {
        let last_slashed = LAST_SLASHED_LOGIC_CALL_BLOCK
            .may_load(storage)?
            .unwrap_or_default();
        let mut calls: Vec<_> = all_logic_calls(storage)?
            .into_iter()
            .filter(|c| c.block > last_slashed && c.block <= max_height)
            .collect();
        calls.sort_by_key(|c| c.block);
        Ok(calls)
    }

    fn height(call: &OutgoingLogicCall) -> u64 {
        call.block
    }

    fn id(call: &OutgoingLogicCall) -> String {
        format!("{}/{}", call.invalidation_id, call.invalidation_nonce)
    }

    fn confirmations(storage: &dyn Storage, call: &OutgoingLogicCall) -> StdResult<Vec<String>> {
        logic_call_confirmers(storage, &call.invalidation_id, call.invalidation_nonce)
    }

    fn mark_slashed(storage: &mut dyn Storage, call: &OutgoingLogicCall) -> StdResult<()> {
        LAST_SLASHED_LOGIC_CALL_BLOCK.save(storage, &call.block)
    }
}

/// Operator addresses of the validators behind the given orchestrators
fn confirming_validators(
    storage: &dyn Storage,
    orchestrators: Vec<String>,
) -> Result<BTreeSet<String>, ContractError> {
    orchestrators
        .into_iter()
        .map(|orchestrator| {
            ORCHESTRATOR_VALIDATOR
                .may_load(storage, &orchestrator)?
                .ok_or(ContractError::UnknownOrchestrator(orchestrator))
        })
        .collect()
}

/// Slashes and, unless already jailed, jails `validator`. Jailing from inside the end block
/// doesn't reliably trigger the unbonding hook, so the unbonding height is recorded here
fn punish<K: Keepers + ?Sized>(
    storage: &mut dyn Storage,
    env: &Env,
    keeper: &mut K,
    validator: &ValidatorInfo,
    fraction: Decimal,
) -> Result<(), ContractError> {
    keeper.slash(
        &validator.cons_address,
        env.block.height,
        validator.power,
        fraction,
    )?;
    if !validator.jailed {
        keeper.jail(&validator.cons_address)?;
        LAST_UNBONDING_HEIGHT.save(storage, &env.block.height)?;
    }
    Ok(())
}

/// Slashes the validators that didn't confirm artifacts of protocol `P` within its window
pub(crate) fn slash_unconfirmed<P: ConfirmationProtocol, K: Keepers + ?Sized>(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
    keeper: &mut K,
    params: &Params,
) -> Result<Vec<Event>, ContractError> {
    let window = P::window(params);
    let current = env.block.height;
    // No artifact could have been fairly demanded yet
    if current <= window {
        return Ok(vec![]);
    }
    let max_height = current - window;
    let fraction = P::slash_fraction(params);

    let mut events = vec![];
    for artifact in P::unslashed(storage, max_height)? {
        let height = P::height(&artifact);
        let id = P::id(&artifact);
        let confirmed = confirming_validators(storage, P::confirmations(storage, &artifact)?)?;
        let mut slashed = vec![];

        for validator in keeper.bonded_validators_by_power()? {
            // Spare validators that joined after the artifact
            let spared = match keeper.start_height(&validator.cons_address)? {
                Some(start_height) => start_height > height,
                None => !P::SLASH_WITHOUT_SIGNING_INFO,
            };
            if spared || confirmed.contains(&validator.operator) {
                continue;
            }
            punish(storage, env, keeper, &validator, fraction)?;
            slashed.push(validator.operator);
        }

        if let Some(unbond_window) = P::unbond_slashing_window(params) {
            let end_time = env.block.time.plus_seconds(keeper.unbonding_time()?);
            for validator in keeper.unbonding_validators(end_time, current)? {
                let Some(start_height) = keeper.start_height(&validator.cons_address)? else {
                    continue;
                };
                let within_window =
                    height < validator.unbonding_height.saturating_add(unbond_window);
                if start_height < height
                    && validator.is_unbonding()
                    && within_window
                    && !confirmed.contains(&validator.operator)
                {
                    punish(storage, env, keeper, &validator, fraction)?;
                    slashed.push(validator.operator);
                }
            }
        }

        P::mark_slashed(storage, &artifact)?;
        for operator in slashed {
            api.debug(&format!(
                "Slashing {operator} for not confirming {} {id}",
                P::KIND
            ));
            events.push(
                Event::new("slash")
                    .add_attribute("kind", P::KIND)
                    .add_attribute("validator", operator)
                    .add_attribute("artifact", &id)
                    .add_attribute("fraction", fraction.to_string()),
            );
        }
    }
    Ok(events)
}

/// Runs the three confirmation protocols, valsets first
pub(crate) fn slash_all<K: Keepers + ?Sized>(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
    keeper: &mut K,
    params: &Params,
) -> Result<Vec<Event>, ContractError> {
    let mut events =
        slash_unconfirmed::<ValsetConfirmations, K>(storage, api, env, keeper, params)?;
    events.extend(slash_unconfirmed::<BatchConfirmations, K>(
        storage, api, env, keeper, params,
    )?);
    events.extend(slash_unconfirmed::<LogicCallConfirmations, K>(
        storage, api, env, keeper, params,
    )?);
    Ok(events)
}
