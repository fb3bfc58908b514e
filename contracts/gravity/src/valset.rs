use std::collections::HashMap;

use cosmwasm_std::{Api, Decimal, Env, Event, Order, StdResult, Storage, Uint128};

use gravity_apis::gravity_api::{BridgeValidator, Valset};

use crate::error::ContractError;
use crate::keeper::StakingKeeper;
use crate::state::config::Params;
use crate::state::orchestrator::VALIDATOR_ETH_ADDRESS;
use crate::state::outgoing::DENOM_TO_ERC20;
use crate::state::valset::{
    delete_valset, latest_valset, LAST_OBSERVED_VALSET, LAST_UNBONDING_HEIGHT, LATEST_VALSET_NONCE,
    VALSETS,
};

/// Total normalized power of a bridge validator set, as the Ethereum contract expects it
pub const TOTAL_BRIDGE_POWER: u64 = u32::MAX as u64;

/// Bonded validators with an Ethereum address, their power normalized to `TOTAL_BRIDGE_POWER`.
/// The nonce is left at zero and the height at the current block
pub fn current_valset(
    storage: &dyn Storage,
    env: &Env,
    staking: &dyn StakingKeeper,
    params: &Params,
) -> StdResult<Valset> {
    let mut bridge_validators = vec![];
    for validator in staking.bonded_validators_by_power()? {
        if let Some(eth_address) = VALIDATOR_ETH_ADDRESS.may_load(storage, &validator.operator)? {
            bridge_validators.push((validator.power as u128, eth_address));
        }
    }
    let total: u128 = bridge_validators.iter().map(|(p, _)| p).sum();

    let mut members: Vec<BridgeValidator> = bridge_validators
        .into_iter()
        .map(|(power, ethereum_address)| BridgeValidator {
            // u128 intermediate, u64 power times u32::MAX can't overflow
            power: (power * TOTAL_BRIDGE_POWER as u128)
                .checked_div(total)
                .unwrap_or_default() as u64,
            ethereum_address,
        })
        .collect();
    members.sort_by(|a, b| {
        b.power
            .cmp(&a.power)
            .then_with(|| a.ethereum_address.cmp(&b.ethereum_address))
    });

    let (reward_amount, reward_token) = valset_reward(storage, params)?;
    Ok(Valset {
        nonce: 0,
        members,
        height: env.block.height,
        reward_amount,
        reward_token,
    })
}

/// The reward can only be paid in a token the Ethereum contract knows
fn valset_reward(storage: &dyn Storage, params: &Params) -> StdResult<(Uint128, Option<String>)> {
    let Some(reward) = params.valset_reward.as_ref().filter(|c| !c.amount.is_zero()) else {
        return Ok((Uint128::zero(), None));
    };
    Ok(match DENOM_TO_ERC20.may_load(storage, &reward.denom)? {
        Some(erc20) => (reward.amount, Some(erc20)),
        None => (Uint128::zero(), None),
    })
}

/// Sum of the absolute power changes between two normalized sets, as a fraction of
/// the total normalized power. Members are matched by Ethereum address
pub fn power_diff(current: &[BridgeValidator], previous: &[BridgeValidator]) -> Decimal {
    let mut powers: HashMap<&str, (u64, u64)> = HashMap::new();
    for member in current {
        powers.entry(member.ethereum_address.as_str()).or_default().0 = member.power;
    }
    for member in previous {
        powers.entry(member.ethereum_address.as_str()).or_default().1 = member.power;
    }
    let delta: u128 = powers
        .values()
        .map(|(now, before)| now.abs_diff(*before) as u128)
        .sum();
    Decimal::from_ratio(delta, TOTAL_BRIDGE_POWER as u128)
}

/// Stores the current valset as a new request, under the next nonce
pub(crate) fn set_valset_request(
    storage: &mut dyn Storage,
    env: &Env,
    staking: &dyn StakingKeeper,
    params: &Params,
) -> Result<(Valset, Event), ContractError> {
    let mut valset = current_valset(storage, env, staking, params)?;
    valset.nonce = LATEST_VALSET_NONCE.may_load(storage)?.unwrap_or_default() + 1;
    VALSETS.save(storage, valset.nonce, &valset)?;
    LATEST_VALSET_NONCE.save(storage, &valset.nonce)?;

    let event = Event::new("valset_request")
        .add_attribute("nonce", valset.nonce.to_string())
        .add_attribute("height", valset.height.to_string())
        .add_attribute("members", valset.members.len().to_string());
    Ok((valset, event))
}

/// Requests a new valset if none exists yet, if a validator started unbonding in this block,
/// or if the live set drifted too far from the latest request.
/// The comparison is against the latest request, not the last observed valset: relying on the
/// latter lets the Ethereum side drift away until it can no longer reach quorum
pub(crate) fn create_valsets(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
    staking: &dyn StakingKeeper,
    params: &Params,
) -> Result<Option<Event>, ContractError> {
    let latest = latest_valset(storage)?;
    let unbonding_now =
        LAST_UNBONDING_HEIGHT.may_load(storage)?.unwrap_or_default() == env.block.height;

    let significant_diff = match &latest {
        Some(latest) => {
            let current = current_valset(storage, env, staking, params)?;
            let diff = power_diff(&current.members, &latest.members);
            diff > params.valset_change_threshold
        }
        None => false,
    };

    if latest.is_none() || unbonding_now || significant_diff {
        let (valset, event) = set_valset_request(storage, env, staking, params)?;
        api.debug(&format!(
            "Valset request {} at height {} (unbonding: {unbonding_now}, power drift: {significant_diff})",
            valset.nonce, valset.height
        ));
        return Ok(Some(event));
    }
    Ok(None)
}

/// Deletes valsets superseded by the last observed one, once they are older than the
/// signing window, so valset slashing gets to see them first
pub(crate) fn prune_valsets(
    storage: &mut dyn Storage,
    env: &Env,
    params: &Params,
) -> StdResult<Option<Event>> {
    let current = env.block.height;
    if current < params.signed_valsets_window {
        return Ok(None);
    }
    let Some(last_observed) = LAST_OBSERVED_VALSET.may_load(storage)? else {
        return Ok(None);
    };
    let earliest_to_keep = current - params.signed_valsets_window;

    let prunable = VALSETS
        .range(storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((nonce, valset))
                if nonce < last_observed.nonce && valset.height < earliest_to_keep =>
            {
                Some(Ok(nonce))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<StdResult<Vec<_>>>()?;
    if prunable.is_empty() {
        return Ok(None);
    }
    for nonce in &prunable {
        delete_valset(storage, *nonce)?;
    }
    Ok(Some(
        Event::new("valsets_pruned").add_attribute("count", prunable.len().to_string()),
    ))
}
