use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Api, Env, Event, Order, StdResult, Storage, Uint128};
use cw_storage_plus::PrefixBound;

use gravity_apis::gravity_api::{Attestation, Claim};
use gravity_apis::Validate;

use crate::claims::{apply_claim, ClaimEffects};
use crate::error::ContractError;
use crate::keeper::{total_bonded_power, StakingKeeper};
use crate::state::attestation::{
    last_event_nonce_by_validator, last_observed_event_nonce, ATTESTATIONS,
    LAST_EVENT_NONCE_BY_VALIDATOR, LAST_OBSERVED_EVENT_NONCE,
};
use crate::state::config::Params;
use crate::state::orchestrator::ORCHESTRATOR_VALIDATOR;

/// Records the sender's vote on `claim`. Votes are only counted at end block
pub(crate) fn submit_claim(
    storage: &mut dyn Storage,
    staking: &dyn StakingKeeper,
    env: &Env,
    sender: &Addr,
    claim: Claim,
) -> Result<Event, ContractError> {
    claim.validate()?;
    let operator = ORCHESTRATOR_VALIDATOR
        .may_load(storage, sender.as_str())?
        .ok_or_else(|| ContractError::NotOrchestrator(sender.to_string()))?;
    staking
        .validator(&operator)?
        .filter(|v| v.is_bonded() && !v.jailed)
        .ok_or_else(|| ContractError::ValidatorNotBonded(operator.clone()))?;

    // Each validator reports events one by one, in Ethereum order
    let nonce = claim.event_nonce();
    let expected = last_event_nonce_by_validator(storage, &operator)? + 1;
    if nonce != expected {
        return Err(ContractError::NonContiguousEventNonce {
            expected,
            got: nonce,
        });
    }

    let hash = claim.hash()?;
    let mut att = ATTESTATIONS
        .may_load(storage, (nonce, hash.as_slice()))?
        .unwrap_or_else(|| Attestation {
            observed: false,
            votes: vec![],
            height: env.block.height,
            claim: claim.clone(),
        });
    if att.votes.contains(&operator) {
        return Err(ContractError::DuplicateVote {
            validator: operator,
            nonce,
        });
    }
    att.votes.push(operator.clone());
    ATTESTATIONS.save(storage, (nonce, hash.as_slice()), &att)?;
    LAST_EVENT_NONCE_BY_VALIDATOR.save(storage, &operator, &nonce)?;

    Ok(Event::new("claim")
        .add_attribute("type", claim.claim_type())
        .add_attribute("event_nonce", nonce.to_string())
        .add_attribute("validator", operator)
        .add_attribute("attestation_id", hex::encode(&hash))
        .add_attribute("votes", att.votes.len().to_string()))
}

/// Non observed attestations above `last_observed`, grouped by nonce in ascending order
fn pending_attestations(
    storage: &dyn Storage,
    last_observed: u64,
) -> StdResult<BTreeMap<u64, Vec<(Vec<u8>, Attestation)>>> {
    let mut pending: BTreeMap<u64, Vec<(Vec<u8>, Attestation)>> = BTreeMap::new();
    let atts = ATTESTATIONS.prefix_range(
        storage,
        Some(PrefixBound::exclusive(last_observed)),
        None,
        Order::Ascending,
    );
    for item in atts {
        let ((nonce, hash), att) = item?;
        if !att.observed {
            pending.entry(nonce).or_default().push((hash, att));
        }
    }
    Ok(pending)
}

/// Observes attestations strictly in event nonce order, starting right after the last
/// observed nonce. A nonce that doesn't reach the threshold stops the walk, whatever
/// votes later nonces have.
pub(crate) fn tally_attestations(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
    staking: &dyn StakingKeeper,
    params: &Params,
) -> Result<ClaimEffects, ContractError> {
    let mut msgs = vec![];
    let mut events = vec![];
    if !params.bridge_active {
        return Ok((msgs, events));
    }

    let mut last = last_observed_event_nonce(storage)?;
    let pending = pending_attestations(storage, last)?;
    if pending.is_empty() {
        return Ok((msgs, events));
    }
    let total_power = Uint128::from(total_bonded_power(staking)?);

    for (nonce, atts) in pending {
        if nonce != last + 1 {
            break;
        }
        for (hash, att) in atts {
            if let Some((m, e)) =
                try_attestation(storage, api, env, staking, params, total_power, &hash, att)?
            {
                msgs.extend(m);
                events.extend(e);
                last = nonce;
                break;
            }
        }
        if last != nonce {
            break;
        }
    }
    Ok((msgs, events))
}

/// Counts the bonded power behind `att` and observes it once it exceeds the threshold.
/// Returns `None` if nothing changed, which includes already observed attestations.
#[allow(clippy::too_many_arguments)]
pub(crate) fn try_attestation(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
    staking: &dyn StakingKeeper,
    params: &Params,
    total_power: Uint128,
    hash: &[u8],
    mut att: Attestation,
) -> Result<Option<ClaimEffects>, ContractError> {
    if att.observed {
        return Ok(None);
    }

    let mut power = Uint128::zero();
    for voter in &att.votes {
        let validator = staking
            .validator(voter)?
            .ok_or_else(|| ContractError::UnknownValidator(voter.clone()))?;
        // Unbonded or jailed voters keep their vote but carry no power
        if validator.is_bonded() && !validator.jailed {
            power += Uint128::from(validator.power);
        }
    }
    let required = total_power.mul_floor(params.attestation_threshold);
    if power <= required {
        return Ok(None);
    }

    let nonce = att.claim.event_nonce();
    let last = last_observed_event_nonce(storage)?;
    if nonce != last + 1 {
        return Err(ContractError::OutOfOrderObservation { nonce, last });
    }
    LAST_OBSERVED_EVENT_NONCE.save(storage, &nonce)?;
    att.observed = true;
    ATTESTATIONS.save(storage, (nonce, hash), &att)?;
    for voter in &att.votes {
        LAST_EVENT_NONCE_BY_VALIDATOR.update(storage, voter, |n| -> StdResult<_> {
            Ok(n.unwrap_or_default().max(nonce))
        })?;
    }

    let (msgs, mut events) = apply_claim(storage, api, env, &att.claim)?;
    events.insert(
        0,
        Event::new("observation")
            .add_attribute("type", att.claim.claim_type())
            .add_attribute("event_nonce", nonce.to_string())
            .add_attribute("attestation_id", hex::encode(hash))
            .add_attribute("power", power.to_string())
            .add_attribute("total_power", total_power.to_string()),
    );
    Ok(Some((msgs, events)))
}
