use cosmwasm_std::{Api, Env, Event, Response, Storage};

use gravity_bindings::GravityMsg;

use crate::attestation::tally_attestations;
use crate::error::ContractError;
use crate::keeper::Keepers;
use crate::outgoing::{cancel_timed_out_batches, cancel_timed_out_logic_calls};
use crate::pruning::{prune_attestations, rollback_attestations};
use crate::slashing::slash_all;
use crate::state::attestation::last_observed_event_nonce;
use crate::state::config::{Params, CONFIG, PARAMS};
use crate::valset::{create_valsets, prune_valsets};

/// Advances the bridge by one block.
/// Any error aborts the whole pass, the chain then discards its state changes.
/// Slashing and jailing go through `keeper`, the caller is in charge of its messages
pub fn end_blocker<K: Keepers>(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
    keeper: &mut K,
) -> Result<Response<GravityMsg>, ContractError> {
    let mut params = PARAMS.load(storage)?;
    let mut res = Response::new();

    if params.reset_bridge_state {
        let event = unhalt_bridge(storage, api, &mut params)?;
        PARAMS.save(storage, &params)?;
        res = res.add_event(event);
    }

    // Slashing runs before valset pruning, so unconfirmed valsets are still around
    res = res.add_events(slash_all(storage, api, env, keeper, &params)?);

    let (msgs, events) = tally_attestations(storage, api, env, &*keeper, &params)?;
    res = res.add_messages(msgs).add_events(events);

    let (msgs, events) = cancel_timed_out_batches(storage, api)?;
    res = res.add_messages(msgs).add_events(events);
    let (msgs, events) = cancel_timed_out_logic_calls(storage, api)?;
    res = res.add_messages(msgs).add_events(events);

    if let Some(event) = create_valsets(storage, api, env, &*keeper, &params)? {
        res = res.add_event(event);
    }
    if let Some(event) = prune_valsets(storage, env, &params)? {
        res = res.add_event(event);
    }
    if let Some(event) = prune_attestations(storage, params.attestation_retention)? {
        res = res.add_event(event);
    }

    Ok(res.add_attribute("action", "end_block"))
}

/// One-shot reset of the oracle history after the bridge was halted by governance.
/// A target below the last observed event is refused, since those events were acted
/// upon already. Either way the reset params go back to their defaults
pub(crate) fn unhalt_bridge(
    storage: &mut dyn Storage,
    api: &dyn Api,
    params: &mut Params,
) -> Result<Event, ContractError> {
    let target = params.reset_bridge_nonce;
    let last_observed = last_observed_event_nonce(storage)?;

    let event = if target == 0 || target < last_observed {
        api.debug(&format!(
            "ERROR: refusing to reset the bridge to nonce {target}, last observed is {last_observed}"
        ));
        Event::new("unhalt_rejected")
            .add_attribute("level", "error")
            .add_attribute("target_nonce", target.to_string())
            .add_attribute("last_observed_nonce", last_observed.to_string())
    } else {
        api.debug(&format!("Resetting oracle history to nonce {target}"));
        let config = CONFIG.load(storage)?;
        let affected = rollback_attestations(storage, api, target, &config.valoper_prefix)?;
        Event::new("bridge_unhalt")
            .add_attribute("target_nonce", target.to_string())
            .add_attribute("reset_validators", affected.len().to_string())
    };

    let defaults = Params::default();
    params.reset_bridge_state = defaults.reset_bridge_state;
    params.reset_bridge_nonce = defaults.reset_bridge_nonce;
    Ok(event)
}
