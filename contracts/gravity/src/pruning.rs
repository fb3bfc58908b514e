use std::collections::BTreeSet;

use cosmwasm_std::{Api, Event, Order, StdResult, Storage};
use cw_storage_plus::PrefixBound;

use gravity_apis::new_canonical_addr;

use crate::error::ContractError;
use crate::state::attestation::{
    last_event_nonce_by_validator, last_observed_event_nonce, ATTESTATIONS,
    LAST_EVENT_NONCE_BY_VALIDATOR,
};

/// Keys of all attestations within the given nonce bounds
fn attestation_keys(
    storage: &dyn Storage,
    min: Option<PrefixBound<u64>>,
    max: Option<PrefixBound<u64>>,
) -> StdResult<Vec<(u64, Vec<u8>)>> {
    ATTESTATIONS
        .prefix_range(storage, min, max, Order::Ascending)
        .map(|item| item.map(|(key, _)| key))
        .collect()
}

/// Deletes attestations lying `retention` nonces or more behind the last observed one.
/// They are only kept for clients to inspect recent oracle history
pub(crate) fn prune_attestations(
    storage: &mut dyn Storage,
    retention: u64,
) -> StdResult<Option<Event>> {
    let last_observed = last_observed_event_nonce(storage)?;
    if last_observed <= retention {
        return Ok(None);
    }
    let cutoff = last_observed - retention;

    let keys = attestation_keys(storage, None, Some(PrefixBound::inclusive(cutoff)))?;
    if keys.is_empty() {
        return Ok(None);
    }
    for (nonce, hash) in &keys {
        ATTESTATIONS.remove(storage, (*nonce, hash.as_slice()));
    }
    Ok(Some(
        Event::new("attestation_pruned")
            .add_attribute("count", keys.len().to_string())
            .add_attribute("cutoff", cutoff.to_string()),
    ))
}

/// Deletes every attestation above `target` and winds back the last event nonce of the
/// validators that voted on them, so they can submit those events again.
/// Returns the affected validators.
/// Callers must make sure `target` is not below the last observed nonce
pub(crate) fn rollback_attestations(
    storage: &mut dyn Storage,
    api: &dyn Api,
    target: u64,
    valoper_prefix: &str,
) -> Result<BTreeSet<String>, ContractError> {
    let mut affected = BTreeSet::new();
    let atts = ATTESTATIONS
        .prefix_range(
            storage,
            Some(PrefixBound::exclusive(target)),
            None,
            Order::Ascending,
        )
        .collect::<StdResult<Vec<_>>>()?;
    for ((nonce, hash), att) in atts {
        api.debug(&format!(
            "Deleting attestation {} created at height {}",
            nonce, att.height
        ));
        affected.extend(att.votes);
        ATTESTATIONS.remove(storage, (nonce, hash.as_slice()));
    }

    for validator in &affected {
        // Votes are recorded from validated operator addresses, anything else is corruption
        new_canonical_addr(validator, valoper_prefix).map_err(|e| {
            ContractError::InvalidValidatorAddress {
                address: validator.clone(),
                reason: e.to_string(),
            }
        })?;
        let last = last_event_nonce_by_validator(storage, validator)?;
        if last > target {
            api.debug(&format!(
                "Resetting last event nonce of {validator} from {last} to {target}"
            ));
            LAST_EVENT_NONCE_BY_VALIDATOR.save(storage, validator, &target)?;
        }
    }
    Ok(affected)
}
