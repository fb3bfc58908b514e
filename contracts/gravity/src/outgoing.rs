use cosmwasm_std::{Api, CosmosMsg, Env, Event, Storage};

use gravity_apis::gravity_api::{OutgoingLogicCall, OutgoingTxBatch};
use gravity_apis::Validate;
use gravity_bindings::GravityMsg;

use crate::claims::ClaimEffects;
use crate::error::ContractError;
use crate::state::attestation::last_observed_eth_height;
use crate::state::outgoing::{
    all_batches, all_logic_calls, delete_batch, delete_logic_call, BATCHES, LOGIC_CALLS,
};

pub(crate) fn cancel_batch_msg(token_contract: &str, nonce: u64) -> CosmosMsg<GravityMsg> {
    GravityMsg::CancelOutgoingTxBatch {
        token_contract: token_contract.to_string(),
        nonce,
    }
    .into()
}

pub(crate) fn cancel_logic_call_msg(
    invalidation_id: &str,
    invalidation_nonce: u64,
) -> CosmosMsg<GravityMsg> {
    GravityMsg::CancelOutgoingLogicCall {
        invalidation_id: invalidation_id.to_string(),
        invalidation_nonce,
    }
    .into()
}

/// Stores a new outgoing batch, stamped with the current block height
pub(crate) fn submit_batch(
    storage: &mut dyn Storage,
    env: &Env,
    mut batch: OutgoingTxBatch,
) -> Result<Event, ContractError> {
    batch.validate()?;
    let key = (batch.token_contract.as_str(), batch.batch_nonce);
    if BATCHES.has(storage, key) {
        return Err(ContractError::BatchAlreadyExists {
            token_contract: batch.token_contract.clone(),
            nonce: batch.batch_nonce,
        });
    }
    batch.block = env.block.height;
    BATCHES.save(storage, key, &batch)?;
    Ok(Event::new("outgoing_batch")
        .add_attribute("token_contract", &batch.token_contract)
        .add_attribute("batch_nonce", batch.batch_nonce.to_string())
        .add_attribute("batch_timeout", batch.batch_timeout.to_string())
        .add_attribute("txs", batch.transactions.len().to_string()))
}

pub(crate) fn submit_logic_call(
    storage: &mut dyn Storage,
    env: &Env,
    mut call: OutgoingLogicCall,
) -> Result<Event, ContractError> {
    call.validate()?;
    let key = (call.invalidation_id.as_str(), call.invalidation_nonce);
    if LOGIC_CALLS.has(storage, key) {
        return Err(ContractError::LogicCallAlreadyExists {
            invalidation_id: call.invalidation_id.clone(),
            invalidation_nonce: call.invalidation_nonce,
        });
    }
    call.block = env.block.height;
    LOGIC_CALLS.save(storage, key, &call)?;
    Ok(Event::new("outgoing_logic_call")
        .add_attribute("invalidation_id", &call.invalidation_id)
        .add_attribute("invalidation_nonce", call.invalidation_nonce.to_string())
        .add_attribute("timeout", call.timeout.to_string()))
}

/// Cancels every batch whose timeout is below the last observed Ethereum height.
/// Timeouts are unrelated to nonces, so each batch is checked on its own
pub(crate) fn cancel_timed_out_batches(
    storage: &mut dyn Storage,
    api: &dyn Api,
) -> Result<ClaimEffects, ContractError> {
    let eth_height = last_observed_eth_height(storage)?;
    let mut msgs = vec![];
    let mut events = vec![];
    for batch in all_batches(storage)? {
        if batch.batch_timeout >= eth_height {
            continue;
        }
        api.debug(&format!(
            "Cancelling batch {} of {}: timeout {} < eth height {eth_height}",
            batch.batch_nonce, batch.token_contract, batch.batch_timeout
        ));
        delete_batch(storage, &batch.token_contract, batch.batch_nonce)?;
        msgs.push(cancel_batch_msg(&batch.token_contract, batch.batch_nonce));
        events.push(
            Event::new("cancel_outgoing_batch")
                .add_attribute("token_contract", &batch.token_contract)
                .add_attribute("batch_nonce", batch.batch_nonce.to_string())
                .add_attribute("batch_timeout", batch.batch_timeout.to_string()),
        );
    }
    Ok((msgs, events))
}

pub(crate) fn cancel_timed_out_logic_calls(
    storage: &mut dyn Storage,
    api: &dyn Api,
) -> Result<ClaimEffects, ContractError> {
    let eth_height = last_observed_eth_height(storage)?;
    let mut msgs = vec![];
    let mut events = vec![];
    for call in all_logic_calls(storage)? {
        if call.timeout >= eth_height {
            continue;
        }
        api.debug(&format!(
            "Cancelling logic call {}/{}: timeout {} < eth height {eth_height}",
            call.invalidation_id, call.invalidation_nonce, call.timeout
        ));
        delete_logic_call(storage, &call.invalidation_id, call.invalidation_nonce)?;
        msgs.push(cancel_logic_call_msg(
            &call.invalidation_id,
            call.invalidation_nonce,
        ));
        events.push(
            Event::new("cancel_outgoing_logic_call")
                .add_attribute("invalidation_id", &call.invalidation_id)
                .add_attribute("invalidation_nonce", call.invalidation_nonce.to_string())
                .add_attribute("timeout", call.timeout.to_string()),
        );
    }
    Ok((msgs, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::attestation::{LastObservedEthHeight, LAST_OBSERVED_ETH_HEIGHT};
    use crate::test_utils::{eth_address, token_contract};
    use cosmwasm_std::testing::{mock_dependencies, mock_env};
    use cosmwasm_std::{Binary, Uint128};
    use gravity_apis::gravity_api::{Erc20Token, OutgoingTransferTx};
    use gravity_apis::ApiError;

    fn batch(nonce: u64, timeout: u64) -> OutgoingTxBatch {
        let token = |amount| Erc20Token {
            contract: token_contract(),
            amount: Uint128::new(amount),
        };
        OutgoingTxBatch {
            batch_nonce: nonce,
            batch_timeout: timeout,
            transactions: vec![OutgoingTransferTx {
                id: nonce,
                sender: "cosmos1sender".to_string(),
                dest_address: eth_address(9),
                erc20_token: token(100),
                erc20_fee: token(1),
            }],
            token_contract: token_contract(),
            block: 0,
        }
    }

    fn logic_call(nonce: u64, timeout: u64) -> OutgoingLogicCall {
        OutgoingLogicCall {
            transfers: vec![],
            fees: vec![],
            logic_contract_address: eth_address(7),
            payload: Binary::from(b"call".as_slice()),
            timeout,
            invalidation_id: hex::encode([3u8; 32]),
            invalidation_nonce: nonce,
            block: 0,
        }
    }

    fn observe_eth_height(storage: &mut dyn Storage, height: u64) {
        LAST_OBSERVED_ETH_HEIGHT
            .save(
                storage,
                &LastObservedEthHeight {
                    cosmos_block_height: 1,
                    ethereum_block_height: height,
                },
            )
            .unwrap();
    }

    #[test]
    fn batch_past_timeout_is_cancelled() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        submit_batch(&mut deps.storage, &env, batch(1, 100)).unwrap();

        observe_eth_height(&mut deps.storage, 99);
        let (msgs, _) = cancel_timed_out_batches(&mut deps.storage, &deps.api).unwrap();
        assert!(msgs.is_empty());
        assert!(BATCHES.has(&deps.storage, (token_contract().as_str(), 1)));

        observe_eth_height(&mut deps.storage, 101);
        let (msgs, events) = cancel_timed_out_batches(&mut deps.storage, &deps.api).unwrap();
        assert_eq!(msgs, vec![cancel_batch_msg(&token_contract(), 1)]);
        assert_eq!(events[0].ty, "cancel_outgoing_batch");
        assert!(!BATCHES.has(&deps.storage, (token_contract().as_str(), 1)));
    }

    #[test]
    fn timeouts_are_checked_per_batch() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        // Timeouts out of nonce order
        submit_batch(&mut deps.storage, &env, batch(1, 500)).unwrap();
        submit_batch(&mut deps.storage, &env, batch(2, 50)).unwrap();
        submit_batch(&mut deps.storage, &env, batch(3, 400)).unwrap();

        observe_eth_height(&mut deps.storage, 450);
        let (msgs, _) = cancel_timed_out_batches(&mut deps.storage, &deps.api).unwrap();
        assert_eq!(
            msgs,
            vec![
                cancel_batch_msg(&token_contract(), 2),
                cancel_batch_msg(&token_contract(), 3)
            ]
        );
        assert!(BATCHES.has(&deps.storage, (token_contract().as_str(), 1)));
    }

    #[test]
    fn nothing_times_out_before_any_observation() {
        let mut deps = mock_dependencies();
        submit_batch(&mut deps.storage, &mock_env(), batch(1, 0)).unwrap();
        let (msgs, _) = cancel_timed_out_batches(&mut deps.storage, &deps.api).unwrap();
        assert!(msgs.is_empty());
    }

    #[test]
    fn logic_call_past_timeout_is_cancelled() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        submit_logic_call(&mut deps.storage, &env, logic_call(1, 100)).unwrap();
        submit_logic_call(&mut deps.storage, &env, logic_call(2, 200)).unwrap();

        observe_eth_height(&mut deps.storage, 101);
        let (msgs, _) = cancel_timed_out_logic_calls(&mut deps.storage, &deps.api).unwrap();
        assert_eq!(msgs, vec![cancel_logic_call_msg(&hex::encode([3u8; 32]), 1)]);
        assert_eq!(all_logic_calls(&deps.storage).unwrap().len(), 1);
    }

    #[test]
    fn submission_stamps_height_and_rejects_duplicates() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        submit_batch(&mut deps.storage, &env, batch(1, 100)).unwrap();
        let stored = BATCHES
            .load(&deps.storage, (token_contract().as_str(), 1))
            .unwrap();
        assert_eq!(stored.block, env.block.height);

        let err = submit_batch(&mut deps.storage, &env, batch(1, 100)).unwrap_err();
        assert!(matches!(err, ContractError::BatchAlreadyExists { nonce: 1, .. }));

        let mut empty = batch(2, 100);
        empty.transactions.clear();
        let err = submit_batch(&mut deps.storage, &env, empty).unwrap_err();
        assert_eq!(err, ContractError::Api(ApiError::EmptyBatch(2)));

        submit_logic_call(&mut deps.storage, &env, logic_call(1, 100)).unwrap();
        let err = submit_logic_call(&mut deps.storage, &env, logic_call(1, 100)).unwrap_err();
        assert!(matches!(
            err,
            ContractError::LogicCallAlreadyExists {
                invalidation_nonce: 1,
                ..
            }
        ));
    }
}
