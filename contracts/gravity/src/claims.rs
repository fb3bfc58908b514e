use cosmwasm_std::{Api, BankMsg, Coin, CosmosMsg, Env, Event, Order, StdResult, Storage, Uint128};
use cw_storage_plus::Bound;

use gravity_apis::gravity_api::{BridgeValidator, Claim, Valset};
use gravity_bindings::GravityMsg;

use crate::error::ContractError;
use crate::outgoing::cancel_batch_msg;
use crate::state::attestation::{LastObservedEthHeight, LAST_OBSERVED_ETH_HEIGHT};
use crate::state::outgoing::{
    delete_batch, delete_logic_call, voucher_denom, BATCHES, DENOM_TO_ERC20, ERC20_TO_DENOM,
};
use crate::state::valset::{LAST_OBSERVED_VALSET, VALSETS};

pub(crate) type ClaimEffects = (Vec<CosmosMsg<GravityMsg>>, Vec<Event>);

/// Applies the state transition of a freshly observed claim
pub(crate) fn apply_claim(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
    claim: &Claim,
) -> Result<ClaimEffects, ContractError> {
    match claim {
        Claim::SendToCosmos {
            eth_block_height,
            token_contract,
            amount,
            cosmos_receiver,
            ..
        } => {
            set_last_observed_eth_height(storage, env, *eth_block_height)?;
            Ok(handle_deposit(
                storage,
                api,
                token_contract,
                *amount,
                cosmos_receiver,
            )?)
        }
        Claim::BatchSendToEth {
            eth_block_height,
            batch_nonce,
            token_contract,
            ..
        } => {
            set_last_observed_eth_height(storage, env, *eth_block_height)?;
            handle_batch_executed(storage, api, token_contract, *batch_nonce)
        }
        Claim::Erc20Deployed {
            cosmos_denom,
            token_contract,
            ..
        } => handle_erc20_deployed(storage, api, cosmos_denom, token_contract),
        Claim::LogicCallExecuted {
            invalidation_id,
            invalidation_nonce,
            ..
        } => {
            delete_logic_call(storage, invalidation_id, *invalidation_nonce)?;
            let ev = Event::new("logic_call_executed")
                .add_attribute("invalidation_id", invalidation_id)
                .add_attribute("invalidation_nonce", invalidation_nonce.to_string());
            Ok((vec![], vec![ev]))
        }
        Claim::ValsetUpdated {
            valset_nonce,
            members,
            reward_amount,
            reward_token,
            ..
        } => handle_valset_updated(
            storage,
            env,
            *valset_nonce,
            members,
            *reward_amount,
            reward_token.as_deref(),
        ),
    }
}

fn set_last_observed_eth_height(
    storage: &mut dyn Storage,
    env: &Env,
    eth_block_height: u64,
) -> StdResult<()> {
    LAST_OBSERVED_ETH_HEIGHT.save(
        storage,
        &LastObservedEthHeight {
            cosmos_block_height: env.block.height,
            ethereum_block_height: eth_block_height,
        },
    )
}

fn handle_deposit(
    storage: &mut dyn Storage,
    api: &dyn Api,
    token_contract: &str,
    amount: Uint128,
    cosmos_receiver: &str,
) -> StdResult<ClaimEffects> {
    let receiver = match api.addr_validate(cosmos_receiver) {
        Ok(receiver) => receiver,
        Err(e) => {
            // The event is still observed, the deposit cannot be credited though
            api.debug(&format!(
                "Invalid deposit receiver {cosmos_receiver}: {e}, tokens not credited"
            ));
            let ev = Event::new("deposit_skipped")
                .add_attribute("receiver", cosmos_receiver)
                .add_attribute("token_contract", token_contract)
                .add_attribute("amount", amount.to_string());
            return Ok((vec![], vec![ev]));
        }
    };
    if amount.is_zero() {
        return Ok((vec![], vec![]));
    }

    let (msg, denom): (CosmosMsg<GravityMsg>, String) =
        match ERC20_TO_DENOM.may_load(storage, token_contract)? {
            // Cosmos originated, unlock from the contract's holdings
            Some(denom) => (
                BankMsg::Send {
                    to_address: receiver.to_string(),
                    amount: vec![Coin {
                        denom: denom.clone(),
                        amount,
                    }],
                }
                .into(),
                denom,
            ),
            None => {
                let denom = voucher_denom(token_contract);
                (
                    GravityMsg::MintTokens {
                        amount: Coin {
                            denom: denom.clone(),
                            amount,
                        },
                        recipient: receiver.to_string(),
                    }
                    .into(),
                    denom,
                )
            }
        };
    let ev = Event::new("deposit")
        .add_attribute("receiver", receiver)
        .add_attribute("denom", denom)
        .add_attribute("amount", amount.to_string());
    Ok((vec![msg], vec![ev]))
}

/// Removes the executed batch. Earlier batches of the same token can no longer
/// execute on Ethereum, so they are cancelled
fn handle_batch_executed(
    storage: &mut dyn Storage,
    api: &dyn Api,
    token_contract: &str,
    batch_nonce: u64,
) -> Result<ClaimEffects, ContractError> {
    if !BATCHES.has(storage, (token_contract, batch_nonce)) {
        api.debug(&format!(
            "Executed batch {batch_nonce} for token {token_contract} not found"
        ));
        return Ok((vec![], vec![]));
    }
    delete_batch(storage, token_contract, batch_nonce)?;

    let earlier = BATCHES
        .prefix(token_contract)
        .keys(
            storage,
            None,
            Some(Bound::exclusive(batch_nonce)),
            Order::Ascending,
        )
        .collect::<StdResult<Vec<_>>>()?;
    let mut msgs = vec![];
    for nonce in earlier {
        delete_batch(storage, token_contract, nonce)?;
        msgs.push(cancel_batch_msg(token_contract, nonce));
    }
    let ev = Event::new("batch_executed")
        .add_attribute("token_contract", token_contract)
        .add_attribute("batch_nonce", batch_nonce.to_string())
        .add_attribute("cancelled_earlier", msgs.len().to_string());
    Ok((msgs, vec![ev]))
}

fn handle_erc20_deployed(
    storage: &mut dyn Storage,
    api: &dyn Api,
    cosmos_denom: &str,
    token_contract: &str,
) -> Result<ClaimEffects, ContractError> {
    if let Some(existing) = DENOM_TO_ERC20.may_load(storage, cosmos_denom)? {
        api.debug(&format!(
            "Denom {cosmos_denom} already represented by {existing}, ignoring {token_contract}"
        ));
        return Ok((vec![], vec![]));
    }
    if ERC20_TO_DENOM.has(storage, token_contract) {
        api.debug(&format!(
            "ERC20 {token_contract} already mapped, ignoring deployment for {cosmos_denom}"
        ));
        return Ok((vec![], vec![]));
    }
    ERC20_TO_DENOM.save(storage, token_contract, &cosmos_denom.to_string())?;
    DENOM_TO_ERC20.save(storage, cosmos_denom, &token_contract.to_string())?;
    let ev = Event::new("erc20_deployed")
        .add_attribute("denom", cosmos_denom)
        .add_attribute("token_contract", token_contract);
    Ok((vec![], vec![ev]))
}

fn handle_valset_updated(
    storage: &mut dyn Storage,
    env: &Env,
    valset_nonce: u64,
    members: &[BridgeValidator],
    reward_amount: Uint128,
    reward_token: Option<&str>,
) -> Result<ClaimEffects, ContractError> {
    let height = VALSETS
        .may_load(storage, valset_nonce)?
        .map(|v| v.height)
        .unwrap_or_default();
    LAST_OBSERVED_VALSET.save(
        storage,
        &Valset {
            nonce: valset_nonce,
            members: members.to_vec(),
            height,
            reward_amount,
            reward_token: reward_token.map(str::to_string),
        },
    )?;

    let mut msgs: Vec<CosmosMsg<GravityMsg>> = vec![];
    if let Some(token) = reward_token.filter(|_| !reward_amount.is_zero()) {
        // The relayer was paid on Ethereum out of the bridge's holdings
        match ERC20_TO_DENOM.may_load(storage, token)? {
            // Coins now exist on Ethereum that may come back, back them
            Some(denom) => msgs.push(
                GravityMsg::MintTokens {
                    amount: Coin {
                        denom,
                        amount: reward_amount,
                    },
                    recipient: env.contract.address.to_string(),
                }
                .into(),
            ),
            None => msgs.push(
                GravityMsg::BurnTokens {
                    amount: Coin {
                        denom: voucher_denom(token),
                        amount: reward_amount,
                    },
                }
                .into(),
            ),
        }
    }
    let ev = Event::new("valset_observed")
        .add_attribute("valset_nonce", valset_nonce.to_string())
        .add_attribute("members", members.len().to_string());
    Ok((msgs, vec![ev]))
}
