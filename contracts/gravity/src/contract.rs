#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, to_json_binary, Deps, DepsMut, Empty, Env, MessageInfo, QueryResponse, Response,
    StdResult,
};
use cw2::set_contract_version;
use cw_utils::{maybe_addr, nonpayable};

use gravity_bindings::{GravityMsg, GravityQuery};

use crate::abci::end_blocker;
use crate::error::ContractError;
use crate::keeper::ChainKeeper;
use crate::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, SudoMsg};
use crate::state::attestation::last_observed_event_nonce;
use crate::state::config::{Config, Params, ADMIN, CONFIG, PARAMS};
use crate::state::valset::LAST_UNBONDING_HEIGHT;
use crate::{attestation, orchestrator, outgoing, queries};

pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    mut deps: DepsMut<GravityQuery>,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<GravityMsg>, ContractError> {
    nonpayable(&info)?;
    if msg.gravity_id.is_empty() {
        return Err(ContractError::InvalidParams(
            "gravity_id must not be empty".to_string(),
        ));
    }
    if msg.valoper_prefix.is_empty() {
        return Err(ContractError::InvalidParams(
            "valoper_prefix must not be empty".to_string(),
        ));
    }

    let api = deps.api;
    let config = Config {
        gravity_id: msg.gravity_id,
        valoper_prefix: msg.valoper_prefix,
        batch_creator: maybe_addr(api, msg.batch_creator)?,
    };
    CONFIG.save(deps.storage, &config)?;

    ADMIN.set(deps.branch(), maybe_addr(api, msg.admin)?)?;

    let params = msg.params.unwrap_or_default();
    params.validate()?;
    PARAMS.save(deps.storage, &params)?;

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("gravity_id", config.gravity_id))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(
    deps: Deps<GravityQuery>,
    env: Env,
    msg: QueryMsg,
) -> Result<QueryResponse, ContractError> {
    match msg {
        QueryMsg::Config {} => Ok(to_json_binary(&queries::config(deps)?)?),
        QueryMsg::Params {} => Ok(to_json_binary(&queries::params(deps)?)?),
        QueryMsg::Admin {} => to_json_binary(&ADMIN.query_admin(deps)?).map_err(Into::into),
        QueryMsg::CurrentValset {} => {
            Ok(to_json_binary(&queries::current_valset(deps, &env)?)?)
        }
        QueryMsg::Valset { nonce } => Ok(to_json_binary(&queries::valset(deps, nonce)?)?),
        QueryMsg::LatestValsetNonce {} => {
            Ok(to_json_binary(&queries::latest_valset_nonce(deps)?)?)
        }
        QueryMsg::LastObservedValset {} => {
            Ok(to_json_binary(&queries::last_observed_valset(deps)?)?)
        }
        QueryMsg::Valsets {
            start_after,
            limit,
            reverse,
        } => Ok(to_json_binary(&queries::valsets(
            deps,
            start_after,
            limit,
            reverse,
        )?)?),
        QueryMsg::ValsetConfirms { nonce } => {
            Ok(to_json_binary(&queries::valset_confirms(deps, nonce)?)?)
        }
        QueryMsg::LastPendingValsets { orchestrator } => Ok(to_json_binary(
            &queries::last_pending_valsets(deps, orchestrator)?,
        )?),
        QueryMsg::LastObservedEventNonce {} => {
            Ok(to_json_binary(&last_observed_event_nonce(deps.storage)?)?)
        }
        QueryMsg::LastObservedEthHeight {} => {
            Ok(to_json_binary(&queries::last_observed_eth_height(deps)?)?)
        }
        QueryMsg::LastEventNonceByValidator { validator } => Ok(to_json_binary(
            &queries::last_event_nonce_by_validator(deps, validator)?,
        )?),
        QueryMsg::Attestations { start_after, limit } => Ok(to_json_binary(
            &queries::attestations(deps, start_after, limit)?,
        )?),
        QueryMsg::Attestation { nonce, claim_hash } => Ok(to_json_binary(
            &queries::attestation(deps, nonce, claim_hash)?,
        )?),
        QueryMsg::OutgoingTxBatches { limit } => {
            Ok(to_json_binary(&queries::outgoing_tx_batches(deps, limit)?)?)
        }
        QueryMsg::OutgoingTxBatch {
            token_contract,
            nonce,
        } => Ok(to_json_binary(&queries::outgoing_tx_batch(
            deps,
            token_contract,
            nonce,
        )?)?),
        QueryMsg::BatchConfirms {
            token_contract,
            nonce,
        } => Ok(to_json_binary(&queries::batch_confirms(
            deps,
            token_contract,
            nonce,
        )?)?),
        QueryMsg::LastPendingBatch { orchestrator } => Ok(to_json_binary(
            &queries::last_pending_batch(deps, orchestrator)?,
        )?),
        QueryMsg::OutgoingLogicCalls { limit } => {
            Ok(to_json_binary(&queries::outgoing_logic_calls(deps, limit)?)?)
        }
        QueryMsg::OutgoingLogicCall {
            invalidation_id,
            invalidation_nonce,
        } => Ok(to_json_binary(&queries::outgoing_logic_call(
            deps,
            invalidation_id,
            invalidation_nonce,
        )?)?),
        QueryMsg::LogicCallConfirms {
            invalidation_id,
            invalidation_nonce,
        } => Ok(to_json_binary(&queries::logic_call_confirms(
            deps,
            invalidation_id,
            invalidation_nonce,
        )?)?),
        QueryMsg::LastPendingLogicCall { orchestrator } => Ok(to_json_binary(
            &queries::last_pending_logic_call(deps, orchestrator)?,
        )?),
        QueryMsg::OrchestratorValidator { orchestrator } => Ok(to_json_binary(
            &queries::orchestrator_validator(deps, orchestrator)?,
        )?),
        QueryMsg::EthAddressByValidator { validator } => Ok(to_json_binary(
            &queries::eth_address_by_validator(deps, validator)?,
        )?),
        QueryMsg::Erc20ToDenom { erc20 } => {
            Ok(to_json_binary(&queries::erc20_to_denom(deps, erc20)?)?)
        }
        QueryMsg::DenomToErc20 { denom } => {
            Ok(to_json_binary(&queries::denom_to_erc20(deps, denom)?)?)
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(
    _deps: DepsMut<GravityQuery>,
    _env: Env,
    _msg: Empty,
) -> StdResult<Response<GravityMsg>> {
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut<GravityQuery>,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response<GravityMsg>, ContractError> {
    let api = deps.api;
    match msg {
        ExecuteMsg::UpdateAdmin { admin } => ADMIN
            .execute_update_admin(deps, info, maybe_addr(api, admin)?)
            .map_err(Into::into),
        ExecuteMsg::UpdateParams { params } => {
            ADMIN.assert_admin(deps.as_ref(), &info.sender)?;
            handle_update_params(deps, params)
        }
        ExecuteMsg::SetOrchestratorAddress {
            validator,
            orchestrator,
            eth_address,
        } => {
            nonpayable(&info)?;
            let orchestrator_addr = api.addr_validate(&orchestrator)?;
            let is_admin = ADMIN.is_admin(deps.as_ref(), &info.sender)?;
            let keeper = ChainKeeper::new(deps.querier);
            let event = orchestrator::set_orchestrator_address(
                deps.storage,
                &keeper,
                &info.sender,
                is_admin,
                &validator,
                &orchestrator_addr,
                &eth_address,
            )?;
            Ok(Response::new()
                .add_attribute("action", "set_orchestrator_address")
                .add_event(event))
        }
        ExecuteMsg::SubmitClaim { claim } => {
            nonpayable(&info)?;
            let keeper = ChainKeeper::new(deps.querier);
            let event =
                attestation::submit_claim(deps.storage, &keeper, &env, &info.sender, claim)?;
            Ok(Response::new()
                .add_attribute("action", "submit_claim")
                .add_event(event))
        }
        ExecuteMsg::ConfirmValset {
            nonce,
            eth_address,
            signature,
        } => {
            let event = orchestrator::confirm_valset(
                deps.storage,
                &info.sender,
                nonce,
                eth_address,
                signature,
            )?;
            Ok(Response::new()
                .add_attribute("action", "confirm_valset")
                .add_event(event))
        }
        ExecuteMsg::ConfirmBatch {
            token_contract,
            nonce,
            eth_signer,
            signature,
        } => {
            let event = orchestrator::confirm_batch(
                deps.storage,
                &info.sender,
                token_contract,
                nonce,
                eth_signer,
                signature,
            )?;
            Ok(Response::new()
                .add_attribute("action", "confirm_batch")
                .add_event(event))
        }
        ExecuteMsg::ConfirmLogicCall {
            invalidation_id,
            invalidation_nonce,
            eth_signer,
            signature,
        } => {
            let event = orchestrator::confirm_logic_call(
                deps.storage,
                &info.sender,
                invalidation_id,
                invalidation_nonce,
                eth_signer,
                signature,
            )?;
            Ok(Response::new()
                .add_attribute("action", "confirm_logic_call")
                .add_event(event))
        }
        ExecuteMsg::SubmitBatch { batch } => {
            assert_batch_creator(deps.as_ref(), &info)?;
            let event = outgoing::submit_batch(deps.storage, &env, batch)?;
            Ok(Response::new()
                .add_attribute("action", "submit_batch")
                .add_event(event))
        }
        ExecuteMsg::SubmitLogicCall { call } => {
            assert_batch_creator(deps.as_ref(), &info)?;
            let event = outgoing::submit_logic_call(deps.storage, &env, call)?;
            Ok(Response::new()
                .add_attribute("action", "submit_logic_call")
                .add_event(event))
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(
    deps: DepsMut<GravityQuery>,
    env: Env,
    msg: SudoMsg,
) -> Result<Response<GravityMsg>, ContractError> {
    match msg {
        SudoMsg::EndBlock {} => handle_end_block(deps, env),
        SudoMsg::AfterValidatorBeginUnbonding {} => {
            LAST_UNBONDING_HEIGHT.save(deps.storage, &env.block.height)?;
            Ok(Response::new().add_attributes(vec![
                attr("action", "after_validator_begin_unbonding"),
                attr("height", env.block.height.to_string()),
            ]))
        }
        SudoMsg::UpdateParams { params } => handle_update_params(deps, params),
    }
}

fn handle_update_params(
    deps: DepsMut<GravityQuery>,
    params: Params,
) -> Result<Response<GravityMsg>, ContractError> {
    params.validate()?;
    PARAMS.save(deps.storage, &params)?;
    Ok(Response::new().add_attribute("action", "update_params"))
}

fn assert_batch_creator(
    deps: Deps<GravityQuery>,
    info: &MessageInfo,
) -> Result<(), ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    if cfg.batch_creator.as_ref() == Some(&info.sender) || ADMIN.is_admin(deps, &info.sender)? {
        Ok(())
    } else {
        Err(ContractError::Unauthorized)
    }
}

fn handle_end_block(
    deps: DepsMut<GravityQuery>,
    env: Env,
) -> Result<Response<GravityMsg>, ContractError> {
    let DepsMut {
        storage,
        api,
        querier,
    } = deps;
    let mut keeper = ChainKeeper::new(querier);
    let res = end_blocker(storage, api, &env, &mut keeper).map_err(|err| {
        if err.is_integrity_fault() {
            api.debug(&format!(
                "Integrity fault at height {}: {err}",
                env.block.height
            ));
        }
        err
    })?;

    // Penalties first, then the effects of observed claims and timeouts
    Ok(Response::new()
        .add_messages(keeper.into_msgs())
        .add_submessages(res.messages)
        .add_events(res.events)
        .add_attributes(res.attributes))
}
