use anyhow::{bail, Result as AnyResult};
use serde::de::DeserializeOwned;
use std::cmp::max;
use std::fmt::Debug;
use std::ops::{Deref, DerefMut};
use thiserror::Error;

use cosmwasm_std::testing::{MockApi, MockStorage};
use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{
    to_json_binary, Addr, Api, BankMsg, Binary, BlockInfo, CustomMsg, CustomQuery, Decimal, Empty, Event,
    Querier, QuerierResult, StdError, StdResult, Storage, Timestamp, Uint128,
};
use cw_multi_test::{
    App, AppResponse, BankKeeper, BankSudo, BasicAppBuilder, CosmosRouter, Module, WasmKeeper,
};
use cw_storage_plus::{Item, Map};

use gravity_bindings::query::{
    SigningInfoResponse, StakingParamsResponse, ValidatorResponse, ValidatorsResponse,
};
use gravity_bindings::{BondStatus, GravityMsg, GravityQuery, ValidatorInfo};

/// GravityModule simulates the staking, slashing and bank side of the host chain
pub struct GravityModule {}

/// How many seconds per block
/// (when we increment block.height, use this multiplier for block.time)
pub const BLOCK_TIME: u64 = 5;

/// Default unbonding time, three weeks
pub const UNBONDING_TIME: u64 = 21 * 24 * 60 * 60;

const VALIDATORS: Map<&str, ValidatorInfo> = Map::new("validators");
const START_HEIGHTS: Map<&str, u64> = Map::new("start_heights");
/// Unbonding queue: operator -> (completion time in seconds, completion height)
const UNBONDING_QUEUE: Map<&str, (u64, u64)> = Map::new("unbonding_queue");
/// Slashes applied, in order: (cons address, infraction height)
const SLASHES: Item<Vec<(String, u64)>> = Item::new("slashes");

impl GravityModule {
    pub fn add_validator(
        &self,
        storage: &mut dyn Storage,
        validator: &ValidatorInfo,
        start_height: u64,
    ) -> StdResult<()> {
        VALIDATORS.save(storage, &validator.operator, validator)?;
        START_HEIGHTS.save(storage, &validator.cons_address, &start_height)
    }

    pub fn validator(&self, storage: &dyn Storage, operator: &str) -> StdResult<ValidatorInfo> {
        VALIDATORS.load(storage, operator)
    }

    pub fn slashes(&self, storage: &dyn Storage) -> StdResult<Vec<(String, u64)>> {
        Ok(SLASHES.may_load(storage)?.unwrap_or_default())
    }

    /// Moves the validator out of the bonded set, as undelegating its whole stake would
    pub fn begin_unbonding(
        &self,
        storage: &mut dyn Storage,
        block: &BlockInfo,
        operator: &str,
    ) -> StdResult<()> {
        let mut validator = VALIDATORS.load(storage, operator)?;
        validator.status = BondStatus::Unbonding;
        validator.unbonding_height = block.height;
        VALIDATORS.save(storage, operator, &validator)?;
        UNBONDING_QUEUE.save(
            storage,
            operator,
            &(
                block.time.plus_seconds(UNBONDING_TIME).seconds(),
                block.height,
            ),
        )
    }

    fn by_cons_address(&self, storage: &dyn Storage, cons_address: &str) -> AnyResult<ValidatorInfo> {
        match self
            .all_validators(storage)?
            .into_iter()
            .find(|v| v.cons_address == cons_address)
        {
            Some(v) => Ok(v),
            None => bail!("unknown consensus address {}", cons_address),
        }
    }

    fn all_validators(&self, storage: &dyn Storage) -> StdResult<Vec<ValidatorInfo>> {
        VALIDATORS
            .range(storage, None, None, Ascending)
            .map(|item| item.map(|(_, v)| v))
            .collect()
    }
}

impl Module for GravityModule {
    type ExecT = GravityMsg;
    type QueryT = GravityQuery;
    type SudoT = Empty;

    fn execute<ExecC, QueryC>(
        &self,
        api: &dyn Api,
        storage: &mut dyn Storage,
        router: &dyn CosmosRouter<ExecC = ExecC, QueryC = QueryC>,
        block: &BlockInfo,
        sender: Addr,
        msg: GravityMsg,
    ) -> AnyResult<AppResponse>
    where
        ExecC: CustomMsg + DeserializeOwned + 'static,
        QueryC: CustomQuery + DeserializeOwned + 'static,
    {
        match msg {
            GravityMsg::Slash {
                cons_address,
                infraction_height,
                slash_fraction,
                ..
            } => {
                let mut validator = self.by_cons_address(storage, &cons_address)?;
                let slashed = Decimal::from_ratio(validator.power, 1u128)
                    .checked_mul(slash_fraction)?
                    .to_uint_floor();
                validator.power = validator
                    .power
                    .saturating_sub(u64::try_from(slashed.u128())?);
                VALIDATORS.save(storage, &validator.operator, &validator)?;
                let mut slashes = SLASHES.may_load(storage)?.unwrap_or_default();
                slashes.push((cons_address.clone(), infraction_height));
                SLASHES.save(storage, &slashes)?;
                Ok(AppResponse {
                    events: vec![Event::new("slash")
                        .add_attribute("cons_address", cons_address)
                        .add_attribute("infraction_height", infraction_height.to_string())],
                    ..Default::default()
                })
            }
            GravityMsg::Jail { cons_address } => {
                let mut validator = self.by_cons_address(storage, &cons_address)?;
                validator.jailed = true;
                VALIDATORS.save(storage, &validator.operator, &validator)?;
                if validator.is_bonded() {
                    self.begin_unbonding(storage, block, &validator.operator)?;
                }
                Ok(AppResponse {
                    events: vec![Event::new("jail").add_attribute("cons_address", cons_address)],
                    ..Default::default()
                })
            }
            GravityMsg::MintTokens { amount, recipient } => {
                let recipient = api.addr_validate(&recipient)?;
                router.sudo(
                    api,
                    storage,
                    block,
                    BankSudo::Mint {
                        to_address: recipient.to_string(),
                        amount: vec![amount],
                    }
                    .into(),
                )
            }
            GravityMsg::BurnTokens { amount } => router.execute(
                api,
                storage,
                block,
                sender,
                BankMsg::Burn {
                    amount: vec![amount],
                }
                .into(),
            ),
            GravityMsg::CancelOutgoingTxBatch { .. }
            | GravityMsg::CancelOutgoingLogicCall { .. } => {
                // The outgoing pool lives on the chain side, nothing to refund here
                Ok(AppResponse::default())
            }
        }
    }

    fn query(
        &self,
        _api: &dyn Api,
        storage: &dyn Storage,
        _querier: &dyn Querier,
        _block: &BlockInfo,
        request: GravityQuery,
    ) -> anyhow::Result<Binary> {
        let res = match request {
            GravityQuery::BondedValidatorsByPower {} => {
                let mut validators: Vec<_> = self
                    .all_validators(storage)?
                    .into_iter()
                    .filter(|v| v.is_bonded() && !v.jailed)
                    .collect();
                validators.sort_by(|a, b| b.power.cmp(&a.power));
                to_json_binary(&ValidatorsResponse { validators })?
            }
            GravityQuery::Validator { operator } => to_json_binary(&ValidatorResponse {
                validator: VALIDATORS.may_load(storage, &operator)?,
            })?,
            GravityQuery::UnbondingValidators {
                end_time,
                end_height,
            } => {
                let mut validators = vec![];
                for item in UNBONDING_QUEUE.range(storage, None, None, Ascending) {
                    let (operator, (time, height)) = item?;
                    if time <= end_time.seconds() && height <= end_height {
                        validators.push(VALIDATORS.load(storage, &operator)?);
                    }
                }
                to_json_binary(&ValidatorsResponse { validators })?
            }
            GravityQuery::SigningInfo { cons_address } => to_json_binary(&SigningInfoResponse {
                start_height: START_HEIGHTS.may_load(storage, &cons_address)?,
            })?,
            GravityQuery::StakingParams {} => to_json_binary(&StakingParamsResponse {
                unbonding_time: UNBONDING_TIME,
            })?,
        };
        Ok(res)
    }

    fn sudo<ExecC, QueryC>(
        &self,
        _api: &dyn Api,
        _storage: &mut dyn Storage,
        _router: &dyn CosmosRouter<ExecC = ExecC, QueryC = QueryC>,
        _block: &BlockInfo,
        _msg: Self::SudoT,
    ) -> AnyResult<AppResponse>
    where
        ExecC: CustomMsg + DeserializeOwned + 'static,
        QueryC: CustomQuery + DeserializeOwned + 'static,
    {
        bail!("sudo not implemented for GravityModule")
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum GravityError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

pub type GravityAppWrapped =
    App<BankKeeper, MockApi, MockStorage, GravityModule, WasmKeeper<GravityMsg, GravityQuery>>;

pub struct GravityApp(GravityAppWrapped);

impl Deref for GravityApp {
    type Target = GravityAppWrapped;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for GravityApp {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Querier for GravityApp {
    fn raw_query(&self, bin_request: &[u8]) -> QuerierResult {
        self.0.raw_query(bin_request)
    }
}

impl GravityApp {
    pub fn new() -> Self {
        Self(
            BasicAppBuilder::<GravityMsg, GravityQuery>::new_custom()
                .with_custom(GravityModule {})
                .build(|_, _, _| {}),
        )
    }

    pub fn new_at_height(height: u64) -> Self {
        let block_info = BlockInfo {
            height,
            time: Timestamp::from_seconds(1714119228 + height * BLOCK_TIME),
            chain_id: "gravity-bridge-3".to_owned(),
        };

        Self(
            BasicAppBuilder::<GravityMsg, GravityQuery>::new_custom()
                .with_custom(GravityModule {})
                .with_block(block_info)
                .build(|_, _, _| {}),
        )
    }

    pub fn block_info(&self) -> BlockInfo {
        self.0.block_info()
    }

    /// Registers a bonded validator, active since the current block
    pub fn add_validator(&mut self, validator: ValidatorInfo) -> AnyResult<()> {
        let height = self.block_info().height;
        self.init_modules(|router, _, storage| {
            router.custom.add_validator(storage, &validator, height)
        })?;
        Ok(())
    }

    pub fn begin_unbonding(&mut self, operator: &str) -> AnyResult<()> {
        let block = self.block_info();
        self.init_modules(|router, _, storage| {
            router.custom.begin_unbonding(storage, &block, operator)
        })?;
        Ok(())
    }

    pub fn validator(&self, operator: &str) -> AnyResult<ValidatorInfo> {
        Ok(self.read_module(|router, _, storage| router.custom.validator(storage, operator))?)
    }

    pub fn slashes(&self) -> AnyResult<Vec<(String, u64)>> {
        Ok(self.read_module(|router, _, storage| router.custom.slashes(storage))?)
    }

    pub fn balance(&self, addr: &Addr, denom: &str) -> AnyResult<Uint128> {
        Ok(self.wrap().query_balance(addr, denom)?.amount)
    }

    /// This advances BlockInfo by given number of blocks.
    /// It does not do any callbacks, but keeps the ratio of seconds/block
    pub fn advance_blocks(&mut self, blocks: u64) {
        self.update_block(|block| {
            block.time = block.time.plus_seconds(BLOCK_TIME * blocks);
            block.height += blocks;
        });
    }

    /// This advances BlockInfo by given number of seconds.
    /// It does not do any callbacks, but keeps the ratio of seconds/block
    pub fn advance_seconds(&mut self, seconds: u64) {
        self.update_block(|block| {
            block.time = block.time.plus_seconds(seconds);
            block.height += max(1, seconds / BLOCK_TIME);
        });
    }
}

impl Default for GravityApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::coin;
    use cw_multi_test::Executor;

    fn validator(n: u8, power: u64) -> ValidatorInfo {
        ValidatorInfo {
            operator: format!("valoper{n}"),
            account: format!("account{n}"),
            cons_address: format!("valcons{n}"),
            power,
            status: BondStatus::Bonded,
            jailed: false,
            unbonding_height: 0,
        }
    }

    #[test]
    fn mint_tokens_credits_recipient() {
        let mut app = GravityApp::new();
        let sender = app.api().addr_make("gravity");
        let rcpt = app.api().addr_make("townies");

        let mintable = coin(123456, "gravity0x0000000000000000000000000000000000000001");
        let msg = GravityMsg::MintTokens {
            amount: mintable.clone(),
            recipient: rcpt.to_string(),
        };
        app.execute(sender, msg.into()).unwrap();

        assert_eq!(app.balance(&rcpt, &mintable.denom).unwrap(), mintable.amount);
    }

    #[test]
    fn slash_and_jail_update_validator() {
        let mut app = GravityApp::new();
        app.add_validator(validator(1, 1000)).unwrap();
        let sender = app.api().addr_make("gravity");

        app.execute(
            sender.clone(),
            GravityMsg::Slash {
                cons_address: "valcons1".to_string(),
                infraction_height: 10,
                power: 1000,
                slash_fraction: Decimal::percent(10),
            }
            .into(),
        )
        .unwrap();
        app.execute(
            sender,
            GravityMsg::Jail {
                cons_address: "valcons1".to_string(),
            }
            .into(),
        )
        .unwrap();

        let val = app.validator("valoper1").unwrap();
        assert_eq!(val.power, 900);
        assert!(val.jailed);
        assert_eq!(val.status, BondStatus::Unbonding);
        assert_eq!(app.slashes().unwrap(), vec![("valcons1".to_string(), 10)]);
    }
}
