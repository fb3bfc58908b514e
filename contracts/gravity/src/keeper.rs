//! Capabilities of the hosting chain the bridge depends on.
//! `ChainKeeper` serves reads through the custom querier and turns writes into
//! `GravityMsg`s, which the chain executes once the end block call returns.
use std::collections::BTreeSet;

use cosmwasm_std::{Decimal, QuerierWrapper, StdResult, Timestamp};

use gravity_bindings::{GravityMsg, GravityQuerier, GravityQuery, ValidatorInfo};

pub trait StakingKeeper {
    /// Bonded, non jailed validators ordered by descending power
    fn bonded_validators_by_power(&self) -> StdResult<Vec<ValidatorInfo>>;
    fn validator(&self, operator: &str) -> StdResult<Option<ValidatorInfo>>;
    /// Validators in the unbonding queue maturing at or before `end_time` and `end_height`
    fn unbonding_validators(
        &self,
        end_time: Timestamp,
        end_height: u64,
    ) -> StdResult<Vec<ValidatorInfo>>;
    /// Unbonding time in seconds
    fn unbonding_time(&self) -> StdResult<u64>;
    fn slash(
        &mut self,
        cons_address: &str,
        infraction_height: u64,
        power: u64,
        fraction: Decimal,
    ) -> StdResult<()>;
    fn jail(&mut self, cons_address: &str) -> StdResult<()>;
}

pub trait SigningInfoKeeper {
    /// Height the validator joined the active set at, if it has signing info
    fn start_height(&self, cons_address: &str) -> StdResult<Option<u64>>;
}

pub trait Keepers: StakingKeeper + SigningInfoKeeper {}

impl<T: StakingKeeper + SigningInfoKeeper> Keepers for T {}

pub fn total_bonded_power(staking: &dyn StakingKeeper) -> StdResult<u128> {
    Ok(staking
        .bonded_validators_by_power()?
        .iter()
        .map(|v| v.power as u128)
        .sum())
}

pub struct ChainKeeper<'a> {
    querier: GravityQuerier<'a>,
    /// Consensus addresses jailed during this call
    jailed: BTreeSet<String>,
    msgs: Vec<GravityMsg>,
}

impl<'a> ChainKeeper<'a> {
    pub fn new(querier: QuerierWrapper<'a, GravityQuery>) -> Self {
        Self {
            querier: GravityQuerier::new(querier),
            jailed: BTreeSet::new(),
            msgs: vec![],
        }
    }

    pub fn into_msgs(self) -> Vec<GravityMsg> {
        self.msgs
    }

    fn overlay(&self, mut validator: ValidatorInfo) -> ValidatorInfo {
        if self.jailed.contains(&validator.cons_address) {
            validator.jailed = true;
        }
        validator
    }
}

impl StakingKeeper for ChainKeeper<'_> {
    fn bonded_validators_by_power(&self) -> StdResult<Vec<ValidatorInfo>> {
        Ok(self
            .querier
            .bonded_validators_by_power()?
            .into_iter()
            .filter(|v| !self.jailed.contains(&v.cons_address))
            .collect())
    }

    fn validator(&self, operator: &str) -> StdResult<Option<ValidatorInfo>> {
        Ok(self.querier.validator(operator)?.map(|v| self.overlay(v)))
    }

    fn unbonding_validators(
        &self,
        end_time: Timestamp,
        end_height: u64,
    ) -> StdResult<Vec<ValidatorInfo>> {
        Ok(self
            .querier
            .unbonding_validators(end_time, end_height)?
            .into_iter()
            .map(|v| self.overlay(v))
            .collect())
    }

    fn unbonding_time(&self) -> StdResult<u64> {
        self.querier.unbonding_time()
    }

    fn slash(
        &mut self,
        cons_address: &str,
        infraction_height: u64,
        power: u64,
        fraction: Decimal,
    ) -> StdResult<()> {
        self.msgs.push(GravityMsg::Slash {
            cons_address: cons_address.to_string(),
            infraction_height,
            power,
            slash_fraction: fraction,
        });
        Ok(())
    }

    fn jail(&mut self, cons_address: &str) -> StdResult<()> {
        if self.jailed.insert(cons_address.to_string()) {
            self.msgs.push(GravityMsg::Jail {
                cons_address: cons_address.to_string(),
            });
        }
        Ok(())
    }
}

impl SigningInfoKeeper for ChainKeeper<'_> {
    fn start_height(&self, cons_address: &str) -> StdResult<Option<u64>> {
        self.querier.start_height(cons_address)
    }
}
