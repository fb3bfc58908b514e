mod multitest;

use std::collections::HashMap;
use std::marker::PhantomData;

use cosmwasm_std::{
    testing::{MockApi, MockQuerier, MockStorage},
    to_json_binary, ContractResult, OwnedDeps, StdResult, SystemResult,
};
use gravity_bindings::query::{
    SigningInfoResponse, StakingParamsResponse, ValidatorResponse, ValidatorsResponse,
};
use gravity_bindings::{GravityQuery, ValidatorInfo};
pub use multitest::{GravityApp, GravityAppWrapped, GravityError, GravityModule, BLOCK_TIME};

pub type GravityDeps = OwnedDeps<MockStorage, MockApi, MockQuerier<GravityQuery>, GravityQuery>;

/// StakingFixture is the staking / slashing state served by `mock_dependencies_with`
#[derive(Clone, Debug, Default)]
pub struct StakingFixture {
    pub validators: Vec<ValidatorInfo>,
    /// signing info start heights, by consensus address
    pub start_heights: HashMap<String, u64>,
    pub unbonding_time: u64,
}

impl StakingFixture {
    fn answer(&self, query: &GravityQuery) -> StdResult<cosmwasm_std::Binary> {
        match query {
            GravityQuery::BondedValidatorsByPower {} => {
                let mut validators: Vec<_> = self
                    .validators
                    .iter()
                    .filter(|v| v.is_bonded() && !v.jailed)
                    .cloned()
                    .collect();
                validators.sort_by(|a, b| b.power.cmp(&a.power));
                to_json_binary(&ValidatorsResponse { validators })
            }
            GravityQuery::Validator { operator } => to_json_binary(&ValidatorResponse {
                validator: self
                    .validators
                    .iter()
                    .find(|v| &v.operator == operator)
                    .cloned(),
            }),
            GravityQuery::UnbondingValidators { .. } => to_json_binary(&ValidatorsResponse {
                validators: self
                    .validators
                    .iter()
                    .filter(|v| v.is_unbonding())
                    .cloned()
                    .collect(),
            }),
            GravityQuery::SigningInfo { cons_address } => to_json_binary(&SigningInfoResponse {
                start_height: self.start_heights.get(cons_address).copied(),
            }),
            GravityQuery::StakingParams {} => to_json_binary(&StakingParamsResponse {
                unbonding_time: self.unbonding_time,
            }),
        }
    }
}

pub fn mock_dependencies() -> GravityDeps {
    mock_dependencies_with(StakingFixture::default())
}

pub fn mock_dependencies_with(fixture: StakingFixture) -> GravityDeps {
    let custom_querier: MockQuerier<GravityQuery> =
        MockQuerier::new(&[("", &[])]).with_custom_handler(move |query| {
            match fixture.answer(query) {
                Ok(bin) => SystemResult::Ok(ContractResult::Ok(bin)),
                Err(err) => SystemResult::Ok(ContractResult::Err(err.to_string())),
            }
        });
    OwnedDeps {
        storage: MockStorage::default(),
        api: MockApi::default(),
        querier: custom_querier,
        custom_query_type: PhantomData,
    }
}
