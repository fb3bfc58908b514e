use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{CustomQuery, QuerierWrapper, QueryRequest, StdResult, Timestamp};

/// GravityQuery exposes the parts of the staking and slashing modules the bridge relies on
#[cw_serde]
#[derive(QueryResponses)]
pub enum GravityQuery {
    /// BondedValidatorsByPower returns the bonded validators, ordered by descending power
    #[returns(ValidatorsResponse)]
    BondedValidatorsByPower {},
    #[returns(ValidatorResponse)]
    Validator { operator: String },
    /// UnbondingValidators returns the validators in the unbonding queue that complete
    /// at or before the given time and height
    #[returns(ValidatorsResponse)]
    UnbondingValidators { end_time: Timestamp, end_height: u64 },
    #[returns(SigningInfoResponse)]
    SigningInfo { cons_address: String },
    #[returns(StakingParamsResponse)]
    StakingParams {},
}

impl CustomQuery for GravityQuery {}

#[cw_serde]
pub enum BondStatus {
    Bonded,
    Unbonding,
    Unbonded,
}

#[cw_serde]
pub struct ValidatorInfo {
    /// operator is the bech32 validator operator address
    pub operator: String,
    /// account is the bech32 account address controlling the operator
    pub account: String,
    pub cons_address: String,
    /// power is the validator's consensus power
    pub power: u64,
    pub status: BondStatus,
    pub jailed: bool,
    /// unbonding_height is the height the validator started unbonding at
    pub unbonding_height: u64,
}

impl ValidatorInfo {
    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }

    pub fn is_unbonding(&self) -> bool {
        self.status == BondStatus::Unbonding
    }
}

#[cw_serde]
pub struct ValidatorsResponse {
    pub validators: Vec<ValidatorInfo>,
}

#[cw_serde]
pub struct ValidatorResponse {
    pub validator: Option<ValidatorInfo>,
}

#[cw_serde]
pub struct SigningInfoResponse {
    /// start_height is the height the validator joined the active set at
    pub start_height: Option<u64>,
}

#[cw_serde]
pub struct StakingParamsResponse {
    /// unbonding_time in seconds
    pub unbonding_time: u64,
}

pub struct GravityQuerier<'a> {
    querier: QuerierWrapper<'a, GravityQuery>,
}

impl<'a> GravityQuerier<'a> {
    pub fn new(querier: QuerierWrapper<'a, GravityQuery>) -> Self {
        Self { querier }
    }

    fn query<T: serde::de::DeserializeOwned>(&self, query: GravityQuery) -> StdResult<T> {
        self.querier.query(&QueryRequest::Custom(query))
    }

    pub fn bonded_validators_by_power(&self) -> StdResult<Vec<ValidatorInfo>> {
        let res: ValidatorsResponse = self.query(GravityQuery::BondedValidatorsByPower {})?;
        Ok(res.validators)
    }

    pub fn validator(&self, operator: &str) -> StdResult<Option<ValidatorInfo>> {
        let res: ValidatorResponse = self.query(GravityQuery::Validator {
            operator: operator.to_string(),
        })?;
        Ok(res.validator)
    }

    pub fn unbonding_validators(
        &self,
        end_time: Timestamp,
        end_height: u64,
    ) -> StdResult<Vec<ValidatorInfo>> {
        let res: ValidatorsResponse = self.query(GravityQuery::UnbondingValidators {
            end_time,
            end_height,
        })?;
        Ok(res.validators)
    }

    pub fn start_height(&self, cons_address: &str) -> StdResult<Option<u64>> {
        let res: SigningInfoResponse = self.query(GravityQuery::SigningInfo {
            cons_address: cons_address.to_string(),
        })?;
        Ok(res.start_height)
    }

    pub fn unbonding_time(&self) -> StdResult<u64> {
        let res: StakingParamsResponse = self.query(GravityQuery::StakingParams {})?;
        Ok(res.unbonding_time)
    }
}
