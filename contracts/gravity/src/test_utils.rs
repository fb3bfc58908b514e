use std::collections::HashMap;

use bech32::{ToBase32, Variant};
use cosmwasm_std::testing::MockApi;
use cosmwasm_std::{Decimal, StdResult, Storage, Timestamp, Uint128};

use gravity_apis::gravity_api::{Attestation, BridgeValidator, Claim};
use gravity_bindings::{BondStatus, ValidatorInfo};

use crate::keeper::{SigningInfoKeeper, StakingKeeper};
use crate::state::attestation::ATTESTATIONS;
use crate::state::orchestrator::{ETH_ADDRESS_VALIDATOR, ORCHESTRATOR_VALIDATOR, VALIDATOR_ETH_ADDRESS};

pub const VALOPER_PREFIX: &str = "cosmosvaloper";

pub fn valoper(n: u8) -> String {
    bech32::encode(VALOPER_PREFIX, [n; 20].to_base32(), Variant::Bech32).unwrap()
}

pub fn cons_address(n: u8) -> String {
    format!("cosmosvalcons{n}")
}

pub fn account(n: u8) -> String {
    MockApi::default().addr_make(&format!("account{n}")).to_string()
}

pub fn orchestrator(n: u8) -> String {
    MockApi::default()
        .addr_make(&format!("orchestrator{n}"))
        .to_string()
}

pub fn eth_address(n: u8) -> String {
    format!("0x{:040x}", n)
}

pub fn token_contract() -> String {
    "0x429881672B9AE42b8EbA0E26cD9C73711b891Ca5".to_string()
}

pub fn validator(n: u8, power: u64) -> ValidatorInfo {
    ValidatorInfo {
        operator: valoper(n),
        account: account(n),
        cons_address: cons_address(n),
        power,
        status: BondStatus::Bonded,
        jailed: false,
        unbonding_height: 0,
    }
}

/// Registers delegate keys for validator `n`, bypassing the execute handler
pub fn register(storage: &mut dyn Storage, n: u8) {
    ORCHESTRATOR_VALIDATOR
        .save(storage, &orchestrator(n), &valoper(n))
        .unwrap();
    VALIDATOR_ETH_ADDRESS
        .save(storage, &valoper(n), &eth_address(n))
        .unwrap();
    ETH_ADDRESS_VALIDATOR
        .save(storage, &eth_address(n), &valoper(n))
        .unwrap();
}

pub fn deposit(nonce: u64, eth_block_height: u64) -> Claim {
    Claim::SendToCosmos {
        event_nonce: nonce,
        eth_block_height,
        token_contract: token_contract(),
        amount: Uint128::new(1000),
        ethereum_sender: eth_address(200),
        cosmos_receiver: MockApi::default().addr_make("receiver").to_string(),
    }
}

pub fn valset_updated(nonce: u64, valset_nonce: u64) -> Claim {
    Claim::ValsetUpdated {
        event_nonce: nonce,
        eth_block_height: 10,
        valset_nonce,
        members: vec![BridgeValidator {
            power: u32::MAX as u64,
            ethereum_address: eth_address(1),
        }],
        reward_amount: Uint128::zero(),
        reward_token: None,
    }
}

/// Stores an attestation for `claim` with the given voters (validator indexes)
pub fn store_attestation(storage: &mut dyn Storage, claim: Claim, voters: &[u8]) -> Vec<u8> {
    let hash = claim.hash().unwrap();
    let att = Attestation {
        observed: false,
        votes: voters.iter().map(|n| valoper(*n)).collect(),
        height: 1,
        claim,
    };
    ATTESTATIONS
        .save(storage, (att.claim.event_nonce(), hash.as_slice()), &att)
        .unwrap();
    hash
}

/// In memory staking and slashing modules
#[derive(Debug, Default)]
pub struct MockKeeper {
    pub validators: Vec<ValidatorInfo>,
    /// signing info start heights by consensus address
    pub start_heights: HashMap<String, u64>,
    pub unbonding_time: u64,
    /// (consensus address, infraction height, fraction)
    pub slashes: Vec<(String, u64, Decimal)>,
    pub jailed: Vec<String>,
}

impl MockKeeper {
    /// `count` bonded validators of equal power, all active since height 0
    pub fn with_validators(count: u8, power: u64) -> Self {
        let validators: Vec<_> = (1..=count).map(|n| validator(n, power)).collect();
        let start_heights = validators
            .iter()
            .map(|v| (v.cons_address.clone(), 0))
            .collect();
        Self {
            validators,
            start_heights,
            ..Default::default()
        }
    }

    pub fn validator_mut(&mut self, n: u8) -> &mut ValidatorInfo {
        let operator = valoper(n);
        self.validators
            .iter_mut()
            .find(|v| v.operator == operator)
            .unwrap()
    }

    pub fn slashed(&self) -> Vec<String> {
        self.slashes.iter().map(|(c, _, _)| c.clone()).collect()
    }
}

impl StakingKeeper for MockKeeper {
    fn bonded_validators_by_power(&self) -> StdResult<Vec<ValidatorInfo>> {
        let mut bonded: Vec<_> = self
            .validators
            .iter()
            .filter(|v| v.is_bonded() && !v.jailed)
            .cloned()
            .collect();
        bonded.sort_by(|a, b| b.power.cmp(&a.power));
        Ok(bonded)
    }

    fn validator(&self, operator: &str) -> StdResult<Option<ValidatorInfo>> {
        Ok(self
            .validators
            .iter()
            .find(|v| v.operator == operator)
            .cloned())
    }

    fn unbonding_validators(
        &self,
        _end_time: Timestamp,
        _end_height: u64,
    ) -> StdResult<Vec<ValidatorInfo>> {
        Ok(self
            .validators
            .iter()
            .filter(|v| v.is_unbonding())
            .cloned()
            .collect())
    }

    fn unbonding_time(&self) -> StdResult<u64> {
        Ok(self.unbonding_time)
    }

    fn slash(
        &mut self,
        cons_address: &str,
        infraction_height: u64,
        _power: u64,
        fraction: Decimal,
    ) -> StdResult<()> {
        self.slashes
            .push((cons_address.to_string(), infraction_height, fraction));
        Ok(())
    }

    fn jail(&mut self, cons_address: &str) -> StdResult<()> {
        if let Some(v) = self
            .validators
            .iter_mut()
            .find(|v| v.cons_address == cons_address)
        {
            v.jailed = true;
        }
        self.jailed.push(cons_address.to_string());
        Ok(())
    }
}

impl SigningInfoKeeper for MockKeeper {
    fn start_height(&self, cons_address: &str) -> StdResult<Option<u64>> {
        Ok(self.start_heights.get(cons_address).copied())
    }
}
