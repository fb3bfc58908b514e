use anyhow::Result as AnyResult;
use derivative::Derivative;

use cosmwasm_std::{Addr, Uint128};

use cw_multi_test::{AppResponse, Contract, ContractWrapper, Executor};

use gravity_apis::gravity_api::Claim;
use gravity_bindings::{GravityMsg, GravityQuery, ValidatorInfo};
use gravity_bindings_test::GravityApp;

use crate::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, SudoMsg, ValsetResponse};
use crate::state::config::Params;
use crate::test_utils::{account, eth_address, orchestrator, validator, valoper, VALOPER_PREFIX};

fn contract_gravity() -> Box<dyn Contract<GravityMsg, GravityQuery>> {
    let contract = ContractWrapper::new(
        crate::contract::execute,
        crate::contract::instantiate,
        crate::contract::query,
    )
    .with_sudo(crate::contract::sudo)
    .with_migrate(crate::contract::migrate);
    Box::new(contract)
}

#[derive(Derivative)]
#[derivative(Default = "new")]
pub struct SuiteBuilder {
    height: Option<u64>,
    /// (index, power) of the bonded validators, all with delegate keys set
    validators: Vec<(u8, u64)>,
    params: Option<Params>,
}

impl SuiteBuilder {
    pub fn with_height(mut self, height: u64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_validators(mut self, validators: &[(u8, u64)]) -> Self {
        self.validators = validators.to_vec();
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    #[track_caller]
    pub fn build(self) -> Suite {
        let mut app = GravityApp::new_at_height(self.height.unwrap_or(1));
        let owner = app.api().addr_make("owner");

        for (n, power) in &self.validators {
            app.add_validator(validator(*n, *power)).unwrap();
        }

        let code_id = app.store_code_with_creator(owner.clone(), contract_gravity());
        let contract = app
            .instantiate_contract(
                code_id,
                owner.clone(),
                &InstantiateMsg {
                    gravity_id: "gravity-test".to_string(),
                    valoper_prefix: VALOPER_PREFIX.to_string(),
                    batch_creator: None,
                    params: self.params,
                    admin: Some(owner.to_string()),
                },
                &[],
                "gravity",
                Some(owner.to_string()),
            )
            .unwrap();

        for (n, _) in &self.validators {
            app.execute_contract(
                Addr::unchecked(account(*n)),
                contract.clone(),
                &ExecuteMsg::SetOrchestratorAddress {
                    validator: valoper(*n),
                    orchestrator: orchestrator(*n),
                    eth_address: eth_address(*n),
                },
                &[],
            )
            .unwrap();
        }

        Suite {
            app,
            contract,
            owner,
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Suite {
    #[derivative(Debug = "ignore")]
    pub app: GravityApp,
    /// Gravity contract address
    pub contract: Addr,
    /// Admin of the gravity contract
    pub owner: Addr,
}

impl Suite {
    pub fn height(&self) -> u64 {
        self.app.block_info().height
    }

    pub fn next_block(&mut self) {
        self.app.advance_blocks(1)
    }

    /// Runs the end block pass of the current block
    pub fn end_block(&mut self) -> AnyResult<AppResponse> {
        self.app
            .wasm_sudo(self.contract.clone(), &SudoMsg::EndBlock {})
    }

    #[track_caller]
    pub fn submit_claim(&mut self, n: u8, claim: Claim) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(orchestrator(n)),
            self.contract.clone(),
            &ExecuteMsg::SubmitClaim { claim },
            &[],
        )
    }

    #[track_caller]
    pub fn confirm_valset(&mut self, n: u8, nonce: u64) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(orchestrator(n)),
            self.contract.clone(),
            &ExecuteMsg::ConfirmValset {
                nonce,
                eth_address: eth_address(n),
                signature: format!("sig{n}"),
            },
            &[],
        )
    }

    #[track_caller]
    pub fn get_validator(&self, n: u8) -> ValidatorInfo {
        self.app.validator(&valoper(n)).unwrap()
    }

    #[track_caller]
    pub fn get_balance(&self, addr: &str, denom: &str) -> Uint128 {
        self.app.balance(&Addr::unchecked(addr), denom).unwrap()
    }

    #[track_caller]
    pub fn get_last_observed_event_nonce(&self) -> u64 {
        self.app
            .wrap()
            .query_wasm_smart(
                self.contract.clone(),
                &QueryMsg::LastObservedEventNonce {},
            )
            .unwrap()
    }

    #[track_caller]
    pub fn get_latest_valset_nonce(&self) -> u64 {
        self.app
            .wrap()
            .query_wasm_smart(self.contract.clone(), &QueryMsg::LatestValsetNonce {})
            .unwrap()
    }

    #[track_caller]
    pub fn get_valset(&self, nonce: u64) -> ValsetResponse {
        self.app
            .wrap()
            .query_wasm_smart(self.contract.clone(), &QueryMsg::Valset { nonce })
            .unwrap()
    }
}
