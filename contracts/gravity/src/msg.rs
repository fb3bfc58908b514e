use cosmwasm_schema::{cw_serde, QueryResponses};
#[cfg(not(target_arch = "wasm32"))]
use {
    crate::state::attestation::LastObservedEthHeight, crate::state::config::Config,
    cw_controllers::AdminResponse,
};

use gravity_apis::gravity_api::{
    Attestation, BatchConfirm, Claim, LogicCallConfirm, OutgoingLogicCall, OutgoingTxBatch, Valset,
    ValsetConfirm,
};

use crate::state::config::Params;

#[cw_serde]
pub struct InstantiateMsg {
    /// `gravity_id` is the id of the Ethereum bridge contract this instance is paired with
    pub gravity_id: String,
    /// `valoper_prefix` is the bech32 prefix of validator operator addresses
    pub valoper_prefix: String,
    /// `batch_creator` is allowed to submit outgoing batches and logic calls, besides the admin
    pub batch_creator: Option<String>,
    pub params: Option<Params>,
    pub admin: Option<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Change the admin
    UpdateAdmin { admin: Option<String> },
    /// Replace the bridge parameters. Admin only
    UpdateParams { params: Params },
    /// Registers the delegate keys of `validator`.
    /// Sent by the validator's account, or by the admin
    SetOrchestratorAddress {
        validator: String,
        orchestrator: String,
        eth_address: String,
    },
    /// Reports an Ethereum event. Sent by a registered orchestrator
    SubmitClaim { claim: Claim },
    ConfirmValset {
        nonce: u64,
        eth_address: String,
        signature: String,
    },
    ConfirmBatch {
        token_contract: String,
        nonce: u64,
        eth_signer: String,
        signature: String,
    },
    ConfirmLogicCall {
        invalidation_id: String,
        invalidation_nonce: u64,
        eth_signer: String,
        signature: String,
    },
    /// Stores an outgoing batch built off-chain. Batch creator or admin only
    SubmitBatch { batch: OutgoingTxBatch },
    /// Stores an outgoing logic call. Batch creator or admin only
    SubmitLogicCall { call: OutgoingLogicCall },
}

/// Privileged messages, sent by the chain
#[cw_serde]
pub enum SudoMsg {
    /// Advances the bridge, once per block
    EndBlock {},
    /// Staking hook, a validator started unbonding in the current block
    AfterValidatorBeginUnbonding {},
    /// Governance update of the bridge parameters
    UpdateParams { params: Params },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// `Config` returns the bridge instance configuration
    #[returns(Config)]
    Config {},
    /// `Params` returns the current bridge parameters
    #[returns(Params)]
    Params {},
    /// `Admin` returns the current admin of the contract
    #[returns(AdminResponse)]
    Admin {},
    /// `CurrentValset` returns the valset that would be requested now
    #[returns(Valset)]
    CurrentValset {},
    #[returns(ValsetResponse)]
    Valset { nonce: u64 },
    #[returns(u64)]
    LatestValsetNonce {},
    /// `LastObservedValset` returns the last valset the Ethereum contract reported as accepted
    #[returns(Option<Valset>)]
    LastObservedValset {},
    /// `Valsets` returns the list of valset requests.
    ///
    /// `start_after` is the nonce to start after (before, if `reverse` is `true`),
    /// or `None` to start from the beginning (end, if `reverse` is `true`).
    /// `limit` is the maximum number of valsets to return.
    /// `reverse` is an optional flag to return the valsets in descending nonce order
    #[returns(ValsetsResponse)]
    Valsets {
        start_after: Option<u64>,
        limit: Option<u32>,
        reverse: Option<bool>,
    },
    #[returns(ValsetConfirmsResponse)]
    ValsetConfirms { nonce: u64 },
    /// `LastPendingValsets` returns the latest valsets `orchestrator` has not confirmed yet
    #[returns(ValsetsResponse)]
    LastPendingValsets { orchestrator: String },
    #[returns(u64)]
    LastObservedEventNonce {},
    #[returns(LastObservedEthHeight)]
    LastObservedEthHeight {},
    /// `LastEventNonceByValidator` returns the nonce of the last event `validator`
    /// (operator address) reported
    #[returns(u64)]
    LastEventNonceByValidator { validator: String },
    /// `Attestations` returns attestations in descending nonce order.
    ///
    /// `start_after` is the nonce to start below, or `None` to start from the highest nonce
    #[returns(AttestationsResponse)]
    Attestations {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// `Attestation` returns the attestation at `nonce` for the claim with hex encoded hash
    /// `claim_hash`
    #[returns(AttestationResponse)]
    Attestation { nonce: u64, claim_hash: String },
    /// `OutgoingTxBatches` returns up to `limit` (at most 100) outgoing batches
    #[returns(BatchesResponse)]
    OutgoingTxBatches { limit: Option<u32> },
    #[returns(BatchResponse)]
    OutgoingTxBatch { token_contract: String, nonce: u64 },
    #[returns(BatchConfirmsResponse)]
    BatchConfirms { token_contract: String, nonce: u64 },
    /// `LastPendingBatch` returns the first batch `orchestrator` has not confirmed yet
    #[returns(BatchResponse)]
    LastPendingBatch { orchestrator: String },
    /// `OutgoingLogicCalls` returns up to `limit` (at most 100) outgoing logic calls
    #[returns(LogicCallsResponse)]
    OutgoingLogicCalls { limit: Option<u32> },
    #[returns(LogicCallResponse)]
    OutgoingLogicCall {
        invalidation_id: String,
        invalidation_nonce: u64,
    },
    #[returns(LogicCallConfirmsResponse)]
    LogicCallConfirms {
        invalidation_id: String,
        invalidation_nonce: u64,
    },
    /// `LastPendingLogicCall` returns the first logic call `orchestrator` has not confirmed yet
    #[returns(LogicCallResponse)]
    LastPendingLogicCall { orchestrator: String },
    /// `OrchestratorValidator` returns the validator an orchestrator acts for
    #[returns(Option<String>)]
    OrchestratorValidator { orchestrator: String },
    #[returns(Option<String>)]
    EthAddressByValidator { validator: String },
    /// `Erc20ToDenom` returns the Cosmos denom represented by `erc20`, if any
    #[returns(Option<String>)]
    Erc20ToDenom { erc20: String },
    #[returns(Option<String>)]
    DenomToErc20 { denom: String },
}

#[cw_serde]
pub struct ValsetResponse {
    pub valset: Option<Valset>,
}

#[cw_serde]
pub struct ValsetsResponse {
    pub valsets: Vec<Valset>,
}

#[cw_serde]
pub struct ValsetConfirmsResponse {
    pub confirms: Vec<ValsetConfirm>,
}

#[cw_serde]
pub struct AttestationResponse {
    pub attestation: Option<Attestation>,
}

#[cw_serde]
pub struct AttestationsResponse {
    pub attestations: Vec<Attestation>,
}

#[cw_serde]
pub struct BatchResponse {
    pub batch: Option<OutgoingTxBatch>,
}

#[cw_serde]
pub struct BatchesResponse {
    pub batches: Vec<OutgoingTxBatch>,
}

#[cw_serde]
pub struct BatchConfirmsResponse {
    pub confirms: Vec<BatchConfirm>,
}

#[cw_serde]
pub struct LogicCallResponse {
    pub call: Option<OutgoingLogicCall>,
}

#[cw_serde]
pub struct LogicCallsResponse {
    pub calls: Vec<OutgoingLogicCall>,
}

#[cw_serde]
pub struct LogicCallConfirmsResponse {
    pub confirms: Vec<LogicCallConfirm>,
}
