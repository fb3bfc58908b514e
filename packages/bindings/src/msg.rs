//! msg is the module that includes custom messages that the Gravity contract
//! will send to the hosting Cosmos chain. The messages include:
//! - Slash / Jail: penalties for validators that failed to confirm bridge artifacts
//! - MintTokens / BurnTokens: supply changes for Ethereum-originated vouchers
//! - CancelOutgoingTxBatch / CancelOutgoingLogicCall: return escrowed transfers to the pool

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, CosmosMsg, Decimal, Empty};

/// GravityMsg is the message that the Gravity contract can send to the Cosmos chain.
/// The chain has to integrate a wasm binding handling these messages
#[cw_serde]
pub enum GravityMsg {
    /// Slash burns `slash_fraction` of the stake the validator had at `infraction_height`
    Slash {
        cons_address: String,
        infraction_height: u64,
        power: u64,
        slash_fraction: Decimal,
    },
    /// Jail removes the validator from the active set
    Jail { cons_address: String },
    /// MintTokens mints `amount` to `recipient`
    MintTokens { amount: Coin, recipient: String },
    /// BurnTokens burns `amount` from the contract's holdings
    BurnTokens { amount: Coin },
    /// CancelOutgoingTxBatch returns the batch's transfers to the outgoing pool
    CancelOutgoingTxBatch { token_contract: String, nonce: u64 },
    /// CancelOutgoingLogicCall refunds the logic call's escrowed transfers and fees
    CancelOutgoingLogicCall {
        invalidation_id: String,
        invalidation_nonce: u64,
    },
}

pub type GravitySudoMsg = Empty;

// make GravityMsg to implement CosmosMsg::CustomMsg
impl cosmwasm_std::CustomMsg for GravityMsg {}

impl From<GravityMsg> for CosmosMsg<GravityMsg> {
    fn from(original: GravityMsg) -> Self {
        CosmosMsg::Custom(original)
    }
}
