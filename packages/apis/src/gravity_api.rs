/// Bridge messages / API
/// The definitions here follow the shape of the Ethereum-side Gravity contract:
/// validator sets, outgoing batches and logic calls are what relayers submit there,
/// claims are what orchestrators report back from there.
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_vec, Binary, StdResult, Uint128};
use sha2::{Digest, Sha256};

/// Length in bytes of a logic call invalidation id
pub const INVALIDATION_ID_SIZE: usize = 32;

/// `BridgeValidator` is a member of a validator set as seen by the Ethereum contract
#[cw_serde]
pub struct BridgeValidator {
    /// `power` is the normalized voting power, summing to `u32::MAX` across the set
    pub power: u64,
    /// `ethereum_address` is the hex encoded (0x-prefixed) address the validator signs with
    pub ethereum_address: String,
}

/// `Valset` is a snapshot of the bridge validator set, requested at `height`
#[cw_serde]
pub struct Valset {
    pub nonce: u64,
    pub members: Vec<BridgeValidator>,
    /// `height` is the Cosmos block height the snapshot was taken at
    pub height: u64,
    /// `reward_amount` is paid on Ethereum to whoever relays this valset
    pub reward_amount: Uint128,
    /// `reward_token` is the ERC20 contract of the reward, if any
    pub reward_token: Option<String>,
}

#[cw_serde]
pub struct Erc20Token {
    pub contract: String,
    pub amount: Uint128,
}

#[cw_serde]
pub struct OutgoingTransferTx {
    pub id: u64,
    pub sender: String,
    pub dest_address: String,
    pub erc20_token: Erc20Token,
    pub erc20_fee: Erc20Token,
}

/// `OutgoingTxBatch` is a set of transfers of a single ERC20 token, relayed to Ethereum together
#[cw_serde]
pub struct OutgoingTxBatch {
    pub batch_nonce: u64,
    /// `batch_timeout` is the Ethereum block height after which the batch can no longer execute
    pub batch_timeout: u64,
    pub transactions: Vec<OutgoingTransferTx>,
    pub token_contract: String,
    /// `block` is the Cosmos block height the batch was created at
    pub block: u64,
}

/// `OutgoingLogicCall` is an arbitrary contract call executed by the Ethereum bridge contract
#[cw_serde]
pub struct OutgoingLogicCall {
    pub transfers: Vec<Erc20Token>,
    pub fees: Vec<Erc20Token>,
    pub logic_contract_address: String,
    pub payload: Binary,
    /// `timeout` is the Ethereum block height after which the call can no longer execute
    pub timeout: u64,
    /// `invalidation_id` is the hex encoded 32 byte id scoping `invalidation_nonce`
    pub invalidation_id: String,
    pub invalidation_nonce: u64,
    /// `block` is the Cosmos block height the call was created at
    pub block: u64,
}

/// `Claim` is an orchestrator's report of an event emitted by the Ethereum bridge contract.
/// Every event carries the contract's monotonic event nonce.
#[cw_serde]
pub enum Claim {
    /// `SendToCosmos` reports tokens locked on Ethereum for a Cosmos receiver
    SendToCosmos {
        event_nonce: u64,
        eth_block_height: u64,
        token_contract: String,
        amount: Uint128,
        ethereum_sender: String,
        cosmos_receiver: String,
    },
    /// `BatchSendToEth` reports an outgoing batch executed on Ethereum
    BatchSendToEth {
        event_nonce: u64,
        eth_block_height: u64,
        batch_nonce: u64,
        token_contract: String,
    },
    /// `Erc20Deployed` reports a new ERC20 representing a Cosmos denom
    Erc20Deployed {
        event_nonce: u64,
        eth_block_height: u64,
        cosmos_denom: String,
        token_contract: String,
        name: String,
        symbol: String,
        decimals: u64,
    },
    /// `LogicCallExecuted` reports an outgoing logic call executed on Ethereum
    LogicCallExecuted {
        event_nonce: u64,
        eth_block_height: u64,
        invalidation_id: String,
        invalidation_nonce: u64,
    },
    /// `ValsetUpdated` reports a validator set accepted by the Ethereum contract
    ValsetUpdated {
        event_nonce: u64,
        eth_block_height: u64,
        valset_nonce: u64,
        members: Vec<BridgeValidator>,
        reward_amount: Uint128,
        reward_token: Option<String>,
    },
}

impl Claim {
    pub fn event_nonce(&self) -> u64 {
        match self {
            Claim::SendToCosmos { event_nonce, .. }
            | Claim::BatchSendToEth { event_nonce, .. }
            | Claim::Erc20Deployed { event_nonce, .. }
            | Claim::LogicCallExecuted { event_nonce, .. }
            | Claim::ValsetUpdated { event_nonce, .. } => *event_nonce,
        }
    }

    pub fn eth_block_height(&self) -> u64 {
        match self {
            Claim::SendToCosmos {
                eth_block_height, ..
            }
            | Claim::BatchSendToEth {
                eth_block_height, ..
            }
            | Claim::Erc20Deployed {
                eth_block_height, ..
            }
            | Claim::LogicCallExecuted {
                eth_block_height, ..
            }
            | Claim::ValsetUpdated {
                eth_block_height, ..
            } => *eth_block_height,
        }
    }

    pub fn claim_type(&self) -> &'static str {
        match self {
            Claim::SendToCosmos { .. } => "send_to_cosmos",
            Claim::BatchSendToEth { .. } => "batch_send_to_eth",
            Claim::Erc20Deployed { .. } => "erc20_deployed",
            Claim::LogicCallExecuted { .. } => "logic_call_executed",
            Claim::ValsetUpdated { .. } => "valset_updated",
        }
    }

    /// `hash` identifies the claim content. Two orchestrators reporting the same event
    /// produce the same hash, so their votes land on the same attestation.
    pub fn hash(&self) -> StdResult<Vec<u8>> {
        let bytes = to_json_vec(self)?;
        Ok(Sha256::digest(bytes).to_vec())
    }
}

/// `Attestation` aggregates the votes of validators on one claim
#[cw_serde]
pub struct Attestation {
    pub observed: bool,
    /// `votes` are the operator addresses of the validators that submitted this claim
    pub votes: Vec<String>,
    /// `height` is the Cosmos block height the attestation was created at
    pub height: u64,
    pub claim: Claim,
}

#[cw_serde]
pub struct ValsetConfirm {
    pub nonce: u64,
    pub orchestrator: String,
    pub eth_address: String,
    pub signature: String,
}

#[cw_serde]
pub struct BatchConfirm {
    pub token_contract: String,
    pub nonce: u64,
    pub orchestrator: String,
    pub eth_signer: String,
    pub signature: String,
}

#[cw_serde]
pub struct LogicCallConfirm {
    pub invalidation_id: String,
    pub invalidation_nonce: u64,
    pub orchestrator: String,
    pub eth_signer: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(nonce: u64) -> Claim {
        Claim::SendToCosmos {
            event_nonce: nonce,
            eth_block_height: 100,
            token_contract: "0x0000000000000000000000000000000000000001".to_string(),
            amount: Uint128::new(1000),
            ethereum_sender: "0x0000000000000000000000000000000000000002".to_string(),
            cosmos_receiver: "cosmos1receiver".to_string(),
        }
    }

    #[test]
    fn claim_hash_identifies_content() {
        assert_eq!(deposit(1).hash().unwrap(), deposit(1).hash().unwrap());
        assert_ne!(deposit(1).hash().unwrap(), deposit(2).hash().unwrap());
        assert_eq!(deposit(1).hash().unwrap().len(), 32);
    }

    #[test]
    fn claim_accessors() {
        let claim = Claim::LogicCallExecuted {
            event_nonce: 7,
            eth_block_height: 42,
            invalidation_id: hex::encode([1u8; 32]),
            invalidation_nonce: 1,
        };
        assert_eq!(claim.event_nonce(), 7);
        assert_eq!(claim.eth_block_height(), 42);
        assert_eq!(claim.claim_type(), "logic_call_executed");
    }
}
