use derivative::Derivative;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Decimal};

use cw_controllers::Admin;
use cw_storage_plus::Item;

use crate::error::ContractError;

pub(crate) const CONFIG: Item<Config> = Item::new("config");
pub(crate) const PARAMS: Item<Params> = Item::new("params");
/// Storage for admin
pub(crate) const ADMIN: Admin = Admin::new("admin");

/// Config is the bridge instance configuration, fixed at instantiation
#[cw_serde]
pub struct Config {
    /// `gravity_id` is the unique id of the Ethereum bridge contract, mixed into every signature
    pub gravity_id: String,
    /// `valoper_prefix` is the bech32 prefix of validator operator addresses
    pub valoper_prefix: String,
    /// `batch_creator` is the address allowed to submit outgoing batches and logic calls
    pub batch_creator: Option<Addr>,
}

#[cw_serde]
#[derive(Derivative)]
#[derivative(Default)]
pub struct Params {
    /// `signed_valsets_window` is the number of blocks validators have to confirm a valset
    #[derivative(Default(value = "10_000"))]
    pub signed_valsets_window: u64,
    /// `signed_batches_window` is the number of blocks validators have to confirm a batch
    #[derivative(Default(value = "10_000"))]
    pub signed_batches_window: u64,
    /// `signed_logic_calls_window` is the number of blocks validators have to confirm a logic call
    #[derivative(Default(value = "10_000"))]
    pub signed_logic_calls_window: u64,
    #[derivative(Default(value = "Decimal::permille(1)"))]
    pub slash_fraction_valset: Decimal,
    #[derivative(Default(value = "Decimal::permille(1)"))]
    pub slash_fraction_batch: Decimal,
    #[derivative(Default(value = "Decimal::permille(1)"))]
    pub slash_fraction_logic_call: Decimal,
    /// `unbond_slashing_valsets_window` is the number of blocks after an unbonding starts during
    /// which the validator still has to confirm valsets
    #[derivative(Default(value = "10_000"))]
    pub unbond_slashing_valsets_window: u64,
    /// `attestation_threshold` is the share of bonded power an attestation has to exceed
    /// to be observed
    #[derivative(Default(value = "Decimal::percent(66)"))]
    pub attestation_threshold: Decimal,
    /// `valset_change_threshold` is the normalized power change that triggers a new valset
    #[derivative(Default(value = "Decimal::percent(5)"))]
    pub valset_change_threshold: Decimal,
    /// `attestation_retention` is the number of event nonces kept behind the last observed one
    #[derivative(Default(value = "1000"))]
    pub attestation_retention: u64,
    /// `bridge_active` enables the processing of Ethereum events
    #[derivative(Default(value = "true"))]
    pub bridge_active: bool,
    /// `reset_bridge_state` triggers a one-shot oracle rollback to `reset_bridge_nonce`
    pub reset_bridge_state: bool,
    pub reset_bridge_nonce: u64,
    /// `valset_reward` is paid on Ethereum to the relayer of each valset
    pub valset_reward: Option<Coin>,
}

impl Params {
    pub fn validate(&self) -> Result<(), ContractError> {
        for (name, fraction) in [
            ("slash_fraction_valset", self.slash_fraction_valset),
            ("slash_fraction_batch", self.slash_fraction_batch),
            ("slash_fraction_logic_call", self.slash_fraction_logic_call),
            ("valset_change_threshold", self.valset_change_threshold),
        ] {
            if fraction > Decimal::one() {
                return Err(ContractError::InvalidParams(format!(
                    "{name} must not exceed 1, got {fraction}"
                )));
            }
        }
        // Observation needs strictly more power than `threshold * total`, unreachable at 1
        if self.attestation_threshold.is_zero() || self.attestation_threshold >= Decimal::one() {
            return Err(ContractError::InvalidParams(format!(
                "attestation_threshold must be in (0, 1), got {}",
                self.attestation_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        let params = Params::default();
        params.validate().unwrap();
        assert!(params.bridge_active);
        assert!(!params.reset_bridge_state);
        assert_eq!(params.attestation_retention, 1000);
        assert_eq!(params.valset_change_threshold, Decimal::percent(5));
    }

    #[test]
    fn out_of_range_fractions_are_rejected() {
        let params = Params {
            slash_fraction_batch: Decimal::percent(101),
            ..Params::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ContractError::InvalidParams(_))
        ));

        let params = Params {
            attestation_threshold: Decimal::zero(),
            ..Params::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ContractError::InvalidParams(_))
        ));
    }

    #[test]
    fn unanimity_threshold_is_rejected() {
        let params = Params {
            attestation_threshold: Decimal::one(),
            ..Params::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ContractError::InvalidParams(_))
        ));

        let params = Params {
            attestation_threshold: Decimal::percent(99),
            ..Params::default()
        };
        params.validate().unwrap();
    }
}
