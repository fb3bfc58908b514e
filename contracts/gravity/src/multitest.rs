mod suite;

use cosmwasm_std::Decimal;
use suite::SuiteBuilder;

use crate::state::config::Params;
use crate::state::outgoing::voucher_denom;
use crate::test_utils::{deposit, token_contract, validator};

mod instantiation {
    use super::*;

    #[test]
    fn instantiate_works() {
        let suite = SuiteBuilder::new()
            .with_validators(&[(1, 100), (2, 100)])
            .build();

        // No valset before the first end block
        assert_eq!(suite.get_latest_valset_nonce(), 0);
        assert_eq!(suite.get_last_observed_event_nonce(), 0);
    }
}

mod oracle {
    use super::*;
    use cosmwasm_std::testing::MockApi;

    #[test]
    fn observed_deposit_mints_vouchers() {
        let mut suite = SuiteBuilder::new()
            .with_validators(&[(1, 100), (2, 100), (3, 100)])
            .build();
        let receiver = MockApi::default().addr_make("receiver");
        let denom = voucher_denom(&token_contract());

        // Two thirds of the power is above the 66% threshold
        suite.submit_claim(1, deposit(1, 10)).unwrap();
        suite.submit_claim(2, deposit(1, 10)).unwrap();
        suite.end_block().unwrap();
        assert_eq!(suite.get_last_observed_event_nonce(), 1);
        assert_eq!(suite.get_balance(receiver.as_str(), &denom).u128(), 1000);

        // A late vote doesn't mint again
        suite.next_block();
        suite.submit_claim(3, deposit(1, 10)).unwrap();
        suite.end_block().unwrap();
        assert_eq!(suite.get_balance(receiver.as_str(), &denom).u128(), 1000);
    }

    #[test]
    fn deposit_below_threshold_waits() {
        let mut suite = SuiteBuilder::new()
            .with_validators(&[(1, 100), (2, 100), (3, 100)])
            .build();

        suite.submit_claim(1, deposit(1, 10)).unwrap();
        suite.end_block().unwrap();
        assert_eq!(suite.get_last_observed_event_nonce(), 0);

        // Out of order submissions are rejected upfront
        let err = suite.submit_claim(2, deposit(2, 11)).unwrap_err();
        assert!(err.root_cause().to_string().contains("Non contiguous"));
    }
}

mod slashing {
    use super::*;
    use gravity_bindings::BondStatus;

    #[test]
    fn unconfirmed_valset_gets_validator_slashed_and_jailed() {
        let params = Params {
            signed_valsets_window: 10,
            slash_fraction_valset: Decimal::percent(10),
            ..Params::default()
        };
        let mut suite = SuiteBuilder::new()
            .with_height(100)
            .with_validators(&[(1, 1000), (2, 1000), (3, 1000)])
            .with_params(params)
            .build();

        suite.next_block();
        suite.end_block().unwrap();
        assert_eq!(suite.get_latest_valset_nonce(), 1);
        let valset = suite.get_valset(1).valset.unwrap();
        assert_eq!(valset.members.len(), 3);

        suite.confirm_valset(1, 1).unwrap();
        suite.confirm_valset(2, 1).unwrap();

        // Still within the window
        suite.app.advance_blocks(9);
        suite.end_block().unwrap();
        assert!(!suite.get_validator(3).jailed);

        suite.next_block();
        let slash_height = suite.height();
        suite.end_block().unwrap();

        let val = suite.get_validator(3);
        assert!(val.jailed);
        assert_eq!(val.status, BondStatus::Unbonding);
        assert_eq!(val.power, 900);
        assert_eq!(
            suite.app.slashes().unwrap(),
            vec![(validator(3, 0).cons_address, slash_height)]
        );
        assert_eq!(suite.get_validator(1).power, 1000);

        // The jailing asked for a new valset without validator 3
        assert_eq!(suite.get_latest_valset_nonce(), 2);
        let valset = suite.get_valset(2).valset.unwrap();
        assert_eq!(valset.members.len(), 2);
    }
}
