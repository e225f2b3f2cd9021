//! Comportement fonction par fonction du contrat PresentPool

use chrono::Duration;
use presentpool_core::{ContractError, PresentPoolCall, PresentPoolEvent, PresentPoolReturn};
use crate::TestSetup;

mod constructor {
    use super::*;

    #[test]
    fn test_initial_members_are_members() {
        let setup = TestSetup::new();
        let contract = setup.manager.contract(&setup.pool).unwrap();
        assert!(contract.is_member(&setup.a));
        assert!(contract.is_member(&setup.b));
        assert!(contract.is_member(&setup.c));
        assert!(!contract.is_member(&setup.outsider));
        assert_eq!(contract.total_presents(), 0);
    }

    #[test]
    fn test_membership_query_through_call() {
        let mut setup = TestSetup::new();
        let (a, outsider) = (setup.a, setup.outsider);
        let receipt = setup.call(outsider, PresentPoolCall::IsMember { address: a }).unwrap();
        assert_eq!(receipt.result, PresentPoolReturn::IsMember(true));
        let receipt = setup.call(a, PresentPoolCall::IsMember { address: outsider }).unwrap();
        assert_eq!(receipt.result, PresentPoolReturn::IsMember(false));
    }
}

mod add_member {
    use super::*;

    #[test]
    fn test_member_adds_member() {
        let mut setup = TestSetup::new();
        let (b, outsider) = (setup.b, setup.outsider);
        let receipt = setup.call(b, PresentPoolCall::AddMember { candidate: outsider }).unwrap();

        assert_eq!(receipt.events.len(), 1);
        assert_eq!(receipt.events[0].decode().unwrap(), PresentPoolEvent::AddMember { member: outsider });
        assert!(setup.manager.contract(&setup.pool).unwrap().is_member(&outsider));
    }

    #[test]
    fn test_non_member_cannot_add() {
        let mut setup = TestSetup::new();
        let outsider = setup.outsider;
        let err = setup.call(outsider, PresentPoolCall::AddMember { candidate: outsider }).unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized { .. }));
        assert!(setup.manager.event_log().is_empty());
    }

    #[test]
    fn test_existing_member_rejected() {
        let mut setup = TestSetup::new();
        let (a, c) = (setup.a, setup.c);
        let err = setup.call(a, PresentPoolCall::AddMember { candidate: c }).unwrap_err();
        assert_eq!(err, ContractError::AlreadyMember { member: c });
    }

    #[test]
    fn test_new_member_can_act() {
        let mut setup = TestSetup::new();
        let (a, outsider, b) = (setup.a, setup.outsider, setup.b);
        setup.call(a, PresentPoolCall::AddMember { candidate: outsider }).unwrap();
        let id = setup.create_present(outsider, outsider, b, Duration::zero());
        assert_eq!(id, 0);
    }
}

mod create_present {
    use super::*;

    #[test]
    fn test_member_creates_present() {
        let mut setup = TestSetup::new();
        let (a, b, c) = (setup.a, setup.b, setup.c);
        let unlock_time = setup.now() + Duration::seconds(60);
        let receipt = setup
            .call(a, PresentPoolCall::CreatePresent { holder: c, receiver: b, unlock_time })
            .unwrap();

        assert_eq!(receipt.result, PresentPoolReturn::PresentCreated { present_id: 0 });
        assert_eq!(
            receipt.events[0].decode().unwrap(),
            PresentPoolEvent::CreatedPresent { present_id: 0, holder: c, receiver: b, unlock_time }
        );

        let contract = setup.manager.contract(&setup.pool).unwrap();
        let present = contract.present(0).unwrap();
        assert_eq!(present.holder, c);
        assert_eq!(present.receiver, b);
        assert_eq!(present.unlock_time, unlock_time);
        assert_eq!(present.total_pooled, 0);
        assert!(!present.sent);
        assert_eq!(contract.present_id(0).unwrap(), 0);
        assert_eq!(contract.total_presents(), 1);
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut setup = TestSetup::new();
        let (a, b, c) = (setup.a, setup.b, setup.c);
        for expected in 0..3 {
            assert_eq!(setup.create_present(a, b, c, Duration::seconds(1)), expected);
        }
        let contract = setup.manager.contract(&setup.pool).unwrap();
        assert_eq!(contract.total_presents(), 3);
        assert_eq!(contract.present_id(2).unwrap(), 2);
        assert!(contract.present_id(3).is_err());
    }

    #[test]
    fn test_holder_cannot_be_receiver() {
        let mut setup = TestSetup::new();
        let (a, b) = (setup.a, setup.b);
        let unlock_time = setup.now();
        let err = setup
            .call(a, PresentPoolCall::CreatePresent { holder: b, receiver: b, unlock_time })
            .unwrap_err();
        assert_eq!(err, ContractError::InvalidReceiver);
        assert_eq!(setup.manager.contract(&setup.pool).unwrap().total_presents(), 0);
    }

    #[test]
    fn test_pool_account_cannot_receive_or_hold() {
        let mut setup = TestSetup::new();
        let (a, pool) = (setup.a, setup.pool);
        let unlock_time = setup.now();

        let err = setup
            .call(a, PresentPoolCall::CreatePresent { holder: a, receiver: pool, unlock_time })
            .unwrap_err();
        assert_eq!(err, ContractError::InvalidReceiver);
        let err = setup
            .call(a, PresentPoolCall::CreatePresent { holder: pool, receiver: a, unlock_time })
            .unwrap_err();
        assert_eq!(err, ContractError::InvalidReceiver);

        assert_eq!(setup.manager.contract(&setup.pool).unwrap().total_presents(), 0);
        assert_eq!(setup.balance(&pool), 0);
    }

    #[test]
    fn test_non_member_cannot_create() {
        let mut setup = TestSetup::new();
        let (outsider, b) = (setup.outsider, setup.b);
        let unlock_time = setup.now();
        let err = setup
            .call(outsider, PresentPoolCall::CreatePresent { holder: outsider, receiver: b, unlock_time })
            .unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized { .. }));
    }

    #[test]
    fn test_holder_and_receiver_need_not_be_members() {
        let mut setup = TestSetup::new();
        let (a, outsider) = (setup.a, setup.outsider);
        let stranger = crate::account(9);
        assert_eq!(setup.create_present(a, outsider, stranger, Duration::zero()), 0);
    }
}

mod add_amount {
    use super::*;

    #[test]
    fn test_contributions_accumulate() {
        let mut setup = TestSetup::new();
        let (a, b, c) = (setup.a, setup.b, setup.c);
        let id = setup.create_present(a, a, b, Duration::seconds(60));

        setup.add_amount(a, id, 100).unwrap();
        setup.add_amount(c, id, 250).unwrap();
        let receipt = setup.add_amount(b, id, 1).unwrap();

        assert_eq!(receipt.result, PresentPoolReturn::AmountAdded { present_id: id, new_total: 351 });
        assert_eq!(
            receipt.events[0].decode().unwrap(),
            PresentPoolEvent::AddedAmountToPresent { present_id: id, contributor: b, amount: 1 }
        );
        assert_eq!(setup.balance(&setup.pool), 351);
        assert_eq!(setup.balance(&c), crate::INITIAL_BALANCE - 250);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut setup = TestSetup::new();
        let (a, b) = (setup.a, setup.b);
        let id = setup.create_present(a, a, b, Duration::zero());
        assert_eq!(setup.add_amount(a, id, 0).unwrap_err(), ContractError::ZeroAmount);
    }

    #[test]
    fn test_unknown_present() {
        let mut setup = TestSetup::new();
        let a = setup.a;
        assert_eq!(
            setup.add_amount(a, 7, 10).unwrap_err(),
            ContractError::PresentNotFound { present_id: 7 }
        );
        assert_eq!(setup.balance(&a), crate::INITIAL_BALANCE);
    }

    #[test]
    fn test_non_member_cannot_contribute() {
        let mut setup = TestSetup::new();
        let (a, b, outsider) = (setup.a, setup.b, setup.outsider);
        let id = setup.create_present(a, a, b, Duration::zero());
        assert!(matches!(
            setup.add_amount(outsider, id, 10).unwrap_err(),
            ContractError::Unauthorized { .. }
        ));
        assert_eq!(setup.balance(&outsider), crate::INITIAL_BALANCE);
        assert_eq!(setup.balance(&setup.pool), 0);
    }

    #[test]
    fn test_sent_present_is_closed() {
        let mut setup = TestSetup::new();
        let (a, b) = (setup.a, setup.b);
        let id = setup.create_present(a, a, b, Duration::zero());
        setup.add_amount(a, id, 10).unwrap();
        setup.send_present(a, id).unwrap();

        assert_eq!(
            setup.add_amount(b, id, 10).unwrap_err(),
            ContractError::AlreadySent { present_id: id }
        );
    }
}

mod send_present {
    use super::*;

    #[test]
    fn test_holder_sends_after_unlock() {
        let mut setup = TestSetup::new();
        let (a, b, c) = (setup.a, setup.b, setup.c);
        let id = setup.create_present(a, c, b, Duration::seconds(60));
        setup.add_amount(a, id, 500).unwrap();

        setup.clock.advance(Duration::seconds(60));
        let receipt = setup.send_present(c, id).unwrap();
        assert_eq!(receipt.result, PresentPoolReturn::PresentSent { present_id: id, receiver: b, amount: 500 });
        assert_eq!(
            receipt.events[0].decode().unwrap(),
            PresentPoolEvent::SentPresent { present_id: id, receiver: b, amount: 500 }
        );

        let present = setup.manager.contract(&setup.pool).unwrap().present(id).unwrap().clone();
        assert!(present.sent);
        assert_eq!(present.sent_at, Some(setup.now()));
        assert_eq!(setup.balance(&b), crate::INITIAL_BALANCE + 500);
    }

    #[test]
    fn test_too_early() {
        let mut setup = TestSetup::new();
        let (a, b) = (setup.a, setup.b);
        let id = setup.create_present(a, a, b, Duration::seconds(60));
        setup.add_amount(a, id, 5).unwrap();

        setup.clock.advance(Duration::seconds(59));
        assert!(matches!(setup.send_present(a, id).unwrap_err(), ContractError::TooEarly { .. }));
        assert_eq!(setup.balance(&setup.pool), 5);
    }

    #[test]
    fn test_only_holder_sends() {
        let mut setup = TestSetup::new();
        let (a, b, c) = (setup.a, setup.b, setup.c);
        let id = setup.create_present(a, a, b, Duration::zero());
        assert!(matches!(setup.send_present(c, id).unwrap_err(), ContractError::Unauthorized { .. }));
        // Le destinataire n'est pas non plus le détenteur
        assert!(matches!(setup.send_present(b, id).unwrap_err(), ContractError::Unauthorized { .. }));
    }

    #[test]
    fn test_holder_must_still_be_member() {
        let mut setup = TestSetup::new();
        let (a, b, outsider) = (setup.a, setup.b, setup.outsider);
        let id = setup.create_present(a, outsider, b, Duration::zero());
        assert!(matches!(
            setup.send_present(outsider, id).unwrap_err(),
            ContractError::Unauthorized { .. }
        ));

        setup.call(a, PresentPoolCall::AddMember { candidate: outsider }).unwrap();
        assert!(setup.send_present(outsider, id).is_ok());
    }

    #[test]
    fn test_sent_only_once() {
        let mut setup = TestSetup::new();
        let (a, b) = (setup.a, setup.b);
        let id = setup.create_present(a, a, b, Duration::zero());
        setup.add_amount(a, id, 42).unwrap();
        setup.send_present(a, id).unwrap();

        assert_eq!(setup.send_present(a, id).unwrap_err(), ContractError::AlreadySent { present_id: id });
        assert_eq!(setup.balance(&b), crate::INITIAL_BALANCE + 42);
    }

    #[test]
    fn test_unknown_present() {
        let mut setup = TestSetup::new();
        let a = setup.a;
        assert_eq!(
            setup.send_present(a, 0).unwrap_err(),
            ContractError::PresentNotFound { present_id: 0 }
        );
    }

    #[test]
    fn test_rejected_transfer_keeps_present_open() {
        let mut setup = TestSetup::new();
        let (a, b) = (setup.a, setup.b);
        let id = setup.create_present(a, a, b, Duration::zero());
        setup.add_amount(a, id, 30).unwrap();

        setup.manager.ledger_mut().reject_incoming(b);
        assert!(matches!(
            setup.send_present(a, id).unwrap_err(),
            ContractError::TransferRejected { .. }
        ));
        assert!(!setup.manager.contract(&setup.pool).unwrap().present(id).unwrap().sent);

        // Toujours ouvert : les contributions restent possibles
        setup.add_amount(a, id, 5).unwrap();
        setup.manager.ledger_mut().accept_incoming(&b);
        setup.send_present(a, id).unwrap();
        assert_eq!(setup.balance(&b), crate::INITIAL_BALANCE + 35);
    }
}
