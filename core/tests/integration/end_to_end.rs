//! Scénarios complets

use chrono::Duration;
use presentpool_core::contracts::{Clock, ManualClock};
use presentpool_core::{
    ContractManager, CoreError, ContractError, InMemoryLedger, PoolConfig, PoolService,
    PresentPoolEvent, PresentPoolReturn, UNITS_PER_COIN,
};
use std::sync::Arc;
use crate::{account, TestSetup, INITIAL_BALANCE};

#[test]
fn test_full_present_lifecycle() {
    let mut setup = TestSetup::new();
    let (a, b, c) = (setup.a, setup.b, setup.c);

    // c détient un cadeau pour b, débloqué dans une minute
    let id = setup.create_present(a, c, b, Duration::seconds(60));
    setup.add_amount(a, id, 1_000).unwrap();
    setup.add_amount(c, id, 2_000).unwrap();
    assert_eq!(setup.balance(&setup.pool), 3_000);

    assert!(matches!(setup.send_present(c, id).unwrap_err(), ContractError::TooEarly { .. }));

    setup.clock.advance(Duration::seconds(61));
    setup.send_present(c, id).unwrap();

    assert_eq!(setup.balance(&b), INITIAL_BALANCE + 3_000);
    assert_eq!(setup.balance(&a), INITIAL_BALANCE - 1_000);
    assert_eq!(setup.balance(&c), INITIAL_BALANCE - 2_000);
    assert_eq!(setup.balance(&setup.pool), 0);
    assert_eq!(setup.manager.ledger().total_supply(), 4 * INITIAL_BALANCE as u128);

    let names: Vec<&str> = setup.manager.event_log().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec![
        PresentPoolEvent::CREATED_PRESENT,
        PresentPoolEvent::ADDED_AMOUNT_TO_PRESENT,
        PresentPoolEvent::ADDED_AMOUNT_TO_PRESENT,
        PresentPoolEvent::SENT_PRESENT,
    ]);

    let contract = setup.manager.contract(&setup.pool).unwrap();
    let present = contract.present(id).unwrap();
    assert_eq!(present.contribution_of(&a), 1_000);
    assert_eq!(present.contribution_of(&c), 2_000);
    assert_eq!(contract.stats().total_released, 3_000);
    assert_eq!(contract.stats().total_presents_sent, 1);
}

#[test]
fn test_two_coin_present_for_b() {
    let mut setup = TestSetup::new();
    let (b, c) = (setup.b, setup.c);
    setup.manager.ledger_mut().credit(b, 2 * UNITS_PER_COIN).unwrap();

    let id = setup.create_present(c, c, b, Duration::seconds(60));
    setup.add_amount(b, id, 2 * UNITS_PER_COIN).unwrap();
    let before = setup.balance(&b);

    setup.clock.advance(Duration::seconds(60));
    let receipt = setup.send_present(c, id).unwrap();

    assert_eq!(setup.balance(&b), before + 2 * UNITS_PER_COIN);
    assert_eq!(
        receipt.result,
        PresentPoolReturn::PresentSent { present_id: id, receiver: b, amount: 2 * UNITS_PER_COIN }
    );
    assert_eq!(
        receipt.events[0].decode().unwrap(),
        PresentPoolEvent::SentPresent { present_id: id, receiver: b, amount: 2 * UNITS_PER_COIN }
    );
    assert!(setup.manager.contract(&setup.pool).unwrap().present(id).unwrap().sent);
}

#[test]
fn test_presents_are_independent() {
    let mut setup = TestSetup::new();
    let (a, b, c) = (setup.a, setup.b, setup.c);

    let early = setup.create_present(a, a, b, Duration::seconds(10));
    let late = setup.create_present(b, b, c, Duration::days(1));
    setup.add_amount(c, early, 10).unwrap();
    setup.add_amount(a, late, 20).unwrap();

    setup.clock.advance(Duration::seconds(10));
    setup.send_present(a, early).unwrap();
    assert!(matches!(setup.send_present(b, late).unwrap_err(), ContractError::TooEarly { .. }));

    let contract = setup.manager.contract(&setup.pool).unwrap();
    assert_eq!(contract.escrow_balance(), 20);
    assert_eq!(setup.balance(&setup.pool), 20);
    assert_eq!(contract.presents_held_by(&b).len(), 1);
    assert_eq!(contract.presents_for_receiver(&b)[0].id, early);
}

#[test]
fn test_sha3_pool_with_future_unlock_policy() {
    let config = PoolConfig::from_json_str(
        r#"{ "require_future_unlock": true, "hash_algorithm": "sha3", "max_presents": 2 }"#,
    ).unwrap();
    let mut setup = TestSetup::with_config(config);
    let (a, b) = (setup.a, setup.b);

    let unlock_time = setup.now();
    let err = setup
        .call(a, presentpool_core::PresentPoolCall::CreatePresent { holder: a, receiver: b, unlock_time })
        .unwrap_err();
    assert_eq!(err, ContractError::UnlockTimeInPast { unlock_time });

    setup.create_present(a, a, b, Duration::seconds(1));
    setup.create_present(a, a, b, Duration::seconds(1));
    let unlock_time = setup.now() + Duration::seconds(1);
    let err = setup
        .call(a, presentpool_core::PresentPoolCall::CreatePresent { holder: a, receiver: b, unlock_time })
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidParameters { .. }));
}

#[test]
fn test_snapshot_survives_restore() {
    let mut setup = TestSetup::new();
    let (a, b) = (setup.a, setup.b);
    let id = setup.create_present(a, a, b, Duration::seconds(5));
    setup.add_amount(b, id, 77).unwrap();

    let contract = setup.manager.contract(&setup.pool).unwrap();
    let bytes = contract.snapshot().unwrap();
    let restored = presentpool_core::PresentPoolContract::restore(&bytes, PoolConfig::default()).unwrap();
    assert_eq!(restored.state_root().unwrap(), contract.state_root().unwrap());
    assert_eq!(restored.present(id).unwrap().total_pooled, 77);
}

#[tokio::test]
async fn test_service_lifecycle() {
    let clock = ManualClock::new(chrono::Utc::now());
    let service = PoolService::new(ContractManager::new(InMemoryLedger::new(), Arc::new(clock.clone())));
    let (a, b, c) = (account(1), account(2), account(3));

    service.write(|m| {
        for who in [a, b, c] {
            m.ledger_mut().credit(who, 500).unwrap();
        }
    }).await;

    let pool = service.deploy(a, vec![a, b], PoolConfig::default()).await.unwrap();
    service.add_member(pool, b, c).await.unwrap();
    assert!(service.is_member(pool, c).await.unwrap());

    let unlock_time = clock.now() + Duration::seconds(30);
    service.submit(pool, presentpool_core::Transaction::new(
        c,
        presentpool_core::PresentPoolCall::CreatePresent { holder: c, receiver: a, unlock_time },
    )).await.unwrap();

    let contributions = [(a, 100), (b, 200), (c, 50)].map(|(who, amount)| {
        let service = service.clone();
        async move { service.add_amount(pool, who, 0, amount).await }
    });
    for result in futures::future::join_all(contributions).await {
        result.unwrap();
    }

    let err = service.send_present(pool, c, 0).await.unwrap_err();
    assert!(matches!(err, CoreError::Contract(ContractError::TooEarly { .. })));

    clock.advance(Duration::seconds(30));
    service.send_present(pool, c, 0).await.unwrap();

    assert_eq!(service.balance(a).await, 500 - 100 + 350);
    assert_eq!(service.balance(pool).await, 0);
    assert!(service.present(pool, 0).await.unwrap().sent);
}
