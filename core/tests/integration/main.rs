//! Tests d'intégration pour PresentPool
//!
//! Chaque scénario part d'un gestionnaire neuf avec trois membres fondateurs
//! et des comptes crédités, piloté par une horloge manuelle.

mod end_to_end;
mod pool;

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use presentpool_core::contracts::{Clock, ManualClock};
use presentpool_core::crypto::{generate_keypair_from_seed, Address};
use presentpool_core::{
    ContractManager, ContractResult, InMemoryLedger, PoolConfig, PresentPoolCall,
    PresentPoolReturn, Receipt, Transaction,
};

/// Solde initial de chaque compte de test
pub const INITIAL_BALANCE: u64 = 1_000_000;

/// Setup de test commun
pub struct TestSetup {
    pub manager: ContractManager,
    pub clock: ManualClock,
    pub pool: Address,
    /// Membres fondateurs
    pub a: Address,
    pub b: Address,
    pub c: Address,
    /// Compte extérieur au pool
    pub outsider: Address,
}

pub fn account(seed: u8) -> Address {
    generate_keypair_from_seed(&[seed; 32])
        .expect("seed keypair")
        .address()
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        let clock = ManualClock::new(Utc::now());
        let mut manager = ContractManager::new(InMemoryLedger::new(), Arc::new(clock.clone()));

        let (a, b, c, outsider) = (account(1), account(2), account(3), account(4));
        for who in [a, b, c, outsider] {
            manager.ledger_mut().credit(who, INITIAL_BALANCE).unwrap();
        }

        let pool = manager.deploy(a, vec![a, b, c], config).unwrap();

        Self { manager, clock, pool, a, b, c, outsider }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn call(&mut self, caller: Address, call: PresentPoolCall) -> ContractResult<Receipt> {
        self.manager.execute(self.pool, Transaction::new(caller, call))
    }

    pub fn pay(&mut self, caller: Address, call: PresentPoolCall, value: u64) -> ContractResult<Receipt> {
        self.manager.execute(self.pool, Transaction::new(caller, call).with_value(value))
    }

    /// Crée un cadeau débloqué dans `unlock_in` et retourne son id
    pub fn create_present(
        &mut self,
        caller: Address,
        holder: Address,
        receiver: Address,
        unlock_in: Duration,
    ) -> u64 {
        let unlock_time = self.now() + unlock_in;
        let receipt = self
            .call(caller, PresentPoolCall::CreatePresent { holder, receiver, unlock_time })
            .unwrap();
        match receipt.result {
            PresentPoolReturn::PresentCreated { present_id } => present_id,
            other => panic!("unexpected result {:?}", other),
        }
    }

    pub fn add_amount(&mut self, caller: Address, present_id: u64, amount: u64) -> ContractResult<Receipt> {
        self.pay(caller, PresentPoolCall::AddAmount { present_id }, amount)
    }

    pub fn send_present(&mut self, caller: Address, present_id: u64) -> ContractResult<Receipt> {
        self.call(caller, PresentPoolCall::SendPresent { present_id })
    }

    pub fn balance(&self, who: &Address) -> u64 {
        self.manager.balance(who)
    }
}
