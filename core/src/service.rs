//! Service asynchrone au-dessus du gestionnaire de contrats
//!
//! Les soumissions concurrentes sont sérialisées par un verrou en écriture :
//! une transaction s'exécute entièrement avant que la suivante ne commence.

use std::sync::Arc;
use tokio::sync::RwLock;
use crate::config::PoolConfig;
use crate::contracts::{
    ContractEvent, ContractManager, Present, PresentPoolCall, Receipt, Transaction,
};
use crate::crypto::Address;
use crate::error::Result;
use crate::ledger::{InMemoryLedger, LedgerProvider};

/// Point d'entrée partagé pour soumettre des transactions
pub struct PoolService<L: LedgerProvider = InMemoryLedger> {
    manager: Arc<RwLock<ContractManager<L>>>,
}

impl<L: LedgerProvider> Clone for PoolService<L> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl<L: LedgerProvider + Send + Sync> PoolService<L> {
    pub fn new(manager: ContractManager<L>) -> Self {
        Self {
            manager: Arc::new(RwLock::new(manager)),
        }
    }

    /// Déploie un nouveau pool
    pub async fn deploy(
        &self,
        deployer: Address,
        initial_members: Vec<Address>,
        config: PoolConfig,
    ) -> Result<Address> {
        let mut manager = self.manager.write().await;
        Ok(manager.deploy(deployer, initial_members, config)?)
    }

    /// Soumet une transaction ; elle est validée entièrement ou pas du tout
    pub async fn submit(&self, contract: Address, tx: Transaction) -> Result<Receipt> {
        let mut manager = self.manager.write().await;
        Ok(manager.execute(contract, tx)?)
    }

    pub async fn add_member(&self, contract: Address, caller: Address, candidate: Address) -> Result<Receipt> {
        self.submit(contract, Transaction::new(caller, PresentPoolCall::AddMember { candidate }))
            .await
    }

    pub async fn add_amount(
        &self,
        contract: Address,
        caller: Address,
        present_id: u64,
        amount: u64,
    ) -> Result<Receipt> {
        let tx = Transaction::new(caller, PresentPoolCall::AddAmount { present_id }).with_value(amount);
        self.submit(contract, tx).await
    }

    pub async fn send_present(&self, contract: Address, caller: Address, present_id: u64) -> Result<Receipt> {
        self.submit(contract, Transaction::new(caller, PresentPoolCall::SendPresent { present_id }))
            .await
    }

    /// Lecture cohérente de l'état du gestionnaire
    pub async fn read<R>(&self, f: impl FnOnce(&ContractManager<L>) -> R) -> R {
        let manager = self.manager.read().await;
        f(&manager)
    }

    /// Accès exclusif, hors transaction (crédits initiaux, réglages du ledger)
    pub async fn write<R>(&self, f: impl FnOnce(&mut ContractManager<L>) -> R) -> R {
        let mut manager = self.manager.write().await;
        f(&mut manager)
    }

    pub async fn is_member(&self, contract: Address, address: Address) -> Result<bool> {
        self.read(|m| -> Result<bool> { Ok(m.contract(&contract)?.is_member(&address)) }).await
    }

    pub async fn total_presents(&self, contract: Address) -> Result<u64> {
        self.read(|m| -> Result<u64> { Ok(m.contract(&contract)?.total_presents()) }).await
    }

    pub async fn present(&self, contract: Address, index: u64) -> Result<Present> {
        self.read(|m| -> Result<Present> { Ok(m.contract(&contract)?.present(index)?.clone()) }).await
    }

    pub async fn balance(&self, account: Address) -> u64 {
        self.read(|m| m.balance(&account)).await
    }

    pub async fn events(&self) -> Vec<ContractEvent> {
        self.read(|m| m.event_log().to_vec()).await
    }
}
