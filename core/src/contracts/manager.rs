//! Gestionnaire de smart contracts pour PresentPool
//!
//! Le gestionnaire possède le ledger, l'horloge et les contrats déployés. Chaque
//! transaction est exécutée de façon atomique : si l'appel échoue, ou si l'un
//! des transferts qu'il a mis en file est refusé, l'état du contrat et les
//! soldes sont remis tels qu'ils étaient avant l'appel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use crate::config::PoolConfig;
use crate::contracts::{
    Clock, ContractContext, ContractError, ContractEvent, ContractResult, ExecutionEnvironment,
    PresentPoolCall, PresentPoolContract, PresentPoolReturn, SmartContract, SystemClock,
    TokenTransfer,
};
use crate::crypto::{compute_blake3, compute_combined_hash, Address, Hash, HashAlgorithm};
use crate::ledger::{InMemoryLedger, LedgerProvider};
use crate::serialization::canonical_bytes;

/// Transaction adressée à un contrat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Compte appelant
    pub caller: Address,
    /// Valeur attachée à l'appel (uniquement pour les fonctions payantes)
    pub value: u64,
    pub call: PresentPoolCall,
}

impl Transaction {
    pub fn new(caller: Address, call: PresentPoolCall) -> Self {
        Self { caller, value: 0, call }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    /// Hash de la transaction pour un nonce donné
    pub fn hash(&self, nonce: u64) -> ContractResult<Hash> {
        let bytes = canonical_bytes(&(self, nonce))
            .map_err(|e| ContractError::Serialization { message: e.to_string() })?;
        Ok(compute_blake3(&bytes))
    }
}

/// Reçu d'une transaction validée
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: Hash,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub contract: Address,
    pub caller: Address,
    pub function: String,
    pub value: u64,
    pub result: PresentPoolReturn,
    pub events: Vec<ContractEvent>,
    pub logs: Vec<String>,
    pub transfers: Vec<TokenTransfer>,
}

/// Statistiques d'utilisation d'un contrat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUsageStats {
    pub total_calls: u64,
    pub total_errors: u64,
    pub total_rollbacks: u64,
    pub last_call: Option<DateTime<Utc>>,
}

/// Contrat déployé
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Adresse du contrat, qui est aussi son compte d'escrow
    pub address: Address,
    pub contract: PresentPoolContract,
    pub deployer: Address,
    pub deployed_at: DateTime<Utc>,
    pub usage_stats: ContractUsageStats,
}

/// Gestionnaire principal des smart contracts
pub struct ContractManager<L: LedgerProvider = InMemoryLedger> {
    ledger: L,
    clock: Arc<dyn Clock>,
    deployments: HashMap<Address, Deployment>,
    /// Dernier bloc validé
    block_number: u64,
    /// Nombre de transactions validées et de déploiements
    nonce: u64,
    event_log: Vec<ContractEvent>,
}

impl ContractManager<InMemoryLedger> {
    /// Gestionnaire avec un ledger vide et l'horloge système
    pub fn in_memory() -> Self {
        Self::new(InMemoryLedger::new(), Arc::new(SystemClock))
    }
}

impl<L: LedgerProvider> ContractManager<L> {
    /// Crée un nouveau gestionnaire de contrats
    pub fn new(ledger: L, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            clock,
            deployments: HashMap::new(),
            block_number: 0,
            nonce: 0,
            event_log: Vec::new(),
        }
    }

    /// Déploie un pool et retourne son adresse
    pub fn deploy(
        &mut self,
        deployer: Address,
        initial_members: Vec<Address>,
        config: PoolConfig,
    ) -> ContractResult<Address> {
        config.validate().map_err(|e| ContractError::InvalidParameters {
            message: e.to_string(),
        })?;

        let now = self.clock.now();
        let contract = PresentPoolContract::new(initial_members, config, now)?;
        let address = self.generate_contract_address(&deployer);

        tracing::info!(
            "Pool {} déployé par {} avec {} membres",
            address.short(), deployer.short(), contract.member_count()
        );

        self.deployments.insert(address, Deployment {
            address,
            contract,
            deployer,
            deployed_at: now,
            usage_stats: ContractUsageStats::default(),
        });
        self.nonce += 1;

        Ok(address)
    }

    /// Exécute une transaction sur un contrat déployé
    pub fn execute(&mut self, contract_address: Address, tx: Transaction) -> ContractResult<Receipt> {
        let function = tx.call.function_name();
        let transaction_hash = tx.hash(self.nonce)?;
        let deployment = self.deployments
            .get_mut(&contract_address)
            .ok_or(ContractError::ContractNotFound { address: contract_address })?;

        let now = self.clock.now();
        deployment.usage_stats.total_calls += 1;
        deployment.usage_stats.last_call = Some(now);

        if tx.value > 0 && !PresentPoolContract::is_payable(&tx.call) {
            deployment.usage_stats.total_errors += 1;
            tracing::warn!("{} refusé: valeur envoyée à une fonction non payante", function);
            return Err(ContractError::NonPayable { function: function.to_string() });
        }

        let available = self.ledger.balance(&tx.caller);
        if available < tx.value {
            deployment.usage_stats.total_errors += 1;
            tracing::warn!("{} refusé: solde de {} insuffisant", function, tx.caller.short());
            return Err(ContractError::InsufficientFunds {
                required: tx.value,
                available,
            });
        }

        let snapshot = deployment.contract.get_state().clone();
        let environment = ExecutionEnvironment {
            block_number: self.block_number + 1,
            block_timestamp: now,
            transaction_hash,
            contract_address,
            caller_address: tx.caller,
            value_sent: tx.value,
        };

        let mut context = ContractContext::new(environment, &self.ledger);
        let result = deployment.contract.call(tx.call.clone(), &mut context);
        let outcome = context.finalize();

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                deployment.contract.set_state(snapshot);
                deployment.usage_stats.total_errors += 1;
                tracing::warn!("{} rejeté pour {}: {}", function, tx.caller.short(), err);
                return Err(err);
            }
        };
        tracing::debug!("{} accepté pour {}", function, tx.caller.short());

        if let Err(err) = Self::settle(
            &mut self.ledger,
            &tx.caller,
            &contract_address,
            tx.value,
            &outcome.token_transfers,
        ) {
            deployment.contract.set_state(snapshot);
            deployment.usage_stats.total_errors += 1;
            deployment.usage_stats.total_rollbacks += 1;
            tracing::warn!("{} annulé, règlement impossible: {}", function, err);
            return Err(err);
        }

        // Un appel sans event, transfert ni valeur est une lecture : pas de bloc
        let read_only = outcome.events.is_empty() && outcome.token_transfers.is_empty() && tx.value == 0;
        if read_only {
            tracing::debug!("{} en lecture seule, aucun bloc produit", function);
        } else {
            self.block_number += 1;
            self.nonce += 1;
            self.event_log.extend(outcome.events.iter().cloned());

            tracing::info!(
                "Bloc {}: {} validé ({} events, {} transferts)",
                self.block_number, function, outcome.events.len(), outcome.token_transfers.len()
            );
        }

        Ok(Receipt {
            transaction_hash,
            block_number: self.block_number,
            timestamp: now,
            contract: contract_address,
            caller: tx.caller,
            function: function.to_string(),
            value: tx.value,
            result,
            events: outcome.events,
            logs: outcome.logs,
            transfers: outcome.token_transfers,
        })
    }

    /// Applique la valeur de l'appel puis les transferts en file ; en cas
    /// d'échec, les mouvements déjà appliqués sont annulés
    fn settle(
        ledger: &mut L,
        caller: &Address,
        contract_address: &Address,
        value: u64,
        transfers: &[TokenTransfer],
    ) -> ContractResult<()> {
        let mut applied: Vec<(Address, Address, u64)> = Vec::new();

        let movements = std::iter::once((*caller, *contract_address, value))
            .chain(transfers.iter().map(|t| (t.from, t.to, t.amount)))
            .filter(|(_, _, amount)| *amount > 0);

        for (from, to, amount) in movements {
            if let Err(err) = ledger.transfer(&from, &to, amount) {
                for (from, to, amount) in applied.iter().rev() {
                    if let Err(undo) = ledger.reverse(from, to, *amount) {
                        tracing::error!(
                            "Impossible d'annuler le transfert de {} de {} vers {}: {}",
                            amount, from.short(), to.short(), undo
                        );
                    }
                }
                return Err(err);
            }
            applied.push((from, to, amount));
        }

        Ok(())
    }

    fn generate_contract_address(&self, deployer: &Address) -> Address {
        Address::from_hash(compute_combined_hash(
            &[b"PresentPool", deployer.as_bytes(), &self.nonce.to_le_bytes()],
            HashAlgorithm::Blake3,
        ))
    }

    /// Contrat déployé à l'adresse donnée
    pub fn contract(&self, address: &Address) -> ContractResult<&PresentPoolContract> {
        self.deployment(address).map(|d| &d.contract)
    }

    pub fn deployment(&self, address: &Address) -> ContractResult<&Deployment> {
        self.deployments
            .get(address)
            .ok_or(ContractError::ContractNotFound { address: *address })
    }

    pub fn deployments(&self) -> impl Iterator<Item = &Deployment> {
        self.deployments.values()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Accès direct au ledger, hors transaction (crédits initiaux, tests)
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.ledger.balance(account)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Tous les events validés, dans l'ordre
    pub fn event_log(&self) -> &[ContractEvent] {
        &self.event_log
    }

    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ContractEvent> + 'a {
        self.event_log.iter().filter(move |e| e.name == name)
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }
}
