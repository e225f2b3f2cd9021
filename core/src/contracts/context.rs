//! Contexte d'exécution pour les smart contracts

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use crate::contracts::{ContractError, ContractEvent, ContractResult};
use crate::crypto::{compute_blake3, Address, Hash};
use crate::ledger::LedgerProvider;

/// Source de temps de l'environnement d'exécution
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Horloge système
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Horloge pilotée manuellement (tests, simulations)
///
/// Les clones partagent le même instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Avance l'horloge
    pub fn advance(&self, delta: Duration) {
        self.millis.fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis.store(instant.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Informations sur l'environnement d'exécution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEnvironment {
    /// Numéro du bloc courant
    pub block_number: u64,
    /// Timestamp du bloc courant, échantillonné une fois par appel
    pub block_timestamp: DateTime<Utc>,
    /// Hash de la transaction courante
    pub transaction_hash: Hash,
    /// Compte d'escrow du contrat en cours d'exécution
    pub contract_address: Address,
    /// Adresse qui a appelé le contrat
    pub caller_address: Address,
    /// Valeur envoyée avec l'appel
    pub value_sent: u64,
}

/// Transfert de tokens effectué par un contrat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

/// Effets produits par un appel réussi
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub logs: Vec<String>,
    pub events: Vec<ContractEvent>,
    pub token_transfers: Vec<TokenTransfer>,
}

/// Contexte d'exécution d'un smart contract
///
/// Les transferts sont seulement mis en file ; ils sont appliqués au ledger
/// après le retour du contrat.
pub struct ContractContext<'a> {
    /// Environnement d'exécution
    pub environment: ExecutionEnvironment,
    /// Accès en lecture aux soldes
    ledger: &'a dyn LedgerProvider,
    logs: Vec<String>,
    events: Vec<ContractEvent>,
    token_transfers: Vec<TokenTransfer>,
}

impl<'a> ContractContext<'a> {
    pub fn new(environment: ExecutionEnvironment, ledger: &'a dyn LedgerProvider) -> Self {
        Self {
            environment,
            ledger,
            logs: Vec::new(),
            events: Vec::new(),
            token_transfers: Vec::new(),
        }
    }

    /// Émet un log
    pub fn emit_log(&mut self, message: String) {
        self.logs.push(message);
    }

    /// Émet un event
    pub fn emit_event(&mut self, name: String, data: Vec<u8>, topics: Vec<Hash>) {
        self.events.push(ContractEvent {
            name,
            data,
            topics,
            contract_address: self.environment.contract_address,
            transaction_hash: self.environment.transaction_hash,
            block_number: self.environment.block_number,
        });
    }

    /// Met en file un transfert depuis le compte du contrat
    pub fn transfer_tokens(&mut self, to: Address, amount: u64) -> ContractResult<()> {
        let available = self.get_contract_balance()?;
        if available < amount {
            return Err(ContractError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        self.token_transfers.push(TokenTransfer {
            from: self.environment.contract_address,
            to,
            amount,
            timestamp: self.environment.block_timestamp,
        });

        Ok(())
    }

    /// Solde du contrat, valeur de l'appel incluse, transferts en file déduits
    pub fn get_contract_balance(&self) -> ContractResult<u64> {
        let held = self.ledger.balance(&self.environment.contract_address);
        let incoming = held
            .checked_add(self.environment.value_sent)
            .ok_or(ContractError::AmountOverflow)?;
        let queued: u64 = self.token_transfers.iter().map(|t| t.amount).sum();
        incoming.checked_sub(queued).ok_or_else(|| ContractError::InvalidState {
            message: "transferts en file supérieurs au solde du contrat".to_string(),
        })
    }

    pub fn get_balance(&self, address: &Address) -> u64 {
        self.ledger.balance(address)
    }

    pub fn compute_hash(&self, data: &[u8]) -> Hash {
        compute_blake3(data)
    }

    /// Obtient le timestamp courant
    pub fn get_timestamp(&self) -> DateTime<Utc> {
        self.environment.block_timestamp
    }

    /// Obtient l'adresse de l'appelant
    pub fn get_caller(&self) -> Address {
        self.environment.caller_address
    }

    pub fn get_contract_address(&self) -> Address {
        self.environment.contract_address
    }

    /// Obtient la valeur envoyée avec l'appel
    pub fn get_value(&self) -> u64 {
        self.environment.value_sent
    }

    /// Termine l'appel et rend ses effets
    pub fn finalize(self) -> ExecutionOutcome {
        ExecutionOutcome {
            logs: self.logs,
            events: self.events,
            token_transfers: self.token_transfers,
        }
    }

    pub fn get_logs(&self) -> &[String] {
        &self.logs
    }

    pub fn get_events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn get_token_transfers(&self) -> &[TokenTransfer] {
        &self.token_transfers
    }
}
