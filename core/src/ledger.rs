//! Ledger de soldes natifs utilisé par les contrats
//!
//! Le contrat ne manipule jamais les soldes directement : il met en file des
//! transferts dans son contexte, et le [`ContractManager`](crate::contracts::ContractManager)
//! les applique via un [`LedgerProvider`] une fois l'appel réussi.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use crate::contracts::{ContractError, ContractResult};
use crate::crypto::Address;

/// Nombre d'unités minimales dans une pièce
pub const UNITS_PER_COIN: u64 = 100_000_000;

/// Primitive de transfert de valeur fournie par l'environnement d'exécution
pub trait LedgerProvider {
    /// Solde disponible d'un compte
    fn balance(&self, account: &Address) -> u64;

    /// Transfère `amount` de `from` vers `to`.
    ///
    /// Un échec ne doit laisser aucun solde modifié.
    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> ContractResult<()>;

    /// Annule un transfert déjà appliqué (`to` rembourse `from`)
    fn reverse(&mut self, from: &Address, to: &Address, amount: u64) -> ContractResult<()> {
        self.transfer(to, from, amount)
    }
}

/// Ledger en mémoire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: HashMap<Address, u64>,
    /// Comptes qui refusent les transferts entrants
    rejecting: HashSet<Address>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crédite un compte hors transaction (genesis, faucet de test)
    pub fn credit(&mut self, account: Address, amount: u64) -> ContractResult<u64> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(ContractError::AmountOverflow)?;
        Ok(*balance)
    }

    /// Le compte refusera désormais tout transfert entrant
    pub fn reject_incoming(&mut self, account: Address) {
        self.rejecting.insert(account);
    }

    pub fn accept_incoming(&mut self, account: &Address) {
        self.rejecting.remove(account);
    }

    /// Somme de tous les soldes
    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| *b as u128).sum()
    }
}

impl LedgerProvider for InMemoryLedger {
    fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> ContractResult<()> {
        if amount == 0 || from == to {
            return Ok(());
        }

        if self.rejecting.contains(to) {
            return Err(ContractError::TransferRejected {
                to: *to,
                message: "le compte refuse les transferts entrants".to_string(),
            });
        }

        let available = self.balance(from);
        if available < amount {
            return Err(ContractError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        let credited = self.balance(to)
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    fn reverse(&mut self, from: &Address, to: &Address, amount: u64) -> ContractResult<()> {
        // Un remboursement ignore la liste de refus
        if self.rejecting.remove(from) {
            let result = self.transfer(to, from, amount);
            self.rejecting.insert(*from);
            result
        } else {
            self.transfer(to, from, amount)
        }
    }
}
