//! Events émis par le contrat PresentPool et leur encodage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::contracts::{ContractError, ContractResult};
use crate::crypto::{compute_hash, Address, Hash, HashAlgorithm};
use crate::serialization::{canonical_bytes, deserialize_with_format, SerializationFormat};

/// Event brut tel qu'enregistré par le contexte d'exécution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Nom de l'event
    pub name: String,
    /// Données encodées (bincode de [`PresentPoolEvent`])
    pub data: Vec<u8>,
    /// Topics indexés : hash du nom, puis champs indexés
    pub topics: Vec<Hash>,
    /// Compte du contrat émetteur
    pub contract_address: Address,
    /// Hash de la transaction
    pub transaction_hash: Hash,
    /// Numéro du bloc
    pub block_number: u64,
}

impl ContractEvent {
    /// Décode l'event typé
    pub fn decode(&self) -> ContractResult<PresentPoolEvent> {
        deserialize_with_format(&self.data, SerializationFormat::Bincode)
            .map_err(|e| ContractError::Serialization { message: e.to_string() })
    }
}

/// Events observables du contrat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentPoolEvent {
    AddMember {
        member: Address,
    },
    CreatedPresent {
        present_id: u64,
        holder: Address,
        receiver: Address,
        unlock_time: DateTime<Utc>,
    },
    AddedAmountToPresent {
        present_id: u64,
        contributor: Address,
        amount: u64,
    },
    SentPresent {
        present_id: u64,
        receiver: Address,
        amount: u64,
    },
}

impl PresentPoolEvent {
    pub const ADD_MEMBER: &'static str = "AddMember";
    pub const CREATED_PRESENT: &'static str = "CreatedPresent";
    pub const ADDED_AMOUNT_TO_PRESENT: &'static str = "AddedAmountToPresent";
    pub const SENT_PRESENT: &'static str = "SentPresent";

    pub fn name(&self) -> &'static str {
        match self {
            PresentPoolEvent::AddMember { .. } => Self::ADD_MEMBER,
            PresentPoolEvent::CreatedPresent { .. } => Self::CREATED_PRESENT,
            PresentPoolEvent::AddedAmountToPresent { .. } => Self::ADDED_AMOUNT_TO_PRESENT,
            PresentPoolEvent::SentPresent { .. } => Self::SENT_PRESENT,
        }
    }

    /// Topics indexés de l'event
    pub fn topics(&self, algorithm: HashAlgorithm) -> Vec<Hash> {
        let mut topics = vec![compute_hash(self.name().as_bytes(), algorithm)];
        match self {
            PresentPoolEvent::AddMember { member } => {
                topics.push(Hash::new(*member.as_bytes()));
            }
            PresentPoolEvent::CreatedPresent { present_id, holder, receiver, .. } => {
                topics.push(compute_hash(&present_id.to_le_bytes(), algorithm));
                topics.push(Hash::new(*holder.as_bytes()));
                topics.push(Hash::new(*receiver.as_bytes()));
            }
            PresentPoolEvent::AddedAmountToPresent { present_id, contributor, .. } => {
                topics.push(compute_hash(&present_id.to_le_bytes(), algorithm));
                topics.push(Hash::new(*contributor.as_bytes()));
            }
            PresentPoolEvent::SentPresent { present_id, receiver, .. } => {
                topics.push(compute_hash(&present_id.to_le_bytes(), algorithm));
                topics.push(Hash::new(*receiver.as_bytes()));
            }
        }
        topics
    }

    /// Encode les données et topics de l'event
    pub fn encode(&self, algorithm: HashAlgorithm) -> ContractResult<(Vec<u8>, Vec<Hash>)> {
        let data = canonical_bytes(self)
            .map_err(|e| ContractError::Serialization { message: e.to_string() })?;
        Ok((data, self.topics(algorithm)))
    }
}
