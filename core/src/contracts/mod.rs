//! Module de smart contracts pour PresentPool
//!
//! Ce module implémente le contrat de cagnotte de cadeaux (membres, cadeaux,
//! contributions et envoi temporisé), son contexte d'exécution, l'encodage
//! de ses events et le gestionnaire qui exécute les transactions de façon
//! atomique.

pub mod abi;
pub mod context;
pub mod manager;
pub mod present_pool;

// Re-exports pour l'interface publique
pub use abi::{ContractEvent, PresentPoolEvent};
pub use context::{Clock, ContractContext, ExecutionEnvironment, ManualClock, SystemClock, TokenTransfer};
pub use manager::{ContractManager, Deployment, Receipt, Transaction};
pub use present_pool::{
    Member, Present, PresentPoolCall, PresentPoolContract, PresentPoolReturn, PresentPoolState,
    PresentPoolStats,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::crypto::Address;

/// Type de résultat pour les opérations de contrats
pub type ContractResult<T> = std::result::Result<T, ContractError>;

/// Erreurs spécifiques aux smart contracts
///
/// Toute erreur annule l'appel entier : aucun changement d'état partiel n'est
/// conservé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ContractError {
    #[error("Erreur d'autorisation: {message}")]
    Unauthorized { message: String },

    #[error("Déjà membre: {member}")]
    AlreadyMember { member: Address },

    #[error("Le destinataire doit être différent du détenteur")]
    InvalidReceiver,

    #[error("Cadeau non trouvé: {present_id}")]
    PresentNotFound { present_id: u64 },

    #[error("Cadeau déjà envoyé: {present_id}")]
    AlreadySent { present_id: u64 },

    #[error("Le montant doit être strictement positif")]
    ZeroAmount,

    #[error("Trop tôt: déblocage à {unlock_time}, maintenant {now}")]
    TooEarly { unlock_time: DateTime<Utc>, now: DateTime<Utc> },

    #[error("Date de déblocage dans le passé: {unlock_time}")]
    UnlockTimeInPast { unlock_time: DateTime<Utc> },

    #[error("Dépassement de capacité sur un montant")]
    AmountOverflow,

    #[error("La fonction {function} n'accepte pas de valeur")]
    NonPayable { function: String },

    #[error("Fonds insuffisants: requis {required}, disponible {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Transfert refusé vers {to}: {message}")]
    TransferRejected { to: Address, message: String },

    #[error("Contrat non trouvé: {address}")]
    ContractNotFound { address: Address },

    #[error("Paramètres invalides: {message}")]
    InvalidParameters { message: String },

    #[error("État de contrat invalide: {message}")]
    InvalidState { message: String },

    #[error("Erreur de sérialisation: {message}")]
    Serialization { message: String },
}

impl ContractError {
    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        ContractError::Unauthorized { message: message.into() }
    }
}

/// Version d'un smart contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ContractVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl std::fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Métadonnées d'un smart contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub name: String,
    pub version: ContractVersion,
    pub description: String,
    pub license: String,
}

/// Interface principale pour les smart contracts
pub trait SmartContract {
    type State: Clone + Serialize + for<'de> Deserialize<'de>;
    type CallData: Serialize + for<'de> Deserialize<'de>;
    type ReturnData: Serialize + for<'de> Deserialize<'de>;

    /// Exécute un appel de fonction sur le contrat
    fn call(
        &mut self,
        call_data: Self::CallData,
        context: &mut ContractContext<'_>,
    ) -> ContractResult<Self::ReturnData>;

    /// Indique si l'appel accepte une valeur attachée
    fn is_payable(call_data: &Self::CallData) -> bool;

    /// Obtient l'état actuel du contrat
    fn get_state(&self) -> &Self::State;

    /// Met à jour l'état du contrat
    fn set_state(&mut self, state: Self::State);

    /// Obtient les métadonnées du contrat
    fn metadata(&self) -> ContractMetadata;
}
