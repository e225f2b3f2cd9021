//! Types d'erreurs pour PresentPool Core

use thiserror::Error;

use crate::contracts::ContractError;

/// Type de résultat standard pour le module core
pub type Result<T> = std::result::Result<T, CoreError>;

/// Erreurs principales du module core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Erreur cryptographique: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Erreur de contrat: {0}")]
    Contract(#[from] ContractError),

    #[error("Erreur de sérialisation: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Erreur de configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Erreur interne: {message}")]
    Internal { message: String },
}

/// Erreurs cryptographiques
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Clé publique invalide")]
    InvalidPublicKey,

    #[error("Clé privée invalide")]
    InvalidPrivateKey,

    #[error("Hash invalide: longueur attendue {expected}, reçue {actual}")]
    InvalidHashLength { expected: usize, actual: usize },

    #[error("Adresse invalide: longueur attendue {expected}, reçue {actual}")]
    InvalidAddressLength { expected: usize, actual: usize },

    #[error("Erreur de décodage hexadécimal: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

/// Erreurs de sérialisation
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Erreur bincode: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Erreur CBOR: {0}")]
    Cbor(String),

    #[error("Erreur JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Format non supporté: {format}")]
    UnsupportedFormat { format: String },
}

/// Erreurs de configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Lecture du fichier de configuration impossible: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration JSON invalide: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Valeur de configuration invalide pour '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
