//! Fonctions de hachage pour PresentPool
//!
//! Blake3 pour les topics d'events et les identifiants, SHA-3 en alternative
//! pour les racines d'état.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::{CryptoError, Result};

/// Taille standard d'un hash en bytes
pub const HASH_SIZE: usize = 32;

/// Représentation d'un hash de 256 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

/// Algorithmes de hachage supportés
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// Blake3 - Rapide, cryptographiquement sûr
    #[default]
    Blake3,
    /// SHA-3 256 - Standard NIST
    Sha3,
}

impl Hash {
    /// Crée un nouveau hash à partir d'un array de bytes
    pub fn new(data: [u8; HASH_SIZE]) -> Self {
        Self(data)
    }

    /// Crée un hash à partir d'un slice de bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HASH_SIZE {
            return Err(CryptoError::InvalidHashLength {
                expected: HASH_SIZE,
                actual: bytes.len(),
            }.into());
        }
        let mut array = [0u8; HASH_SIZE];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    /// Crée un hash à partir d'une string hexadécimale
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str).map_err(CryptoError::from)?;
        Self::from_bytes(&bytes)
    }

    /// Retourne les bytes du hash
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hash vide (utilisé pour les tests et cas spéciaux)
    pub fn zero() -> Self {
        Self([0u8; HASH_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Calcule un hash Blake3 des données
pub fn compute_blake3(data: &[u8]) -> Hash {
    let hash_bytes = blake3::hash(data);
    Hash::new(*hash_bytes.as_bytes())
}

/// Calcule un hash SHA-3 256 des données
pub fn compute_sha3(data: &[u8]) -> Hash {
    use sha3::{Digest, Sha3_256};
    Hash::new(Sha3_256::digest(data).into())
}

/// Calcule un hash selon l'algorithme spécifié
pub fn compute_hash(data: &[u8], algorithm: HashAlgorithm) -> Hash {
    match algorithm {
        HashAlgorithm::Blake3 => compute_blake3(data),
        HashAlgorithm::Sha3 => compute_sha3(data),
    }
}

/// Calcule un hash de plusieurs éléments concaténés
pub fn compute_combined_hash(elements: &[&[u8]], algorithm: HashAlgorithm) -> Hash {
    compute_hash(&elements.concat(), algorithm)
}
