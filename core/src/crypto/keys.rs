//! Gestion des clés et des adresses de comptes pour PresentPool
//!
//! Les comptes sont identifiés par une [`Address`] dérivée d'une clé publique
//! Ed25519. Les comptes d'escrow des contrats dérivent leur adresse du hash
//! de déploiement.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use crate::crypto::hash::{compute_blake3, Hash};
use crate::error::{CoreError, CryptoError, Result};

/// Taille d'une clé publique Ed25519 en bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Taille d'une clé privée Ed25519 en bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Taille d'une adresse de compte en bytes
pub const ADDRESS_SIZE: usize = 32;

/// Clé publique Ed25519
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
}

/// Clé privée Ed25519
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
}

/// Paire de clés (publique + privée)
#[derive(Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

/// Adresse d'un compte (membre, destinataire ou escrow de contrat)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl PublicKey {
    /// Crée une clé publique à partir de bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidPublicKey.into());
        }

        let mut array = [0u8; PUBLIC_KEY_SIZE];
        array.copy_from_slice(bytes);

        let key = VerifyingKey::from_bytes(&array)
            .map_err(|_| CryptoError::InvalidPublicKey)?;

        Ok(Self { key })
    }

    /// Retourne les bytes de la clé publique
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.key.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Adresse de compte associée à cette clé
    pub fn address(&self) -> Address {
        Address::from_hash(compute_blake3(self.as_bytes()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl PrivateKey {
    /// Crée une clé privée à partir de bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(CryptoError::InvalidPrivateKey.into());
        }

        let mut array = [0u8; PRIVATE_KEY_SIZE];
        array.copy_from_slice(bytes);

        Ok(Self { key: SigningKey::from_bytes(&array) })
    }

    /// Obtient la clé publique correspondante
    pub fn public_key(&self) -> PublicKey {
        PublicKey { key: self.key.verifying_key() }
    }
}

// Debug pour PrivateKey ne doit pas révéler la clé
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"<hidden>")
            .finish()
    }
}

impl KeyPair {
    pub fn new(private_key: PrivateKey, public_key: PublicKey) -> Self {
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Adresse du compte contrôlé par cette paire
    pub fn address(&self) -> Address {
        self.public_key.address()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"<hidden>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl Address {
    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Adresse dérivée d'un hash (comptes d'escrow des contrats)
    pub fn from_hash(hash: Hash) -> Self {
        Self(*hash.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ADDRESS_SIZE {
            return Err(CryptoError::InvalidAddressLength {
                expected: ADDRESS_SIZE,
                actual: bytes.len(),
            }.into());
        }
        let mut array = [0u8; ADDRESS_SIZE];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str).map_err(CryptoError::from)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Forme courte pour les logs
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

// Les adresses sont sérialisées en hex pour rester utilisables comme clés JSON
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Génère une nouvelle paire de clés aléatoire
pub fn generate_keypair() -> Result<KeyPair> {
    let mut csprng = OsRng;
    let signing_key = SigningKey::generate(&mut csprng);
    let verifying_key = signing_key.verifying_key();

    let private_key = PrivateKey { key: signing_key };
    let public_key = PublicKey { key: verifying_key };

    Ok(KeyPair::new(private_key, public_key))
}

/// Génère une paire de clés déterministe à partir d'une seed
pub fn generate_keypair_from_seed(seed: &[u8; 32]) -> Result<KeyPair> {
    let signing_key = SigningKey::from_bytes(seed);
    let verifying_key = signing_key.verifying_key();

    let private_key = PrivateKey { key: signing_key };
    let public_key = PublicKey { key: verifying_key };

    Ok(KeyPair::new(private_key, public_key))
}
