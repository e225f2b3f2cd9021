//! Module cryptographique pour PresentPool
//!
//! Fournit les primitives utilisées par le ledger :
//! - Fonctions de hachage (Blake3, SHA-3)
//! - Clés Ed25519 et adresses de comptes

pub mod hash;
pub mod keys;

pub use hash::{Hash, HashAlgorithm, compute_hash, compute_blake3, compute_sha3, compute_combined_hash};
pub use keys::{Address, PublicKey, PrivateKey, KeyPair, generate_keypair, generate_keypair_from_seed};
