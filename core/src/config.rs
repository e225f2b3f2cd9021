//! Configuration d'un pool de cadeaux

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::crypto::HashAlgorithm;
use crate::error::{ConfigError, Result};
use crate::serialization::SerializationFormat;

/// Configuration d'un contrat PresentPool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Refuse la création d'un cadeau dont la date de déblocage n'est pas dans le futur
    pub require_future_unlock: bool,
    /// Nombre maximum de cadeaux (None = illimité)
    pub max_presents: Option<u64>,
    /// Algorithme pour les racines d'état et les topics d'events
    pub hash_algorithm: HashAlgorithm,
    /// Format des snapshots d'état
    pub snapshot_format: SerializationFormat,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            require_future_unlock: false,
            max_presents: None,
            hash_algorithm: HashAlgorithm::Blake3,
            snapshot_format: SerializationFormat::Bincode,
        }
    }
}

impl PoolConfig {
    /// Charge une configuration depuis une chaîne JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PoolConfig = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un fichier JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_presents == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_presents".to_string(),
                message: "doit être supérieur à 0".to_string(),
            }.into());
        }
        Ok(())
    }
}
