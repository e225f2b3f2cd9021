//! Module de sérialisation pour PresentPool
//!
//! Fournit des fonctions de sérialisation/désérialisation avec bincode, CBOR et JSON.
//! Bincode est le format canonique (payloads d'events, racines d'état).

use serde::{Deserialize, Serialize};
use crate::error::{Result, SerializationError};

/// Formats de sérialisation supportés
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializationFormat {
    /// Bincode - Format binaire compact et rapide
    #[default]
    Bincode,
    /// CBOR - Format binaire standardisé pour l'interopérabilité
    Cbor,
    /// JSON - Format texte pour le debug et l'inspection
    Json,
}

/// Trait pour les objets sérialisables
pub trait Serializable: Serialize + for<'de> Deserialize<'de> {
    /// Sérialise l'objet dans le format spécifié
    fn to_bytes(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        serialize_with_format(self, format)
    }

    /// Désérialise un objet depuis les bytes
    fn from_bytes(data: &[u8], format: SerializationFormat) -> Result<Self>
    where
        Self: Sized,
    {
        deserialize_with_format(data, format)
    }
}

/// Sérialise un objet avec le format spécifié
pub fn serialize_with_format<T: Serialize>(
    obj: &T,
    format: SerializationFormat,
) -> Result<Vec<u8>> {
    match format {
        SerializationFormat::Bincode => {
            Ok(bincode::serialize(obj).map_err(SerializationError::from)?)
        }
        SerializationFormat::Cbor => {
            cbor4ii::serde::to_vec(Vec::new(), obj)
                .map_err(|e| SerializationError::Cbor(format!("{:?}", e)).into())
        }
        SerializationFormat::Json => {
            let json_str = serde_json::to_string(obj).map_err(SerializationError::from)?;
            Ok(json_str.into_bytes())
        }
    }
}

/// Désérialise un objet depuis les bytes avec le format spécifié
pub fn deserialize_with_format<T: for<'de> Deserialize<'de>>(
    data: &[u8],
    format: SerializationFormat,
) -> Result<T> {
    match format {
        SerializationFormat::Bincode => {
            Ok(bincode::deserialize(data).map_err(SerializationError::from)?)
        }
        SerializationFormat::Cbor => {
            cbor4ii::serde::from_slice(data)
                .map_err(|e| SerializationError::Cbor(format!("{:?}", e)).into())
        }
        SerializationFormat::Json => {
            let json_str = std::str::from_utf8(data)
                .map_err(|_| SerializationError::UnsupportedFormat {
                    format: "Invalid UTF-8 for JSON".to_string(),
                })?;
            Ok(serde_json::from_str(json_str).map_err(SerializationError::from)?)
        }
    }
}

/// Encodage canonique (bincode) utilisé pour les payloads et les hashes
pub fn canonical_bytes<T: Serialize>(obj: &T) -> Result<Vec<u8>> {
    serialize_with_format(obj, SerializationFormat::Bincode)
}
