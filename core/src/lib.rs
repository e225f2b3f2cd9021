//! PresentPool Core Library
//!
//! Registre partagé de cadeaux : un ensemble de membres crée des cadeaux pour
//! un destinataire, y verse des contributions, puis le détenteur du cadeau
//! envoie la cagnotte au destinataire une fois la date de déblocage atteinte.
//!
//! # Features
//!
//! - **Membres**: ensemble fondateur, cooptation par les membres existants
//! - **Cadeaux**: détenteur, destinataire, date de déblocage, cagnotte
//! - **Exécution atomique**: toute transaction est validée entièrement ou annulée
//! - **Events**: `AddMember`, `CreatedPresent`, `AddedAmountToPresent`, `SentPresent`
//! - **Async**: service partagé au-dessus de tokio
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use presentpool_core::{ContractManager, PoolConfig, PresentPoolCall, Transaction};
//! use presentpool_core::crypto::generate_keypair;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let alice = generate_keypair()?.address();
//!     let bob = generate_keypair()?.address();
//!
//!     let mut manager = ContractManager::in_memory();
//!     manager.ledger_mut().credit(alice, 1_000)?;
//!     let pool = manager.deploy(alice, vec![alice], PoolConfig::default())?;
//!
//!     let create = PresentPoolCall::CreatePresent {
//!         holder: alice,
//!         receiver: bob,
//!         unlock_time: chrono::Utc::now(),
//!     };
//!     manager.execute(pool, Transaction::new(alice, create))?;
//!
//!     let add = Transaction::new(alice, PresentPoolCall::AddAmount { present_id: 0 }).with_value(250);
//!     manager.execute(pool, add)?;
//!
//!     manager.execute(pool, Transaction::new(alice, PresentPoolCall::SendPresent { present_id: 0 }))?;
//!     assert_eq!(manager.balance(&bob), 250);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`contracts`] - Contrat PresentPool, contexte d'exécution, events et gestionnaire
//! - [`ledger`] - Soldes natifs et primitive de transfert
//! - [`service`] - Service asynchrone partagé
//! - [`crypto`] - Hashes, clés et adresses
//! - [`config`] - Configuration d'un pool
//! - [`serialization`] - Formats bincode, CBOR et JSON

pub mod config;
pub mod contracts;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use config::PoolConfig;
pub use contracts::{
    ContractError, ContractEvent, ContractManager, ContractResult, Member, Present,
    PresentPoolCall, PresentPoolContract, PresentPoolEvent, PresentPoolReturn, Receipt,
    Transaction,
};
pub use crypto::{Address, Hash, HashAlgorithm};
pub use error::{CoreError, Result};
pub use ledger::{InMemoryLedger, LedgerProvider, UNITS_PER_COIN};
pub use service::PoolService;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! ```rust
    //! use presentpool_core::prelude::*;
    //! ```

    pub use crate::{
        Address, ContractError, ContractManager, CoreError, InMemoryLedger, LedgerProvider,
        PoolConfig, PoolService, Present, PresentPoolCall, PresentPoolEvent, PresentPoolReturn,
        Receipt, Result, Transaction,
    };
    pub use crate::contracts::{Clock, ManualClock, SystemClock};

    pub use chrono::{DateTime, Utc};
}
