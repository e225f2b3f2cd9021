//! # Exemple de cycle de vie d'un cadeau
//!
//! Trois membres créent un cadeau pour un ami, y contribuent, attendent la
//! date de déblocage puis l'envoient.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example present_lifecycle
//! ```

use std::sync::Arc;
use chrono::{Duration, Utc};
use presentpool_core::contracts::{Clock, ManualClock};
use presentpool_core::crypto::generate_keypair;
use presentpool_core::{
    ContractManager, InMemoryLedger, PoolConfig, PoolService, PresentPoolCall, Transaction,
    UNITS_PER_COIN,
};

fn coins(amount: u64) -> String {
    format!("{}.{:08}", amount / UNITS_PER_COIN, amount % UNITS_PER_COIN)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let alice = generate_keypair()?.address();
    let bob = generate_keypair()?.address();
    let carol = generate_keypair()?.address();
    let friend = generate_keypair()?.address();

    let clock = ManualClock::new(Utc::now());
    let service = PoolService::new(ContractManager::new(InMemoryLedger::new(), Arc::new(clock.clone())));
    service.write(|m| -> anyhow::Result<()> {
        for who in [alice, bob, carol] {
            m.ledger_mut().credit(who, 10 * UNITS_PER_COIN)?;
        }
        Ok(())
    }).await?;

    println!("🎁 Déploiement du pool");
    let pool = service.deploy(alice, vec![alice, bob], PoolConfig::default()).await?;
    service.add_member(pool, bob, carol).await?;
    println!("  ✅ Pool {} avec alice, bob et carol", pool.short());

    println!("📝 Création du cadeau (déblocage dans une heure)");
    let unlock_time = clock.now() + Duration::hours(1);
    service.submit(pool, Transaction::new(carol, PresentPoolCall::CreatePresent {
        holder: carol,
        receiver: friend,
        unlock_time,
    })).await?;

    println!("💰 Contributions");
    for (who, amount) in [(alice, 3 * UNITS_PER_COIN / 2), (bob, 5 * UNITS_PER_COIN / 2), (carol, UNITS_PER_COIN)] {
        let receipt = service.add_amount(pool, who, 0, amount).await?;
        println!("  ✅ {} verse {} (bloc {})", who.short(), coins(amount), receipt.block_number);
    }

    if let Err(e) = service.send_present(pool, carol, 0).await {
        println!("  ⏳ Envoi refusé: {}", e);
    }

    clock.advance(Duration::hours(1));
    let receipt = service.send_present(pool, carol, 0).await?;
    println!("🚀 Cadeau envoyé au bloc {}", receipt.block_number);

    println!("📊 Soldes");
    for (name, who) in [("alice", alice), ("bob", bob), ("carol", carol), ("ami", friend)] {
        println!("  {:<6} {:>20}", name, coins(service.balance(who).await));
    }

    for event in service.events().await {
        println!("  📣 {:?}", event.decode()?);
    }

    Ok(())
}
