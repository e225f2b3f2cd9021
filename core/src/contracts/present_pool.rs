//! Smart contract PresentPool
//!
//! Un ensemble fixe de membres crée des cadeaux (« presents ») pour un
//! destinataire, y verse des contributions, puis le détenteur du cadeau
//! envoie la cagnotte au destinataire une fois la date de déblocage atteinte.
//!
//! Cycle de vie d'un cadeau : `Créé (cagnotte ouverte) -> Envoyé (terminal)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::config::PoolConfig;
use crate::contracts::{
    ContractContext, ContractError, ContractMetadata, ContractResult, ContractVersion,
    PresentPoolEvent, SmartContract,
};
use crate::crypto::{compute_hash, Address, Hash};
use crate::error::Result;
use crate::serialization::{canonical_bytes, Serializable};

/// Membre du pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    /// Membre qui l'a ajouté (None pour les membres fondateurs)
    pub added_by: Option<Address>,
    pub joined_at: DateTime<Utc>,
}

/// Cadeau en cours de constitution ou déjà envoyé
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Present {
    /// Identifiant séquentiel, égal à l'ordre d'insertion
    pub id: u64,
    /// Seul membre autorisé à déclencher l'envoi
    pub holder: Address,
    /// Bénéficiaire des fonds
    pub receiver: Address,
    /// Date à partir de laquelle l'envoi est permis
    pub unlock_time: DateTime<Utc>,
    /// Total des contributions
    pub total_pooled: u64,
    /// Vrai une fois envoyé ; le cadeau ne change plus ensuite
    pub sent: bool,
    pub created_by: Address,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Total versé par chaque contributeur
    pub contributions: BTreeMap<Address, u64>,
}

impl Present {
    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        now >= self.unlock_time
    }

    pub fn contribution_of(&self, contributor: &Address) -> u64 {
        self.contributions.get(contributor).copied().unwrap_or(0)
    }

    pub fn contributor_count(&self) -> usize {
        self.contributions.len()
    }
}

/// Statistiques du pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentPoolStats {
    pub total_presents_created: u64,
    pub total_presents_sent: u64,
    pub total_contributions: u64,
    /// Total versé depuis la création du pool
    pub total_pooled: u64,
    /// Total envoyé aux destinataires
    pub total_released: u64,
}

/// État du smart contract PresentPool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentPoolState {
    /// Membres indexés par adresse ; jamais retirés
    pub members: BTreeMap<Address, Member>,
    /// Cadeaux, indexés par id
    pub presents: Vec<Present>,
    pub present_ids: Vec<u64>,
    pub total_presents: u64,
    pub presents_by_holder: BTreeMap<Address, Vec<u64>>,
    pub presents_by_receiver: BTreeMap<Address, Vec<u64>>,
    pub stats: PresentPoolStats,
}

impl Serializable for PresentPoolState {}

impl PresentPoolState {
    /// Vérifie la cohérence d'un état venu de l'extérieur (snapshot)
    pub fn check_consistency(&self) -> ContractResult<()> {
        let invalid = |message: String| Err(ContractError::InvalidState { message });

        if self.members.is_empty() {
            return invalid("snapshot sans membre".to_string());
        }
        if self.members.iter().any(|(address, member)| *address != member.address) {
            return invalid("membre indexé sous une autre adresse".to_string());
        }

        let count = self.presents.len();
        if self.present_ids.len() != count || usize::try_from(self.total_presents).ok() != Some(count) {
            return invalid(format!(
                "{} cadeaux, {} ids, total_presents = {}",
                count, self.present_ids.len(), self.total_presents
            ));
        }

        let mut pooled: u64 = 0;
        for (slot, (present, id)) in self.presents.iter().zip(&self.present_ids).enumerate() {
            if usize::try_from(present.id).ok() != Some(slot) || *id != present.id {
                return invalid(format!("cadeau {} rangé à la position {}", present.id, slot));
            }
            let contributed = present.contributions
                .values()
                .try_fold(0u64, |acc, amount| acc.checked_add(*amount));
            if contributed != Some(present.total_pooled) {
                return invalid(format!("cadeau {}: total_pooled incohérent", present.id));
            }
            pooled = pooled.checked_add(present.total_pooled).ok_or(ContractError::AmountOverflow)?;
        }
        if pooled != self.stats.total_pooled {
            return invalid("total versé différent de la somme des cagnottes".to_string());
        }

        let indexed = |index: &BTreeMap<Address, Vec<u64>>, key: fn(&Present) -> Address| {
            index.iter().all(|(address, ids)| {
                ids.iter().all(|id| {
                    usize::try_from(*id)
                        .ok()
                        .and_then(|slot| self.presents.get(slot))
                        .map_or(false, |present| key(present) == *address)
                })
            })
        };
        if !indexed(&self.presents_by_holder, |p| p.holder)
            || !indexed(&self.presents_by_receiver, |p| p.receiver)
        {
            return invalid("index détenteur/destinataire incohérent".to_string());
        }

        Ok(())
    }
}

/// Données d'appel pour les fonctions du contrat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentPoolCall {
    AddMember {
        candidate: Address,
    },
    CreatePresent {
        holder: Address,
        receiver: Address,
        unlock_time: DateTime<Utc>,
    },
    /// Contribution : le montant est la valeur attachée à l'appel
    AddAmount {
        present_id: u64,
    },
    SendPresent {
        present_id: u64,
    },
    IsMember {
        address: Address,
    },
    TotalPresents,
    GetPresent {
        index: u64,
    },
    GetPresentId {
        index: u64,
    },
}

impl PresentPoolCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            PresentPoolCall::AddMember { .. } => "addMember",
            PresentPoolCall::CreatePresent { .. } => "createPresent",
            PresentPoolCall::AddAmount { .. } => "addAmount",
            PresentPoolCall::SendPresent { .. } => "sendPresent",
            PresentPoolCall::IsMember { .. } => "members",
            PresentPoolCall::TotalPresents => "totalPresents",
            PresentPoolCall::GetPresent { .. } => "presentsArray",
            PresentPoolCall::GetPresentId { .. } => "presentIds",
        }
    }
}

/// Données de retour du contrat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentPoolReturn {
    MemberAdded { member: Address },
    PresentCreated { present_id: u64 },
    AmountAdded { present_id: u64, new_total: u64 },
    PresentSent { present_id: u64, receiver: Address, amount: u64 },
    IsMember(bool),
    TotalPresents(u64),
    PresentDetails(Present),
    PresentId(u64),
}

/// Implémentation du smart contract PresentPool
#[derive(Debug, Clone)]
pub struct PresentPoolContract {
    state: PresentPoolState,
    config: PoolConfig,
}

impl PresentPoolContract {
    /// Crée le pool avec ses membres fondateurs (au moins un)
    pub fn new(
        initial_members: impl IntoIterator<Item = Address>,
        config: PoolConfig,
        created_at: DateTime<Utc>,
    ) -> ContractResult<Self> {
        let mut state = PresentPoolState::default();
        for address in initial_members {
            state.members.entry(address).or_insert(Member {
                address,
                added_by: None,
                joined_at: created_at,
            });
        }

        if state.members.is_empty() {
            return Err(ContractError::InvalidParameters {
                message: "Le pool doit avoir au moins un membre".to_string(),
            });
        }

        tracing::debug!("PresentPool initialisé avec {} membres", state.members.len());

        Ok(Self { state, config })
    }

    fn require_member(&self, caller: &Address) -> ContractResult<()> {
        if !self.is_member(caller) {
            return Err(ContractError::unauthorized(format!(
                "{} n'est pas membre",
                caller.short()
            )));
        }
        Ok(())
    }

    /// Position d'un cadeau existant dans `presents`
    fn slot(&self, present_id: u64) -> ContractResult<usize> {
        usize::try_from(present_id)
            .ok()
            .filter(|slot| *slot < self.state.presents.len())
            .ok_or(ContractError::PresentNotFound { present_id })
    }

    /// Ajoute un nouveau membre
    pub fn add_member(
        &mut self,
        caller: Address,
        candidate: Address,
        context: &mut ContractContext<'_>,
    ) -> ContractResult<()> {
        self.require_member(&caller)?;

        if self.is_member(&candidate) {
            return Err(ContractError::AlreadyMember { member: candidate });
        }

        let event = PresentPoolEvent::AddMember { member: candidate };
        let (data, topics) = event.encode(self.config.hash_algorithm)?;

        self.state.members.insert(candidate, Member {
            address: candidate,
            added_by: Some(caller),
            joined_at: context.get_timestamp(),
        });

        context.emit_event(event.name().to_string(), data, topics);
        context.emit_log(format!("Member {} added by {}", candidate.short(), caller.short()));
        tracing::info!("Nouveau membre {} ajouté par {}", candidate.short(), caller.short());

        Ok(())
    }

    /// Crée un cadeau et retourne son id
    pub fn create_present(
        &mut self,
        caller: Address,
        holder: Address,
        receiver: Address,
        unlock_time: DateTime<Utc>,
        context: &mut ContractContext<'_>,
    ) -> ContractResult<u64> {
        self.require_member(&caller)?;

        // Le compte d'escrow du pool n'est jamais détenteur ni destinataire
        let escrow = context.get_contract_address();
        if receiver == holder || receiver == escrow || holder == escrow {
            return Err(ContractError::InvalidReceiver);
        }

        if self.config.require_future_unlock && unlock_time <= context.get_timestamp() {
            return Err(ContractError::UnlockTimeInPast { unlock_time });
        }

        if let Some(max) = self.config.max_presents {
            if self.state.total_presents >= max {
                return Err(ContractError::InvalidParameters {
                    message: format!("Nombre maximum de cadeaux atteint ({})", max),
                });
            }
        }

        let present_id = self.state.total_presents;
        let event = PresentPoolEvent::CreatedPresent {
            present_id,
            holder,
            receiver,
            unlock_time,
        };
        // Encodé avant toute mutation pour qu'un échec ne laisse rien derrière
        let (data, topics) = event.encode(self.config.hash_algorithm)?;

        self.state.presents.push(Present {
            id: present_id,
            holder,
            receiver,
            unlock_time,
            total_pooled: 0,
            sent: false,
            created_by: caller,
            created_at: context.get_timestamp(),
            sent_at: None,
            contributions: BTreeMap::new(),
        });
        self.state.present_ids.push(present_id);
        self.state.total_presents += 1;
        self.state.stats.total_presents_created += 1;

        self.state.presents_by_holder.entry(holder).or_default().push(present_id);
        self.state.presents_by_receiver.entry(receiver).or_default().push(present_id);

        context.emit_event(event.name().to_string(), data, topics);
        context.emit_log(format!(
            "Present {} created by {} for {} (holder {}, unlock {})",
            present_id, caller.short(), receiver.short(), holder.short(), unlock_time
        ));
        tracing::info!(
            "Cadeau {} créé: détenteur {}, destinataire {}, déblocage {}",
            present_id, holder.short(), receiver.short(), unlock_time
        );

        Ok(present_id)
    }

    /// Ajoute une contribution à un cadeau ouvert ; retourne le nouveau total
    pub fn add_amount(
        &mut self,
        caller: Address,
        present_id: u64,
        amount: u64,
        context: &mut ContractContext<'_>,
    ) -> ContractResult<u64> {
        self.require_member(&caller)?;

        let algorithm = self.config.hash_algorithm;
        let slot = self.slot(present_id)?;
        let present = &mut self.state.presents[slot];

        if present.sent {
            return Err(ContractError::AlreadySent { present_id });
        }

        if amount == 0 {
            return Err(ContractError::ZeroAmount);
        }

        let new_total = present.total_pooled
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)?;
        let pool_total = self.state.stats.total_pooled
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)?;

        let event = PresentPoolEvent::AddedAmountToPresent {
            present_id,
            contributor: caller,
            amount,
        };
        let (data, topics) = event.encode(algorithm)?;

        present.total_pooled = new_total;
        // Borné par total_pooled, ne peut pas déborder
        *present.contributions.entry(caller).or_insert(0) += amount;

        self.state.stats.total_pooled = pool_total;
        self.state.stats.total_contributions += 1;

        context.emit_event(event.name().to_string(), data, topics);
        context.emit_log(format!(
            "{} added {} to present {} (total {})",
            caller.short(), amount, present_id, new_total
        ));
        tracing::debug!("Contribution de {} au cadeau {} (total {})", amount, present_id, new_total);

        Ok(new_total)
    }

    /// Envoie la cagnotte au destinataire ; retourne le montant envoyé
    pub fn send_present(
        &mut self,
        caller: Address,
        present_id: u64,
        context: &mut ContractContext<'_>,
    ) -> ContractResult<u64> {
        self.require_member(&caller)?;

        let algorithm = self.config.hash_algorithm;
        let now = context.get_timestamp();
        let slot = self.slot(present_id)?;
        let present = &mut self.state.presents[slot];

        if present.holder != caller {
            return Err(ContractError::unauthorized(format!(
                "seul le détenteur du cadeau {} peut l'envoyer",
                present_id
            )));
        }

        if present.sent {
            return Err(ContractError::AlreadySent { present_id });
        }

        if !present.is_unlocked(now) {
            return Err(ContractError::TooEarly {
                unlock_time: present.unlock_time,
                now,
            });
        }

        let amount = present.total_pooled;
        let receiver = present.receiver;
        let released = self.state.stats.total_released
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)?;
        let event = PresentPoolEvent::SentPresent { present_id, receiver, amount };
        let (data, topics) = event.encode(algorithm)?;

        // Terminal avant le transfert : un ré-appel voit AlreadySent
        present.sent = true;
        present.sent_at = Some(now);

        if amount > 0 {
            if let Err(err) = context.transfer_tokens(receiver, amount) {
                present.sent = false;
                present.sent_at = None;
                tracing::warn!("Envoi du cadeau {} annulé: {}", present_id, err);
                return Err(err);
            }
        }

        self.state.stats.total_released = released;
        self.state.stats.total_presents_sent += 1;

        context.emit_event(event.name().to_string(), data, topics);
        context.emit_log(format!(
            "Present {} sent to {} ({})",
            present_id, receiver.short(), amount
        ));
        tracing::info!("Cadeau {} envoyé à {}: {}", present_id, receiver.short(), amount);

        Ok(amount)
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.state.members.contains_key(address)
    }

    pub fn member(&self, address: &Address) -> Option<&Member> {
        self.state.members.get(address)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.state.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.state.members.len()
    }

    pub fn total_presents(&self) -> u64 {
        self.state.total_presents
    }

    /// Cadeau à l'index donné ; échoue au-delà du dernier
    pub fn present(&self, index: u64) -> ContractResult<&Present> {
        let slot = self.slot(index)?;
        Ok(&self.state.presents[slot])
    }

    /// Id du cadeau à l'index donné ; échoue au-delà du dernier
    pub fn present_id(&self, index: u64) -> ContractResult<u64> {
        let slot = self.slot(index)?;
        self.state.present_ids
            .get(slot)
            .copied()
            .ok_or(ContractError::PresentNotFound { present_id: index })
    }

    pub fn presents(&self) -> &[Present] {
        &self.state.presents
    }

    pub fn presents_held_by(&self, holder: &Address) -> Vec<&Present> {
        self.lookup(self.state.presents_by_holder.get(holder))
    }

    pub fn presents_for_receiver(&self, receiver: &Address) -> Vec<&Present> {
        self.lookup(self.state.presents_by_receiver.get(receiver))
    }

    fn lookup(&self, ids: Option<&Vec<u64>>) -> Vec<&Present> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.slot(*id).ok())
                .map(|slot| &self.state.presents[slot])
                .collect()
        })
        .unwrap_or_default()
    }

    /// Fonds en escrow : somme des cagnottes non envoyées
    pub fn escrow_balance(&self) -> u64 {
        self.state.presents
            .iter()
            .filter(|p| !p.sent)
            .map(|p| p.total_pooled)
            .sum()
    }

    pub fn stats(&self) -> &PresentPoolStats {
        &self.state.stats
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Racine d'état : hash de l'encodage canonique
    pub fn state_root(&self) -> Result<Hash> {
        let bytes = canonical_bytes(&self.state)?;
        Ok(compute_hash(&bytes, self.config.hash_algorithm))
    }

    /// Sérialise l'état dans le format configuré
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        self.state.to_bytes(self.config.snapshot_format)
    }

    /// Reconstruit un contrat depuis un snapshot
    pub fn restore(bytes: &[u8], config: PoolConfig) -> Result<Self> {
        let state = PresentPoolState::from_bytes(bytes, config.snapshot_format)?;
        state.check_consistency()?;
        Ok(Self { state, config })
    }
}

impl SmartContract for PresentPoolContract {
    type State = PresentPoolState;
    type CallData = PresentPoolCall;
    type ReturnData = PresentPoolReturn;

    fn call(
        &mut self,
        call_data: Self::CallData,
        context: &mut ContractContext<'_>,
    ) -> ContractResult<Self::ReturnData> {
        let caller = context.get_caller();
        match call_data {
            PresentPoolCall::AddMember { candidate } => {
                self.add_member(caller, candidate, context)?;
                Ok(PresentPoolReturn::MemberAdded { member: candidate })
            }

            PresentPoolCall::CreatePresent { holder, receiver, unlock_time } => {
                let present_id = self.create_present(caller, holder, receiver, unlock_time, context)?;
                Ok(PresentPoolReturn::PresentCreated { present_id })
            }

            PresentPoolCall::AddAmount { present_id } => {
                let amount = context.get_value();
                let new_total = self.add_amount(caller, present_id, amount, context)?;
                Ok(PresentPoolReturn::AmountAdded { present_id, new_total })
            }

            PresentPoolCall::SendPresent { present_id } => {
                let amount = self.send_present(caller, present_id, context)?;
                let receiver = self.present(present_id)?.receiver;
                Ok(PresentPoolReturn::PresentSent { present_id, receiver, amount })
            }

            PresentPoolCall::IsMember { address } => {
                Ok(PresentPoolReturn::IsMember(self.is_member(&address)))
            }

            PresentPoolCall::TotalPresents => Ok(PresentPoolReturn::TotalPresents(self.total_presents())),

            PresentPoolCall::GetPresent { index } => {
                Ok(PresentPoolReturn::PresentDetails(self.present(index)?.clone()))
            }

            PresentPoolCall::GetPresentId { index } => {
                Ok(PresentPoolReturn::PresentId(self.present_id(index)?))
            }
        }
    }

    fn is_payable(call_data: &Self::CallData) -> bool {
        matches!(call_data, PresentPoolCall::AddAmount { .. })
    }

    fn get_state(&self) -> &Self::State {
        &self.state
    }

    fn set_state(&mut self, state: Self::State) {
        self.state = state;
    }

    fn metadata(&self) -> ContractMetadata {
        ContractMetadata {
            name: "PresentPoolContract".to_string(),
            version: ContractVersion::new(1, 0, 0),
            description: "Pooled, time-locked presents between members".to_string(),
            license: "MIT".to_string(),
        }
    }
}
