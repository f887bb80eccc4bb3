//! Per-character sequencing of damage resolution.
//!
//! Two events for the same character must never resolve against the same
//! pre-damage snapshot. [`CharacterQueue`] hands out one async lock per
//! character id; [`CharacterQueue::resolve_and_commit`] holds it across the
//! load, resolve and commit of a single event.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::{
    CharacterId, DamageEvent, MitigationError, MitigationLayers, MitigationPipeline,
    MitigationResult,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no layers stored for character '{0}'")]
    NotFound(CharacterId),
    #[error("layer store failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("damage rejected: {0}")]
    Rejected(#[from] MitigationError),
}

/// Where committed layer state lives between events.
#[async_trait]
pub trait LayerStore: Send + Sync {
    async fn load(&self, id: &CharacterId) -> Result<MitigationLayers, StoreError>;
    async fn commit(&self, id: &CharacterId, layers: MitigationLayers) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryLayerStore {
    layers: Mutex<HashMap<CharacterId, MitigationLayers>>,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: CharacterId, layers: MitigationLayers) {
        self.layers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, layers);
    }

    pub fn get(&self, id: &CharacterId) -> Option<MitigationLayers> {
        self.layers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl LayerStore for MemoryLayerStore {
    async fn load(&self, id: &CharacterId) -> Result<MitigationLayers, StoreError> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn commit(&self, id: &CharacterId, layers: MitigationLayers) -> Result<(), StoreError> {
        self.insert(id.clone(), layers);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CharacterQueue {
    locks: Mutex<HashMap<CharacterId, Arc<tokio::sync::Mutex<()>>>>,
}

impl CharacterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: &CharacterId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_default()
            .clone()
    }

    /// Drop the map entry once no other task holds or waits on the lock.
    /// Clones and drops of the entry happen under the map mutex, so the
    /// count is stable here.
    fn release(&self, id: &CharacterId, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks.get(id).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(id);
        }
    }

    /// Characters with a lock currently held or awaited.
    pub fn active_characters(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Load, resolve and commit one event while holding the character's lock.
    /// Nothing is written when the event is rejected.
    pub async fn resolve_and_commit<S>(
        &self,
        store: &S,
        id: &CharacterId,
        event: &DamageEvent,
    ) -> Result<MitigationResult, QueueError>
    where
        S: LayerStore + ?Sized,
    {
        let lock = self.lock_for(id);
        let outcome = {
            let _guard = lock.lock().await;
            self.resolve_locked(store, id, event).await
        };
        self.release(id, lock);
        outcome
    }

    async fn resolve_locked<S>(
        &self,
        store: &S,
        id: &CharacterId,
        event: &DamageEvent,
    ) -> Result<MitigationResult, QueueError>
    where
        S: LayerStore + ?Sized,
    {
        let layers = store.load(id).await?;
        let result = MitigationPipeline::resolve(event, &layers)?;
        let committed = layers.commit(&result)?;
        store.commit(id, committed).await?;
        debug!(
            character = %id,
            hp_before = result.before.hp_value,
            hp_after = result.after.hp_value,
            "damage committed"
        );
        Ok(result)
    }
}
