//! # Persistence
//!
//! A `ResourceActor` keeps its entities in memory and writes every committed change through a
//! [`Store`]. The actor is the only writer of its collection, so a store never has to deal with
//! concurrent writers for the same collection.

use crate::entity::ActorEntity;
use async_trait::async_trait;

/// Errors raised by a [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Durable backing for one entity collection.
#[async_trait]
pub trait Store<T: ActorEntity>: Send + Sync + 'static {
    /// Every persisted entity. Called once, before the actor starts.
    async fn load(&self) -> Result<Vec<T>, StoreError>;

    /// Insert or replace one entity.
    async fn save(&self, item: &T) -> Result<(), StoreError>;

    /// Remove one entity. Removing a missing entity is not an error.
    async fn remove(&self, id: &T::Id) -> Result<(), StoreError>;
}

/// Store that keeps nothing: state lives only as long as the actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

#[async_trait]
impl<T: ActorEntity> Store<T> for MemoryStore {
    async fn load(&self) -> Result<Vec<T>, StoreError> {
        Ok(Vec::new())
    }

    async fn save(&self, _item: &T) -> Result<(), StoreError> {
        Ok(())
    }

    async fn remove(&self, _id: &T::Id) -> Result<(), StoreError> {
        Ok(())
    }
}
