//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract every resource (restaurants, orders, ...) implements
//! to be managed by the generic [`ResourceActor`](crate::ResourceActor). It names the id, the
//! DTOs, the custom actions, the list query, the injected context and the error type, and it
//! provides the lifecycle hooks (`on_create`, `on_update`, `on_delete`, `handle_action`).
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::on_delete`]
//! - [`ActorEntity::action_mutates`]
//! - [`ActorEntity::seq_of`]
//!
//! The defaults do nothing (`Ok(())`) or, for `action_mutates`, treat every action as a write.
//! `seq_of` returns `None`, which suits entities keyed by a natural key.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by ResourceActor.
///
/// # Async & Context
/// Hooks are async so they can talk to other actors. The `Context` type is injected into
/// every hook when the actor starts running (late binding of dependencies).
///
/// # Drafts
/// The actor never runs a mutating hook on the committed value. It clones the entity,
/// runs the hook on the clone and commits the clone only after it was persisted, so a hook
/// that returns an error may leave `self` half-modified without any visible effect.
#[async_trait]
pub trait ActorEntity: Clone + Debug + Send + Sync + 'static {
    /// The unique identifier for this entity (e.g., a slug, a Uuid, a u32).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Enum representing resource-specific operations (e.g., `ReplaceMenu`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// Filter used by `List` requests.
    type Query: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// One enum per actor, not one per message: clients deal with a single error type and
    /// recover it from [`FrameworkError::into_entity_error`](crate::FrameworkError::into_entity_error).
    type Error: std::error::Error + Send + Sync + 'static;

    /// The id of this entity. Used when hydrating from a store.
    fn id(&self) -> &Self::Id;

    /// Pick the id for a new entity.
    ///
    /// `seq` is a per-actor counter starting at 1. Entities addressed by a natural key
    /// (slugs, idempotency keys) derive the id from `params` instead.
    fn assign_id(seq: u64, params: &Self::Create) -> Self::Id;

    /// The sequence number an id was assigned from, if it came from `seq`.
    ///
    /// Sequence-keyed entities return it so hydration can resume the counter after the
    /// highest loaded id, gaps left by deletes included.
    fn seq_of(_id: &Self::Id) -> Option<u64> {
        None
    }

    /// Construct the full Entity from the ID and Payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Whether this entity belongs in the result of a `List` request.
    fn matches(&self, query: &Self::Query) -> bool;

    /// Whether an action changes state.
    ///
    /// Read-only actions (quotes, checks) are neither persisted nor published.
    fn action_mutates(_action: &Self::Action) -> bool {
        true
    }

    // --- Lifecycle Hooks (Async) ---

    /// Called after the entity is built and before it is stored.
    /// Use this hook for validation or side effects (e.g., asking other actors).
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed from the system.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler (Async) ---

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
