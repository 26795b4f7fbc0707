//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the component that owns one collection of entities.
//! It processes messages sequentially, writes every committed change through its [`Store`] and
//! publishes the change on a broadcast feed.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceEvent, ResourceRequest};
use crate::store::{MemoryStore, Store, StoreError};
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Capacity of the change feed when none is given.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// The generic actor that manages a collection of entities.
///
/// # Concurrency Model
/// Each actor processes its own messages one at a time inside a single Tokio task. The map of
/// entities is owned by that task, so no `Mutex` is needed and two writes to the same entity
/// can never interleave.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceActor::new()` (in memory) or `ResourceActor::with_store()`.
/// 2.  **Hydrate**: `actor.hydrate().await` loads whatever the store already holds.
/// 3.  **Wire & Run**: spawn `actor.run(context)` with the clients it depends on.
///
/// ```rust
/// use resource_actor::{ActorEntity, ResourceActor};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Table { id: u64, seats: u8 }
/// #[derive(Debug)] struct TableCreate { seats: u8 }
/// #[derive(Debug)] struct TableUpdate;
/// #[derive(Debug)] enum TableAction {}
/// #[derive(Debug, thiserror::Error)] #[error("table error")] struct TableError;
///
/// #[async_trait]
/// impl ActorEntity for Table {
///     type Id = u64;
///     type Create = TableCreate;
///     type Update = TableUpdate;
///     type Action = TableAction;
///     type ActionResult = ();
///     type Query = ();
///     type Context = ();
///     type Error = TableError;
///
///     fn id(&self) -> &u64 { &self.id }
///     fn assign_id(seq: u64, _: &TableCreate) -> u64 { seq }
///     fn from_create_params(id: u64, p: TableCreate) -> Result<Self, TableError> {
///         Ok(Self { id, seats: p.seats })
///     }
///     fn matches(&self, _: &()) -> bool { true }
///     async fn on_update(&mut self, _: TableUpdate, _: &()) -> Result<(), TableError> { Ok(()) }
///     async fn handle_action(&mut self, _: TableAction, _: &()) -> Result<(), TableError> { Ok(()) }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = ResourceActor::<Table>::new(10);
///     tokio::spawn(actor.run(()));
///
///     let id = client.create(TableCreate { seats: 4 }).await.unwrap();
///     assert_eq!(client.get(id).await.unwrap().unwrap().seats, 4);
/// }
/// ```
///
/// # Write Path
///
/// Create, Update, Delete and mutating Actions follow the same steps:
///
/// 1. Run the entity hook on a draft (a clone of the committed value, or the freshly built one).
/// 2. Persist the draft through the store.
/// 3. Commit the draft to the in-memory map.
/// 4. Publish a [`ResourceEvent`] and answer the caller.
///
/// A failure in steps 1 or 2 answers the caller with the error and leaves the committed
/// state untouched. Read-only actions (see [`ActorEntity::action_mutates`]) run on a draft
/// that is thrown away.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    items: HashMap<T::Id, T>,
    next_seq: u64,
    store: Box<dyn Store<T>>,
    events: broadcast::Sender<ResourceEvent<T>>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates an in-memory `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full,
    /// client calls wait until there is space.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        Self::with_store(buffer_size, DEFAULT_EVENT_BUFFER, MemoryStore)
    }

    /// Creates an actor backed by `store`.
    ///
    /// `event_buffer` bounds the change feed. A subscriber that falls further behind than
    /// that sees `RecvError::Lagged` and has to resync.
    pub fn with_store(
        buffer_size: usize,
        event_buffer: usize,
        store: impl Store<T>,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (events, _) = broadcast::channel(event_buffer.max(1));
        let actor = Self {
            receiver,
            items: HashMap::new(),
            next_seq: 1,
            store: Box::new(store),
            events: events.clone(),
        };
        let client = ResourceClient::new(sender, events);
        (actor, client)
    }

    /// Loads every persisted entity into memory. Returns how many were loaded.
    pub async fn hydrate(&mut self) -> Result<usize, StoreError> {
        let loaded = self.store.load().await?;
        for item in loaded {
            self.items.insert(item.id().clone(), item);
        }
        let highest = self.items.keys().filter_map(T::seq_of).max().unwrap_or(0);
        self.next_seq = highest.max(self.items.len() as u64) + 1;
        info!(
            entity_type = entity_type::<T>(),
            size = self.items.len(),
            "Hydrated"
        );
        Ok(self.items.len())
    }

    /// Runs the actor's event loop, processing messages until every client is dropped.
    ///
    /// # Context Injection
    /// The `context` argument is injected into every entity hook. Entities reach the
    /// clients of other actors through it, which lets actors that depend on each other
    /// be created first and wired afterwards.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = entity_type::<T>();
        info!(entity_type, size = self.items.len(), "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let result = self.create(params, &context).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.items.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { query, respond_to } => {
                    let matching: Vec<T> = self
                        .items
                        .values()
                        .filter(|item| item.matches(&query))
                        .cloned()
                        .collect();
                    debug!(entity_type, ?query, count = matching.len(), "List");
                    let _ = respond_to.send(Ok(matching));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let result = self.update(id, update, &context).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    let result = self.delete(id, &context).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let result = self.action(id, action, &context).await;
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, size = self.items.len(), "Shutdown");
    }

    async fn create(
        &mut self,
        params: T::Create,
        context: &T::Context,
    ) -> Result<T::Id, FrameworkError> {
        let entity_type = entity_type::<T>();
        let mut id = T::assign_id(self.next_seq, &params);
        // Ids that move with the counter skip over taken slots; natural keys collide.
        while self.items.contains_key(&id) {
            let next = T::assign_id(self.next_seq + 1, &params);
            if next == id {
                break;
            }
            self.next_seq += 1;
            id = next;
        }
        if self.items.contains_key(&id) {
            debug!(entity_type, %id, "Already exists");
            return Err(FrameworkError::AlreadyExists(id.to_string()));
        }

        let mut item = T::from_create_params(id.clone(), params).map_err(|e| {
            warn!(entity_type, error = %e, "Create failed");
            FrameworkError::EntityError(Box::new(e))
        })?;
        if let Err(e) = item.on_create(context).await {
            warn!(entity_type, %id, error = %e, "on_create failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }

        self.persist(&item).await?;
        self.next_seq += 1;
        self.commit(item);
        info!(entity_type, %id, size = self.items.len(), "Created");
        Ok(id)
    }

    async fn update(
        &mut self,
        id: T::Id,
        update: T::Update,
        context: &T::Context,
    ) -> Result<T, FrameworkError> {
        let entity_type = entity_type::<T>();
        let mut draft = self.draft(&id)?;
        if let Err(e) = draft.on_update(update, context).await {
            warn!(entity_type, %id, error = %e, "Update failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }

        self.persist(&draft).await?;
        self.commit(draft.clone());
        info!(entity_type, %id, "Updated");
        Ok(draft)
    }

    async fn delete(&mut self, id: T::Id, context: &T::Context) -> Result<(), FrameworkError> {
        let entity_type = entity_type::<T>();
        let Some(item) = self.items.get(&id) else {
            warn!(entity_type, %id, "Not found");
            return Err(FrameworkError::NotFound(id.to_string()));
        };
        if let Err(e) = item.on_delete(context).await {
            warn!(entity_type, %id, error = %e, "on_delete failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }

        if let Err(e) = self.store.remove(&id).await {
            warn!(entity_type, %id, error = %e, "Remove from store failed");
            return Err(FrameworkError::Storage(e));
        }
        self.items.remove(&id);
        let _ = self.events.send(ResourceEvent::Removed(id.clone()));
        info!(entity_type, %id, size = self.items.len(), "Deleted");
        Ok(())
    }

    async fn action(
        &mut self,
        id: T::Id,
        action: T::Action,
        context: &T::Context,
    ) -> Result<T::ActionResult, FrameworkError> {
        let entity_type = entity_type::<T>();
        let mutates = T::action_mutates(&action);
        let mut draft = self.draft(&id)?;

        let result = match draft.handle_action(action, context).await {
            Ok(result) => result,
            Err(e) => {
                warn!(entity_type, %id, error = %e, "Action failed");
                return Err(FrameworkError::EntityError(Box::new(e)));
            }
        };

        if mutates {
            self.persist(&draft).await?;
            self.commit(draft);
            info!(entity_type, %id, "Action ok");
        } else {
            debug!(entity_type, %id, "Read-only action ok");
        }
        Ok(result)
    }

    fn draft(&self, id: &T::Id) -> Result<T, FrameworkError> {
        self.items.get(id).cloned().ok_or_else(|| {
            warn!(entity_type = entity_type::<T>(), %id, "Not found");
            FrameworkError::NotFound(id.to_string())
        })
    }

    async fn persist(&self, item: &T) -> Result<(), FrameworkError> {
        self.store.save(item).await.map_err(|e| {
            warn!(entity_type = entity_type::<T>(), id = %item.id(), error = %e, "Persist failed");
            FrameworkError::Storage(e)
        })
    }

    fn commit(&mut self, item: T) {
        self.items.insert(item.id().clone(), item.clone());
        // No subscribers is fine.
        let _ = self.events.send(ResourceEvent::Upserted(item));
    }
}

// Just the type name, e.g. "Order" instead of "menu_platform::model::order::Order".
fn entity_type<T>() -> &'static str {
    std::any::type_name::<T>()
        .split("::")
        .last()
        .unwrap_or("Unknown")
}
