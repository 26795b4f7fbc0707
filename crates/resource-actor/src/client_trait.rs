//! # ActorClient Trait
//!
//! Common interface for resource-specific clients: default `get`, `list` and `delete`
//! built on top of the generic `ResourceClient`, with errors mapped to the resource's own type.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit standard read and delete operations.
///
/// # Example
///
/// ```rust
/// use resource_actor::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)]
/// struct Waiter { id: u64 }
/// #[derive(Debug)] struct WaiterCreate;
/// #[derive(Debug)] struct WaiterUpdate;
/// #[derive(Debug)] enum WaiterAction {}
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("{0}")]
/// struct WaiterError(String);
///
/// impl From<String> for WaiterError {
///     fn from(s: String) -> Self { WaiterError(s) }
/// }
///
/// #[async_trait]
/// impl ActorEntity for Waiter {
///     type Id = u64;
///     type Create = WaiterCreate;
///     type Update = WaiterUpdate;
///     type Action = WaiterAction;
///     type ActionResult = ();
///     type Query = ();
///     type Context = ();
///     type Error = WaiterError;
///
///     fn id(&self) -> &u64 { &self.id }
///     fn assign_id(seq: u64, _: &WaiterCreate) -> u64 { seq }
///     fn from_create_params(id: u64, _: WaiterCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id })
///     }
///     fn matches(&self, _: &()) -> bool { true }
///     async fn on_update(&mut self, _: WaiterUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
///     async fn handle_action(&mut self, _: WaiterAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
/// }
///
/// struct WaiterClient {
///     inner: ResourceClient<Waiter>,
/// }
///
/// #[async_trait]
/// impl ActorClient<Waiter> for WaiterClient {
///     type Error = WaiterError;
///
///     fn inner(&self) -> &ResourceClient<Waiter> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         WaiterError(e.to_string())
///     }
/// }
///
/// async fn usage(client: WaiterClient) {
///     // get(), list() and delete() come for free.
///     let _ = client.get(1).await;
///     let _ = client.list(()).await;
///     let _ = client.delete(1).await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every entity matching `query`, in no particular order.
    #[tracing::instrument(skip(self))]
    async fn list(&self, query: T::Query) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list(query).await.map_err(Self::map_error)
    }

    /// Delete an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }
}
