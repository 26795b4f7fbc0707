//! # Generic Messages
//!
//! The request type sent from `ResourceClient` to `ResourceActor`, and the change events the
//! actor publishes after each committed mutation.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// The variants map to CRUD plus `List` for filtered reads and `Action` for
/// resource-specific operations. Every payload type comes from the [`ActorEntity`]
/// associated types, so a restaurant payload can never reach the order actor.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        query: T::Query,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

/// A committed change, as seen by subscribers of the change feed.
#[derive(Debug, Clone)]
pub enum ResourceEvent<T: ActorEntity> {
    /// The entity was created or changed; carries the committed state.
    Upserted(T),
    /// The entity was deleted.
    Removed(T::Id),
}
