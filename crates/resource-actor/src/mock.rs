//! # Mock Clients for Testing
//!
//! `MockClient<T>` hands out a real [`ResourceClient<T>`] whose requests are answered from a
//! queue of expectations instead of by an actor. Use it to test code that sits *around* a
//! client (wrappers, entities that call other actors from their hooks) without spawning the
//! actors it depends on.
//!
//! | | MockClient | Real Actor |
//! |---|---|---|
//! | **State** | None, answers are scripted | Real state and store |
//! | **Error Injection** | Easy (`return_err`) | Needs a specific state |
//! | **Use Case** | Logic around the client | The actor itself, full system |
//!
//! ## Testing Failure Scenarios
//!
//! ```rust
//! use resource_actor::mock::MockClient;
//! use resource_actor::{ActorEntity, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Dish { id: u64 }
//! #[derive(Debug)] struct DishCreate;
//! #[derive(Debug)] struct DishUpdate;
//! #[derive(Debug)] enum DishAction {}
//! #[derive(Debug, thiserror::Error)] #[error("dish error")] struct DishError;
//!
//! #[async_trait]
//! impl ActorEntity for Dish {
//!     type Id = u64; type Create = DishCreate; type Update = DishUpdate;
//!     type Action = DishAction; type ActionResult = (); type Query = ();
//!     type Context = (); type Error = DishError;
//!     fn id(&self) -> &u64 { &self.id }
//!     fn assign_id(seq: u64, _: &DishCreate) -> u64 { seq }
//!     fn from_create_params(id: u64, _: DishCreate) -> Result<Self, DishError> { Ok(Self { id }) }
//!     fn matches(&self, _: &()) -> bool { true }
//!     async fn on_update(&mut self, _: DishUpdate, _: &()) -> Result<(), DishError> { Ok(()) }
//!     async fn handle_action(&mut self, _: DishAction, _: &()) -> Result<(), DishError> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Dish>::new();
//!     let client = mock.client();
//!
//!     // Simulate a downstream failure
//!     mock.expect_get(1).return_err(FrameworkError::ActorClosed);
//!
//!     let result = client.get(1).await;
//!     assert!(matches!(result, Err(FrameworkError::ActorClosed)));
//!     mock.verify();
//! }
//! ```
//!
//! For full control over each request, [`create_mock_client`] returns the raw receiver and
//! the `expect_*` helpers pop typed requests off it.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceEvent, ResourceRequest, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, mpsc};

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A scripted answer to one request.
enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    List {
        response: Result<Vec<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    Update {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), FrameworkError>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError>,
    },
}

impl<T: ActorEntity> Expectation<T> {
    fn name(&self) -> &'static str {
        match self {
            Expectation::Get { .. } => "get",
            Expectation::List { .. } => "list",
            Expectation::Create { .. } => "create",
            Expectation::Update { .. } => "update",
            Expectation::Delete { .. } => "delete",
            Expectation::Action { .. } => "action",
        }
    }
}

/// A mock client with expectation tracking for fluent testing.
///
/// Expectations are answered strictly in the order they were registered. A request that does
/// not match the next expectation (wrong kind or wrong id) panics the background task, so the
/// caller sees `FrameworkError::ActorDropped` and `verify()` reports the leftovers.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    events: broadcast::Sender<ResourceEvent<T>>,
    expectations: Queue<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let (events, _) = broadcast::channel(16);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&queue).pop_front();
                answer(request, expectation);
            }
        });

        Self {
            client: ResourceClient::new(sender, events.clone()),
            events,
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Pushes an event to every subscriber of the mocked client.
    pub fn emit(&self, event: ResourceEvent<T>) {
        let _ = self.events.send(event);
    }

    pub fn expect_get(&mut self, id: T::Id) -> GetExpectationBuilder<T> {
        GetExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_list(&mut self) -> ListExpectationBuilder<T> {
        ListExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_create(&mut self) -> CreateExpectationBuilder<T> {
        CreateExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_update(&mut self, id: T::Id) -> UpdateExpectationBuilder<T> {
        UpdateExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_delete(&mut self, id: T::Id) -> DeleteExpectationBuilder<T> {
        DeleteExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_action(&mut self, id: T::Id) -> ActionExpectationBuilder<T> {
        ActionExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let exps = lock(&self.expectations);
        if !exps.is_empty() {
            let pending: Vec<&str> = exps.iter().map(Expectation::name).collect();
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                exps.len(),
                pending
            );
        }
    }
}

fn lock<T: ActorEntity>(queue: &Queue<T>) -> MutexGuard<'_, VecDeque<Expectation<T>>> {
    // A panicking answer() poisons nothing we rely on.
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn answer<T: ActorEntity>(request: ResourceRequest<T>, expectation: Option<Expectation<T>>) {
    match (request, expectation) {
        (ResourceRequest::Get { id, respond_to }, Some(Expectation::Get { id: want, response })) => {
            assert_eq!(id, want, "get called with an unexpected id");
            let _ = respond_to.send(response);
        }
        (ResourceRequest::List { respond_to, .. }, Some(Expectation::List { response })) => {
            let _ = respond_to.send(response);
        }
        (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create { response })) => {
            let _ = respond_to.send(response);
        }
        (
            ResourceRequest::Update { id, respond_to, .. },
            Some(Expectation::Update { id: want, response }),
        ) => {
            assert_eq!(id, want, "update called with an unexpected id");
            let _ = respond_to.send(response);
        }
        (
            ResourceRequest::Delete { id, respond_to },
            Some(Expectation::Delete { id: want, response }),
        ) => {
            assert_eq!(id, want, "delete called with an unexpected id");
            let _ = respond_to.send(response);
        }
        (
            ResourceRequest::Action { id, respond_to, .. },
            Some(Expectation::Action { id: want, response }),
        ) => {
            assert_eq!(id, want, "action called with an unexpected id");
            let _ = respond_to.send(response);
        }
        (request, Some(other)) => {
            panic!(
                "Unexpected request {:?}, next expectation is {}",
                request,
                other.name()
            );
        }
        (request, None) => panic!("Unexpected request {:?}, no expectations left", request),
    }
}

macro_rules! respond_builders {
    ($( $builder:ident => $variant:ident { $($key:ident)? } : $ok:ty ;)*) => {
        $(
            pub struct $builder<T: ActorEntity> {
                $($key: T::Id,)?
                expectations: Queue<T>,
            }

            impl<T: ActorEntity> $builder<T> {
                /// Answer the matching request with `Ok(value)`.
                pub fn return_ok(self, value: $ok) {
                    lock(&self.expectations).push_back(Expectation::$variant {
                        $($key: self.$key,)?
                        response: Ok(value),
                    });
                }

                /// Answer the matching request with `Err(error)`.
                pub fn return_err(self, error: FrameworkError) {
                    lock(&self.expectations).push_back(Expectation::$variant {
                        $($key: self.$key,)?
                        response: Err(error),
                    });
                }
            }
        )*
    };
}

respond_builders! {
    GetExpectationBuilder => Get { id } : Option<T>;
    ListExpectationBuilder => List {} : Vec<T>;
    CreateExpectationBuilder => Create {} : T::Id;
    UpdateExpectationBuilder => Update { id } : T;
    DeleteExpectationBuilder => Delete { id } : ();
    ActionExpectationBuilder => Action { id } : T::ActionResult;
}

// =============================================================================
// RAW RECEIVER HELPERS
// =============================================================================

/// Creates a client together with the receiver its requests arrive on.
///
/// The test plays the actor: it pops requests with the `expect_*` helpers below, inspects the
/// payloads and answers through the returned responder, including delays or failures.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (events, _) = broadcast::channel(16);
    (ResourceClient::new(sender, events), receiver)
}

/// Next message, if it is a Create request.
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Create, Response<T::Id>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Next message, if it is a Get request.
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Next message, if it is an Action request.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
