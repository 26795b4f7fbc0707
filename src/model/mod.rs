//! Domain data: menus, restaurants, orders and the multilingual text they share.
//!
//! Plain data plus validation. The actors in [`crate::restaurant_actor`] and
//! [`crate::order_actor`] implement [`ActorEntity`](resource_actor::ActorEntity) for
//! [`Restaurant`] and [`Order`].

pub mod i18n;
pub mod menu;
pub mod order;
pub mod restaurant;

pub use i18n::*;
pub use menu::*;
pub use order::*;
pub use restaurant::*;
