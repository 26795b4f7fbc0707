//! Admin authentication: password hashing and bearer sessions.

pub mod password;
pub mod sessions;

pub use password::{hash_password, verify_password, PasswordError};
pub use sessions::{Session, SessionStore};
