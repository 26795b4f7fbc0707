//! Durable stores for the resource actors.
//!
//! Without a data directory the actors run on [`MemoryStore`](resource_actor::MemoryStore)
//! and forget everything on restart.

pub mod json_file;

pub use json_file::JsonFileStore;
