//! Taskstream Redis Data Layer
//!
//! Provides async Redis-based persistence for task items plus the
//! change-feed primitive the realtime subsystem subscribes to.

pub mod changes;
pub mod client;
pub mod queries;

pub use changes::{
    ChangeEvent, ChangeSource, ChangeStream, ItemDelta, ItemFilter, RedisChangeSource,
};
pub use client::{DbError, DbResult, RedisPool, init_pool};
pub use queries::items;
