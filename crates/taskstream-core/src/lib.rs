//! Taskstream Core Library
//!
//! Domain models and business logic for the task-list application.

pub mod error;
pub mod item;

pub use error::{TaskError, TaskResult};
