//! HTTP route handlers.

pub mod items;
