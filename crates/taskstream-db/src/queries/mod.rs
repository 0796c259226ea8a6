//! Query modules for each entity type.

pub mod items;
