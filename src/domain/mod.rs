//! Domain layer types and invariants.

pub mod authoring;
pub mod entities;
pub mod error;
pub mod slug;
