//! Folio: a cursor-paginated blog listing service and the incremental list
//! that consumes it.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
