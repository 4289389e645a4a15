//! Application services layer.

pub mod blogs;
pub mod error;
pub mod listing;
pub mod pagination;
pub mod reading;
pub mod repos;
pub mod seed;
pub mod trigger;
