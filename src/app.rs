//! Module containing concrete implementations from the [core](crate::core) module.

pub mod repo;
pub mod state;
