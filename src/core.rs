//! The core module defines the business logic of docpath.
//! It provides the traits and models upstream adapters need to implement.

pub mod context;
pub mod model;
pub mod path;
pub mod repo;
pub mod service;
pub mod template;
