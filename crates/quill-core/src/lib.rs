//! # Quill Core
//!
//! The domain layer of the Quill blogging backend.
//! This crate contains entities, ports, the authorization rules and the
//! services built on top of them. It has zero infrastructure dependencies.

pub mod authz;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError, ValidationErrors};
