//! Compensating writes against the services that own each entity type.
//!
//! The history service never edits domain data itself. Undo and redo ask the
//! owning collaborator to overwrite the entity with a stored snapshot, through
//! a [`RestorationDispatcher`] built once at startup from a fixed registry of
//! [`Restorable`] implementations.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;

pub use config::CollaboratorConfig;
pub use dispatcher::{DispatcherBuilder, Restorable, RestorationDispatcher};
pub use error::{RegistryError, RestoreError};
pub use http::HttpRestorer;
