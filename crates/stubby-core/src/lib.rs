//! Core types and traits for the Stubby URL shortener.
//!
//! This crate provides the shared vocabulary of the workspace: the validated
//! [`Alias`], the persisted [`UrlRecord`], the storage seam ([`Repository`]),
//! the interface offered to collaborators ([`UrlMapper`]) and the per-call
//! [`Context`] carrying deadlines and cancellation.

pub mod alias;
pub mod context;
pub mod error;
pub mod mapper;
pub mod repository;

pub use alias::Alias;
pub use context::{CancelHandle, Context, Interrupted};
pub use error::{MappingError, Signal, StorageError};
pub use mapper::{CreatedMapping, UrlMapper};
pub use repository::{ReadRepository, Repository, UrlRecord};
