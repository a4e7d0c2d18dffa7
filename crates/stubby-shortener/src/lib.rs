//! The URL store.
//!
//! [`UrlStoreService`] combines a [`Repository`](stubby_core::Repository)
//! with an alias [`Generator`](stubby_generator::Generator) and implements
//! the collaborator interface [`UrlMapper`](stubby_core::UrlMapper).

pub mod service;

pub use service::{StoreSettings, UrlStoreService, DEFAULT_MAX_ATTEMPTS};
