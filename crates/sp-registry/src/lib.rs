//! # sp-registry
//!
//! Client for the external community registry (contacts, businesses,
//! properties, events).
//!
//! This crate provides the `Registry` trait the portal core consumes, the
//! HTTP implementation against the Ginkgo registry API, and an in-memory
//! mock for tests.

pub mod ginkgo;
pub mod http;
pub mod mock;
pub mod secret;
pub mod traits;

pub use ginkgo::{GinkgoConfig, GinkgoRegistry};
pub use mock::MockRegistry;
pub use secret::Secret;
pub use traits::{
    coerce_id, EntityKind, EventFields, Fields, Record, Registry, RegistryError, RegistryResult,
};
