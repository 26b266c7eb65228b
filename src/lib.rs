//! museum-federation: federated search over museum open-data dumps
//!
//! Each institution's dump is loaded into its own SQLite store by an adapter.
//! The [`federation::CollectionFederator`] searches every store at once and
//! merges the results into one normalized shape.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod error;
pub mod etl;
pub mod federation;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
