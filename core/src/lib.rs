//! Local persistence for the ML Health tracker: food, exercise, supplement,
//! weight and water logs plus custom foods, recipes, meal plans and grocery
//! lists, stored in a single SQLite file.
//!
//! Open a [`Store`] (or a [`HealthService`], which wraps one), then go through
//! the per-family repositories in [`repo`].

pub mod codec;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod repo;
pub mod schema;
pub mod service;
pub mod store;

pub use config::{StoreConfig, StoreLocation};
pub use error::{Result, StoreError};
pub use guard::{SchemaGuard, SchemaMarker, SchemaState};
pub use models::*;
pub use repo::{Entity, Repository};
pub use service::HealthService;
pub use store::Store;
