//! Shared types, models, and fisheries analytics for the Marine Research Platform
//!
//! This crate contains the record models shared between the backend and the
//! browser (via WASM), together with the pure stock-assessment analytics.

pub mod analytics;
pub mod models;
pub mod types;
pub mod validation;

pub use analytics::*;
pub use models::*;
pub use types::*;
pub use validation::*;
