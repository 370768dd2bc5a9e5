//! Record and dataset models
//!
//! Re-exports the shared models so handlers and storage use one definition

pub use shared::models::*;
