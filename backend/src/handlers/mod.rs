//! HTTP handlers for the Marine Research Platform API

pub mod datasets;
pub mod fisheries;
pub mod health;

pub use datasets::*;
pub use fisheries::*;
pub use health::*;
