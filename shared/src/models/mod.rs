//! Domain models for the Marine Research Platform

mod catch;
mod dataset;
mod environment;
mod length;

pub use catch::*;
pub use dataset::*;
pub use environment::*;
pub use length::*;
