//! Business logic services for the Marine Research Platform

pub mod dataset;
pub mod fisheries;
pub mod import;
pub mod presentation;

pub use dataset::DatasetService;
pub use fisheries::FisheriesService;
