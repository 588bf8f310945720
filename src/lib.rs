pub mod analysis;
pub mod core;
pub mod detection;
pub mod monitoring;
pub mod service;
