//! Infrastructure layer: catalog storage, configuration, external services.

pub mod config;
pub mod external;
pub mod read_model;
pub mod seed;
