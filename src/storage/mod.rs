//! SQLite storage for the ingested dataset
//!
//! Holds the completed and upcoming collections plus the fighter metrics
//! snapshot. Each run reads the store once and writes it once.

pub mod merge;
pub mod repository;
pub mod schema;

pub use merge::merge;
pub use repository::{DatasetStore, SaveMode};
