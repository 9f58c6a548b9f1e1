//! Media intelligence core: campaign data model, configuration, error
//! taxonomy, file cleaning and filtering.

pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod types;

pub use config::AppConfig;
pub use error::{MediaError, MediaResult};
pub use filter::{FilterCriteria, FilterOptions};
pub use ingest::{CleanedDataset, CleaningReport};
pub use types::{DateBounds, Dimension, MediaPost};
