//! Data layer: provider abstraction, concrete providers, frame ingestion and
//! the retrieval adapter.

pub mod circuit_breaker;
pub mod csv_provider;
pub mod ingest;
pub mod provider;
pub mod retrieval;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_provider::{CsvDirectoryProvider, CSV_INDEX_COLUMN};
pub use ingest::{read_csv_table, read_parquet_table, series_from_frame};
pub use provider::{PriceProvider, ProviderError};
pub use retrieval::{fetch_multiple, fetch_single};
pub use yahoo::YahooProvider;
