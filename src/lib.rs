// Pink Morsel Sales - Core Library
// Exposes the pipeline and query engine for the CLI, API server, and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod records;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::{PipelineConfig, QueryConfig};
pub use error::{PipelineError, QueryError};
pub use pipeline::{
    build_dataset, read_dataset, write_dataset,
    BuildReport, SalesPipeline, SourceStat,
};
pub use query::{
    query, query_region,
    QueryResult, RegionSelector, SalesSnapshot, SeriesPoint,
};
pub use records::{DerivedSalesRecord, RawSalesRecord, Region};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
