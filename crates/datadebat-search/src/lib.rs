//! Search-engine access for the debate index: client, retry policy, bulk
//! loader, index mapping and status monitor.

pub mod bulk;
pub mod client;
pub mod error;
pub mod mapping;
pub mod monitor;
pub(crate) mod retry;
pub mod types;

pub use bulk::{write_records, RecordFailure, WriteMode, WriteReport};
pub use client::{SearchClient, SearchConfig};
pub use error::SearchError;
pub use mapping::index_definition;
pub use monitor::{collect_status, IndexStatus};
pub use types::{ClusterHealth, IndexStats, TermFilter};
