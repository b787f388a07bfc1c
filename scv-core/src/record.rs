//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - The values a [`Record`] can hold
//! * [`Recorder`] - Destination of records
//! * [`RecordStorage`] - Aggregates stored records
//! * [`LogRecorder`] - Aggregates records and writes them to the log
//! * [`BufferedRecorder`] - Keeps records in memory
//!
//! ```rust
//! use scv_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode_steps", RecordValue::Scalar(42.0));
//! record.insert("map", RecordValue::String("CollectMineralsAndGas".into()));
//! assert_eq!(record.get_scalar("episode_steps").unwrap(), 42.0);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;
