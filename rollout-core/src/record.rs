//! Types and traits for recording rollout results.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - The types of values that can be stored
//! * [`Recorder`] - Destination of records written during a rollout
//! * [`RecordStorage`] - Aggregates stored records into statistics
//! * [`BufferedRecorder`] - A recorder that keeps records in memory
//! * [`NullRecorder`] - A recorder that discards all records
//!
//! ```rust
//! use rollout_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode_reward", RecordValue::Scalar(21.0));
//! record.insert("episode_steps", RecordValue::Scalar(84.0));
//! assert_eq!(record.get_scalar("episode_reward").unwrap(), 21.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;
