//! Types and traits for recording training metrics.
//!
//! Training operations of an [`Agent`](crate::Agent) return a [`Record`]
//! holding values such as the loss. The [`Trainer`](crate::Trainer) adds
//! statistics of the collected traces and hands the records to an
//! [`AggregateRecorder`].
//!
//! ```rust
//! use pgrl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("loss", RecordValue::Scalar(0.25));
//! record.insert("returns", RecordValue::Array1(vec![1.0, 0.98]));
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.25);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
