//! Records and metrics.
//!
//! * [`Record`] - A container of key-value pairs of [`RecordValue`]
//! * [`Recorder`] - A sink that writes records somewhere
//! * [`Metrics`] - A registry of named scalar series owned by a controller
//! * [`BufferedRecorder`] - Keeps records in memory
//! * [`NullRecorder`] - Discards all records
//!
//! ```rust
//! use stride_core::record::{Record, RecordValue};
//!
//! // following values are obtained with some process in reality
//! let step = 1;
//! let reward = -1f32;
//!
//! let mut record = Record::empty();
//! record.insert("step", RecordValue::Scalar(step as f32));
//! record.insert("reward", RecordValue::Scalar(reward));
//! ```
mod base;
mod buffered_recorder;
mod metrics;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use metrics::{MetricKind, Metrics, DEFAULT_QUEUE_LEN, STEP_KEY};
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
