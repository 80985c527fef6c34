//! Registry of named metric series.
use super::{Record, RecordValue, Recorder};
use crate::error::StrideError;
use chrono::Local;
use log::{debug, info};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// Default number of samples kept by a [`MetricKind::Queue`] series.
pub const DEFAULT_QUEUE_LEN: usize = 100;

/// Key of the step value in records written by [`Metrics::log_metric`].
pub const STEP_KEY: &str = "step";

/// Kind of a metric series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A running sum. `add` accumulates, `get` returns the sum.
    Single,

    /// A window of the most recent samples. `get` returns their mean.
    Queue,
}

enum Series {
    Single(f32),
    Queue(VecDeque<f32>),
}

/// Named scalar series written by controllers and flushed to a [`Recorder`].
///
/// ```rust
/// use stride_core::record::{MetricKind, Metrics, NullRecorder};
///
/// let mut metrics = Metrics::new(Box::new(NullRecorder::default()));
/// metrics.register("step", MetricKind::Single);
/// metrics.register("reward", MetricKind::Queue);
///
/// metrics.add("step", 4.0).unwrap();
/// metrics.add("step", 4.0).unwrap();
/// metrics.add("reward", 1.0).unwrap();
/// metrics.add("reward", 3.0).unwrap();
///
/// assert_eq!(metrics.get("step").unwrap(), Some(8.0));
/// assert_eq!(metrics.get("reward").unwrap(), Some(2.0));
/// ```
pub struct Metrics {
    series: HashMap<String, Series>,
    queue_len: usize,
    recorder: Box<dyn Recorder>,
}

impl Metrics {
    /// Creates an empty registry writing to `recorder`.
    pub fn new(recorder: Box<dyn Recorder>) -> Self {
        Self {
            series: HashMap::new(),
            queue_len: DEFAULT_QUEUE_LEN,
            recorder,
        }
    }

    /// Sets the number of samples kept by queue series registered afterwards.
    pub fn queue_len(mut self, queue_len: usize) -> Self {
        self.queue_len = queue_len.max(1);
        self
    }

    /// Registers a series. Registering an existing name keeps the existing series.
    pub fn register(&mut self, name: &str, kind: MetricKind) {
        if self.series.contains_key(name) {
            return;
        }
        let series = match kind {
            MetricKind::Single => Series::Single(0.0),
            MetricKind::Queue => Series::Queue(VecDeque::with_capacity(self.queue_len)),
        };
        self.series.insert(name.to_string(), series);
    }

    /// Returns `true` if a series with the name is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Adds a sample to a series.
    pub fn add(&mut self, name: &str, value: f32) -> Result<(), StrideError> {
        let queue_len = self.queue_len;
        match self.series.get_mut(name) {
            Some(Series::Single(sum)) => *sum += value,
            Some(Series::Queue(queue)) => {
                if queue.len() == queue_len {
                    queue.pop_front();
                }
                queue.push_back(value);
            }
            None => return Err(StrideError::RecordKeyError(name.to_string())),
        }
        Ok(())
    }

    /// Returns the current value of a series.
    ///
    /// A queue series returns the mean of its window, or `None` while empty.
    pub fn get(&self, name: &str) -> Result<Option<f32>, StrideError> {
        match self.series.get(name) {
            Some(Series::Single(sum)) => Ok(Some(*sum)),
            Some(Series::Queue(queue)) if queue.is_empty() => Ok(None),
            Some(Series::Queue(queue)) => {
                Ok(Some(queue.iter().sum::<f32>() / queue.len() as f32))
            }
            None => Err(StrideError::RecordKeyError(name.to_string())),
        }
    }

    /// Returns the number of samples held by a series; 1 for a single series.
    pub fn count(&self, name: &str) -> Result<usize, StrideError> {
        match self.series.get(name) {
            Some(Series::Single(_)) => Ok(1),
            Some(Series::Queue(queue)) => Ok(queue.len()),
            None => Err(StrideError::RecordKeyError(name.to_string())),
        }
    }

    /// Writes the current value of a series to the recorder, tagged with `step`.
    ///
    /// Empty queues are skipped.
    pub fn log_metric(&mut self, name: &str, step: usize) -> Result<(), StrideError> {
        let value = match self.get(name)? {
            Some(value) => value,
            None => {
                debug!("Skip logging {}: no samples", name);
                return Ok(());
            }
        };
        info!("{} = {} at step {}", name, value, step);

        let record = Record::from_slice(&[
            (name.to_string(), RecordValue::Scalar(value)),
            (STEP_KEY.to_string(), RecordValue::Scalar(step as f32)),
            (
                "datetime".to_string(),
                RecordValue::DateTime(Local::now()),
            ),
        ]);
        self.recorder.write(record);
        Ok(())
    }

    /// Writes hyperparameters as a YAML string to the recorder.
    pub fn log_parameters<T: Serialize>(&mut self, params: &T) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(params)?;
        info!("Hyperparameters:\n{}", yaml);
        self.recorder
            .write(Record::from_slice(&[("parameters", RecordValue::String(yaml))]));
        Ok(())
    }
}
