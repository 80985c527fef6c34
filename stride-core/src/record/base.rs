//! Key-value records.
//!
//! A [`Record`] is the unit of telemetry in the library. Environments attach
//! one to every step as auxiliary information, controllers return one from
//! each update, and [`Metrics`](super::Metrics) hands one to a
//! [`Recorder`](super::Recorder) whenever a metric is logged.
use crate::error::StrideError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{hash_map::Iter, HashMap},
    convert::Into,
};

/// Possible types of values in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically a loss or an episode return.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values.
    Array1(Vec<f32>),

    /// A text value, e.g. serialized hyperparameters.
    String(String),
}

/// A container of key-value pairs of [`RecordValue`].
///
/// ```rust
/// use stride_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss", 0.5);
/// record.insert("obs", RecordValue::Array1(vec![1.0, 2.0]));
///
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// assert!(record.get_scalar("obs").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record.
    ///
    /// An existing value under the same key is replaced.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records, consuming both.
    ///
    /// If both records contain the same key, the value from `record` wins.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    ///
    /// # Errors
    ///
    /// Returns [`StrideError::RecordKeyError`] if the key does not exist and
    /// [`StrideError::RecordValueTypeError`] if the value is not a scalar.
    pub fn get_scalar(&self, k: &str) -> Result<f32, StrideError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(StrideError::RecordValueTypeError("Scalar".to_string())),
            None => Err(StrideError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, StrideError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(StrideError::RecordValueTypeError("Array1".to_string())),
            None => Err(StrideError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, StrideError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(StrideError::RecordValueTypeError("String".to_string())),
            None => Err(StrideError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record contains no key-value pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of key-value pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
