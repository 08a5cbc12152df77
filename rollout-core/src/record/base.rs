//! Key-value records.
use crate::error::RolloutError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{IntoIter, Iter, Keys},
    HashMap,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, e.g. an episode reward.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values, e.g. an observation.
    Array1(Vec<f32>),

    /// A text value, e.g. a policy id.
    String(String),
}

/// A container for storing key-value pairs of various data types.
///
/// ```rust
/// use rollout_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("value", 0.5);
/// record.insert("policy", RecordValue::String("default_policy".into()));
/// assert_eq!(record.get_scalar("value").unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default)]
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

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator that consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records, consuming both.
    ///
    /// Values of the second record overwrite those of the first on the same key.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Prepends `prefix/` to every key.
    pub fn with_prefix(self, prefix: &str) -> Self {
        Record(
            self.0
                .into_iter()
                .map(|(k, v)| (format!("{}/{}", prefix, k), v))
                .collect(),
        )
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RolloutError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(RolloutError::RecordValueTypeError("Scalar".to_string())),
            None => Err(RolloutError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, RolloutError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(RolloutError::RecordValueTypeError("Array1".to_string())),
            None => Err(RolloutError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, RolloutError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(RolloutError::RecordValueTypeError("String".to_string())),
            None => Err(RolloutError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let mut record = Record::from_scalar("reward", 1.5);
        record.insert("policy", RecordValue::String("p".into()));

        assert_eq!(record.get_scalar("reward").unwrap(), 1.5);
        assert!(matches!(
            record.get_scalar("policy"),
            Err(RolloutError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            record.get_scalar("missing"),
            Err(RolloutError::RecordKeyError(_))
        ));
    }

    #[test]
    fn test_merge_and_prefix() {
        let r1 = Record::from_slice(&[
            ("a", RecordValue::Scalar(1.0)),
            ("b", RecordValue::Scalar(2.0)),
        ]);
        let r2 = Record::from_scalar("b", 3.0);
        let record = r1.merge(r2).with_prefix("agent0");

        assert_eq!(record.len(), 2);
        assert_eq!(record.get_scalar("agent0/a").unwrap(), 1.0);
        assert_eq!(record.get_scalar("agent0/b").unwrap(), 3.0);
    }
}
