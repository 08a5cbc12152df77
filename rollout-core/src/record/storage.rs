//! Record storage and aggregation.
use super::{Record, RecordValue};
use crate::error::RolloutError;
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// A storage of records with aggregation capabilities.
///
/// Scalars stored under the same key are summarized with min, max, mean and median.
/// For the other value types the most recent value is kept.
///
/// ```rust
/// use rollout_core::record::{Record, RecordStorage};
///
/// let mut storage = RecordStorage::new();
/// storage.store(Record::from_scalar("episode_reward", 1.0));
/// storage.store(Record::from_scalar("episode_reward", 3.0));
///
/// let record = storage.aggregate().unwrap();
/// assert_eq!(record.get_scalar("episode_reward_mean").unwrap(), 2.0);
/// ```
#[derive(Debug, Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

/// Upper median; sorts the values in place.
fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

fn type_name(value: &RecordValue) -> &'static str {
    match value {
        RecordValue::Scalar(_) => "Scalar",
        RecordValue::DateTime(_) => "DateTime",
        RecordValue::Array1(_) => "Array1",
        RecordValue::String(_) => "String",
    }
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    /// Values under the key, oldest first. All values must have the same type.
    fn values(&self, key: &str) -> Result<Vec<&RecordValue>, RolloutError> {
        let values: Vec<_> = self.data.iter().filter_map(|r| r.get(key)).collect();
        if let Some(first) = values.first() {
            let expected = type_name(first);
            if let Some(v) = values.iter().find(|v| type_name(v) != expected) {
                return Err(RolloutError::RecordValueTypeError(format!(
                    "{} for {}, found {}",
                    expected,
                    key,
                    type_name(v)
                )));
            }
        }
        Ok(values)
    }

    fn scalar(key: &str, vs: Vec<f32>) -> Record {
        if vs.len() == 1 {
            Record::from_scalar(key, vs[0])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Result<Record, RolloutError> {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let values = self.values(key)?;
            let r = match values.last() {
                Some(RecordValue::Scalar(_)) => {
                    let vs = values
                        .iter()
                        .filter_map(|v| match v {
                            RecordValue::Scalar(v) => Some(*v),
                            _ => None,
                        })
                        .collect();
                    Self::scalar(key, vs)
                }
                Some(last) => Record::from_slice(&[(key.as_str(), (*last).clone())]),
                None => continue,
            };
            record.merge_inplace(r);
        }

        self.data.clear();

        Ok(record)
    }
}
