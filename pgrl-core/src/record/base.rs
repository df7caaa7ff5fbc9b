//! Key-value records.
use crate::error::PgrlError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{IntoIter, Iter},
    HashMap,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// Represents a scalar, e.g., optimization steps and loss value.
    Scalar(f32),

    /// Represents a datetime.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f32>),

    /// String.
    String(String),
}

/// Represents a record.
#[derive(Debug, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Construct empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Create `Record` from a scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Create `Record` from slice of `(Into<String>, RecordValue)`.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Adds a record with the current local time under key `"datetime"`.
    pub fn with_datetime(mut self) -> Self {
        self.insert("datetime", RecordValue::DateTime(Local::now()));
        self
    }

    /// Insert a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Return an iterator over key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Return an iterator over key-value pairs in the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Get the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merge records. Values of `record` win on duplicated keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Get scalar value.
    ///
    /// * `key` - The key of an entry in the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, PgrlError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(PgrlError::RecordValueTypeError("Scalar".to_string())),
            None => Err(PgrlError::RecordKeyError(k.to_string())),
        }
    }

    /// Get Array1 value.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, PgrlError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(PgrlError::RecordValueTypeError("Array1".to_string())),
            None => Err(PgrlError::RecordKeyError(k.to_string())),
        }
    }

    /// Get String value.
    pub fn get_string(&self, k: &str) -> Result<String, PgrlError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(PgrlError::RecordValueTypeError("String".to_string())),
            None => Err(PgrlError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns true if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_get() {
        let r1 = Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.0)),
            ("name", RecordValue::String("pg".into())),
        ]);
        let r2 = Record::from_scalar("loss", 0.5);
        let r = r1.merge(r2);

        assert_eq!(r.len(), 2);
        assert_eq!(r.get_scalar("loss").unwrap(), 0.5);
        assert_eq!(r.get_string("name").unwrap(), "pg");
        assert!(matches!(
            r.get_array1("name"),
            Err(PgrlError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            r.get_scalar("missing"),
            Err(PgrlError::RecordKeyError(_))
        ));
    }
}
