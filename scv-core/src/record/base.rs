//! Key-value records of training metrics.
use crate::error::ScvError;
use chrono::prelude::{DateTime, Local};
use std::collections::{btree_map, BTreeMap};

/// A value held by a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A metric such as a loss or an episode return.
    Scalar(f32),

    /// A wall-clock time.
    DateTime(DateTime<Local>),

    /// A label such as a map or algorithm name.
    String(String),
}

impl RecordValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::DateTime(_) => "DateTime",
            Self::String(_) => "String",
        }
    }
}

/// Metrics emitted by an agent or the training loop, ordered by key.
///
/// ```rust
/// use scv_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss_critic", 0.5);
/// record.insert("epoch", RecordValue::Scalar(3.0));
/// assert_eq!(record.get_scalar("loss_critic").unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, RecordValue>);

impl Record {
    /// A record without entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A record holding one scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        let mut record = Self::empty();
        record.insert(name, RecordValue::Scalar(value));
        record
    }

    /// A record holding the given entries.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        s.iter()
            .map(|(k, v)| (k.clone().into(), v.clone()))
            .collect()
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Combines two records; entries of `other` replace those of `self`.
    pub fn merge(mut self, other: Record) -> Self {
        self.0.extend(other.0);
        self
    }

    fn typed<T>(
        &self,
        k: &str,
        expected: &str,
        f: impl FnOnce(&RecordValue) -> Option<T>,
    ) -> Result<T, ScvError> {
        let v = self
            .0
            .get(k)
            .ok_or_else(|| ScvError::RecordKeyError(k.to_string()))?;
        f(v).ok_or_else(|| {
            ScvError::RecordValueTypeError(format!("{} (found {})", expected, v.type_name()))
        })
    }

    /// Returns the scalar stored under `k`.
    pub fn get_scalar(&self, k: &str) -> Result<f32, ScvError> {
        self.typed(k, "Scalar", |v| match v {
            RecordValue::Scalar(x) => Some(*x),
            _ => None,
        })
    }

    /// Returns the string stored under `k`.
    pub fn get_string(&self, k: &str) -> Result<String, ScvError> {
        self.typed(k, "String", |v| match v {
            RecordValue::String(s) => Some(s.clone()),
            _ => None,
        })
    }
}

impl FromIterator<(String, RecordValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, RecordValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, RecordValue);
    type IntoIter = btree_map::IntoIter<String, RecordValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
