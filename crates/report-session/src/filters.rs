//! User-supplied filter values.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::ReportTemplate;

/// Mapping from filter id to the value the user entered.
///
/// Keys keep the order in which they were first set; updating an existing key
/// keeps its position. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterValues {
    entries: Vec<(String, String)>,
}

impl FilterValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value for `filter_id`.
    ///
    /// Returns the previous value, if any.
    pub fn set(
        &mut self,
        filter_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        let filter_id = filter_id.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == filter_id) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((filter_id, value));
                None
            }
        }
    }

    pub fn get(&self, filter_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == filter_id)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, filter_id: &str) -> bool {
        self.get(filter_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates `(filter_id, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Filter ids of `template` that have no value yet, in template order.
    ///
    /// An empty string counts as a value.
    pub fn missing_for(&self, template: &ReportTemplate) -> Vec<String> {
        template
            .filters
            .iter()
            .filter(|spec| !self.contains(&spec.id))
            .map(|spec| spec.id.clone())
            .collect()
    }

    /// Returns `true` when every filter of `template` has a value.
    pub fn is_complete_for(&self, template: &ReportTemplate) -> bool {
        template.filters.iter().all(|spec| self.contains(&spec.id))
    }

    /// Formats values as `key: value` pairs joined by `", "`.
    pub fn display(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<K, V> FromIterator<(K, V)> for FilterValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FilterValues::new();
        for (k, v) in iter {
            values.set(k, v);
        }
        values
    }
}

impl Serialize for FilterValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct FilterValuesVisitor;

impl<'de> Visitor<'de> for FilterValuesVisitor {
    type Value = FilterValues;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of filter ids to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut values = FilterValues::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            values.set(key, value);
        }
        Ok(values)
    }
}

impl<'de> Deserialize<'de> for FilterValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FilterValuesVisitor)
    }
}
