//! Result records and result sets.

use std::ops::Index;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// One item returned by the server: tag name → value.
///
/// Fields keep the tag order of the chain that produced them, so records from
/// the same chain compare and hash field-by-field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Build a record from `(tag, value)` pairs. Later duplicates of a tag are
    /// dropped.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut out: Vec<(String, String)> = Vec::new();
        for (k, v) in fields {
            let k = k.into();
            if out.iter().any(|(existing, _)| *existing == k) {
                continue;
            }
            out.push((k, v.into()));
        }
        Self { fields: out }
    }

    /// Build a record from one JSON item of the `result` array.
    ///
    /// The item's keys must be exactly `tags`, and every value a string.
    pub(crate) fn from_json(
        index: usize,
        item: &Value,
        tags: &[String],
    ) -> Result<Self, ProtocolError> {
        let malformed = |reason: String| ProtocolError::MalformedRecord {
            index,
            expected: tags.to_vec(),
            reason,
        };

        let obj: &Map<String, Value> = item
            .as_object()
            .ok_or_else(|| malformed(format!("expected an object, got {item}")))?;

        if let Some(extra) = obj.keys().find(|k| !tags.contains(k)) {
            return Err(malformed(format!("unexpected key '{extra}'")));
        }

        let mut fields = Vec::with_capacity(tags.len());
        for tag in tags {
            let value = obj
                .get(tag)
                .ok_or_else(|| malformed(format!("missing tag '{tag}'")))?;
            let value = value
                .as_str()
                .ok_or_else(|| malformed(format!("tag '{tag}' is not a string: {value}")))?;
            fields.push((tag.clone(), value.to_string()));
        }
        Ok(Self { fields })
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == tag)
            .map(|(_, v)| v.as_str())
    }

    /// The `id` field every vertex traversal carries.
    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replace every value, keeping tags and their order.
    pub fn map_values(self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            fields: self
                .fields
                .into_iter()
                .map(|(k, v)| {
                    let v = f(&v);
                    (k, v)
                })
                .collect(),
        }
    }
}

impl Index<&str> for Record {
    type Output = str;

    fn index(&self, tag: &str) -> &str {
        match self.get(tag) {
            Some(v) => v,
            None => panic!("record has no tag '{tag}'"),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Records returned by one execution, after client-side operators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<Record>,
    distinct: bool,
}

impl ResultSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            distinct: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// True once a `Distinct` operator has been applied.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub(crate) fn into_parts(self) -> (Vec<Record>, bool) {
        (self.records, self.distinct)
    }

    pub(crate) fn from_parts(records: Vec<Record>, distinct: bool) -> Self {
        Self { records, distinct }
    }
}

impl Index<usize> for ResultSet {
    type Output = Record;

    fn index(&self, index: usize) -> &Record {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
