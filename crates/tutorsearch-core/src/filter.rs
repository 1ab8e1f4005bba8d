//! Metadata filters in the operator form the vector service understands.
//!
//! A filter is a conjunction of per-field conditions and serializes as
//! `{"grade": {"$eq": "ח"}, "svg_exists": {"$eq": true}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Condition {
    #[serde(rename = "$eq")]
    Eq(Value),
    #[serde(rename = "$ne")]
    Ne(Value),
    #[serde(rename = "$gt")]
    Gt(Value),
    #[serde(rename = "$gte")]
    Gte(Value),
    #[serde(rename = "$lt")]
    Lt(Value),
    #[serde(rename = "$lte")]
    Lte(Value),
    #[serde(rename = "$in")]
    In(Vec<Value>),
    #[serde(rename = "$nin")]
    Nin(Vec<Value>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MetadataFilter(BTreeMap<String, Condition>);

impl MetadataFilter {
    pub fn new() -> Self { Self::default() }

    /// Builds an all-equality filter, e.g. from the `[search.filter]` table.
    pub fn from_equalities<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut filter = Self::new();
        for (field, value) in pairs { filter.insert(field, Condition::Eq(value)); }
        filter
    }

    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, Condition::Eq(value.into()));
        self
    }

    /// Later conditions on the same field replace earlier ones.
    pub fn insert(&mut self, field: impl Into<String>, condition: Condition) {
        self.0.insert(field.into(), condition);
    }

    pub fn get(&self, field: &str) -> Option<&Condition> { self.0.get(field) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }
}

/// Parse a `field=value` assignment.
///
/// The value is read as JSON when it parses (`true`, `8`, `"8"`), otherwise it
/// is taken verbatim as a string, so `grade=ח` yields the string `"ח"`.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), Error> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::InvalidConfig(format!("filter '{raw}' must look like field=value")))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(Error::InvalidConfig(format!("filter '{raw}' has an empty field name")));
    }
    let value = value.trim();
    let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}
