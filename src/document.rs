//! The document tree edited by the form engine.
//!
//! A profile or a project is held as a small tree of records, lists and text leaves. The tree
//! serialises untagged, so a stored document is plain JSON and any JSON object made of strings,
//! integers, arrays and objects reads back as a document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the top-level field carrying a stored document's identity key.
pub const IDENTITY_FIELD: &str = "id";

/// Named children of a record, kept in key order.
pub type Fields = BTreeMap<String, Value>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
/// A single node of the document tree.
pub enum Value {
    /// A text leaf.
    Text(String),
    /// An integer leaf, used for ordering keys.
    Number(i64),
    /// An ordered sequence of text leaves or records.
    List(Vec<Value>),
    /// A named sub-object: a section, a nested section, or a list entry.
    Record(Fields),
}

impl Value {
    #[must_use]
    /// An empty text leaf.
    pub fn empty_text() -> Self {
        Self::Text(String::new())
    }

    #[must_use]
    /// An empty list.
    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    #[must_use]
    /// An empty record.
    pub fn empty_record() -> Self {
        Self::Record(Fields::new())
    }

    #[must_use]
    /// Text content, if this is a text leaf.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    /// Integer content, if this is a number leaf.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    /// List items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    /// Record fields, if this is a record.
    pub fn as_record(&self) -> Option<&Fields> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    /// Text of a named field of a record, if present.
    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.as_record()?.get(name)?.as_text()
    }

    #[must_use]
    /// One-line rendering used by list and status displays.
    pub fn summary(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(n) => n.to_string(),
            Self::List(items) => format!("[{} items]", items.len()),
            Self::Record(fields) => fields
                .iter()
                .filter_map(|(k, v)| v.as_text().map(|t| format!("{k}: {t}")))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(Value::from).collect())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
/// Root record of a profile or project.
pub struct Document {
    fields: Fields,
}

impl Document {
    #[must_use]
    /// An empty document with no fields at all.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    /// Wraps an existing set of top-level fields.
    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    #[must_use]
    /// Top-level fields in key order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[must_use]
    /// Consumes the document, yielding its top-level fields.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    #[must_use]
    /// Looks up a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Mutable access to a top-level field.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Sets a top-level field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Removes a top-level field.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    #[must_use]
    /// Identity key of a stored document, absent while the document is being created.
    pub fn id(&self) -> Option<&str> {
        self.get(IDENTITY_FIELD)
            .and_then(Value::as_text)
            .filter(|id| !id.is_empty())
    }

    #[must_use]
    /// Copy of the document carrying the given identity key.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.insert(IDENTITY_FIELD, Value::Text(id.into()));
        self
    }

    #[must_use]
    /// Text of a top-level field, or the empty string.
    pub fn text(&self, field: &str) -> &str {
        self.get(field).and_then(Value::as_text).unwrap_or_default()
    }

    /// Parses a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of supported values.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Renders the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "tests/document.rs"]
mod tests;
