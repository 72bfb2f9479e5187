//! Addressing values inside a document.
//!
//! Forms address their fields at three depths: a top-level field, a field of a section, or a field
//! of a nested section inside a section. Paths are a tagged type rather than free-form key
//! strings, and they resolve through pure functions. Reads tolerate missing sections by falling
//! back to a default; writes tolerate them by creating the section on the way down.

use crate::document::{Document, Fields, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Location of a field in a document.
pub enum FieldPath {
    /// A top-level field, such as `title`.
    Scalar {
        /// Field name.
        field: String,
    },
    /// A field of a section, such as `techStack.fieldSkill`.
    Section {
        /// Section name.
        section: String,
        /// Field name inside the section.
        field: String,
    },
    /// A field of a nested section, such as `contribution.role.details`.
    Nested {
        /// Section name.
        section: String,
        /// Nested section name inside the section.
        nested: String,
        /// Field name inside the nested section.
        field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Rejected dotted path text.
pub enum PathError {
    /// The text had an empty segment, like `a..b` or a trailing dot.
    #[error("empty segment in field path {0:?}")]
    EmptySegment(String),
    /// The text addressed deeper than a nested section.
    #[error("field path {0:?} is deeper than section.nested.field")]
    TooDeep(String),
}

impl FieldPath {
    /// Path to a top-level field.
    pub fn scalar(field: impl Into<String>) -> Self {
        Self::Scalar {
            field: field.into(),
        }
    }

    /// Path to a field of a section.
    pub fn section(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Section {
            section: section.into(),
            field: field.into(),
        }
    }

    /// Path to a field of a nested section.
    pub fn nested(
        section: impl Into<String>,
        nested: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::Nested {
            section: section.into(),
            nested: nested.into(),
            field: field.into(),
        }
    }

    #[must_use]
    /// Name of the addressed field itself.
    pub fn field(&self) -> &str {
        match self {
            Self::Scalar { field } | Self::Section { field, .. } | Self::Nested { field, .. } => {
                field
            }
        }
    }

    #[must_use]
    /// Container names leading to the field, outermost first.
    pub fn parents(&self) -> Vec<&str> {
        match self {
            Self::Scalar { .. } => vec![],
            Self::Section { section, .. } => vec![section.as_str()],
            Self::Nested {
                section, nested, ..
            } => vec![section.as_str(), nested.as_str()],
        }
    }

    #[must_use]
    /// Path to a sibling field in the same container.
    pub fn sibling(&self, field: impl Into<String>) -> Self {
        match self {
            Self::Scalar { .. } => Self::scalar(field),
            Self::Section { section, .. } => Self::section(section.clone(), field),
            Self::Nested {
                section, nested, ..
            } => Self::nested(section.clone(), nested.clone(), field),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { field } => write!(f, "{field}"),
            Self::Section { section, field } => write!(f, "{section}.{field}"),
            Self::Nested {
                section,
                nested,
                field,
            } => write!(f, "{section}.{nested}.{field}"),
        }
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('.').collect();
        if segments.iter().any(|seg| seg.trim().is_empty()) {
            return Err(PathError::EmptySegment(s.to_string()));
        }
        match segments.as_slice() {
            [field] => Ok(Self::scalar(*field)),
            [section, field] => Ok(Self::section(*section, *field)),
            [section, nested, field] => Ok(Self::nested(*section, *nested, *field)),
            _ => Err(PathError::TooDeep(s.to_string())),
        }
    }
}

fn container<'a>(doc: &'a Document, path: &FieldPath) -> Option<&'a Fields> {
    match path {
        FieldPath::Scalar { .. } => Some(doc.fields()),
        FieldPath::Section { section, .. } => doc.get(section)?.as_record(),
        FieldPath::Nested {
            section, nested, ..
        } => doc.get(section)?.as_record()?.get(nested)?.as_record(),
    }
}

#[must_use]
/// Resolves a path, returning `None` when any step is missing.
pub fn read<'a>(doc: &'a Document, path: &FieldPath) -> Option<&'a Value> {
    container(doc, path)?.get(path.field())
}

#[must_use]
/// Resolves a path, falling back to `default` when any step is missing.
pub fn read_or(doc: &Document, path: &FieldPath, default: Value) -> Value {
    read(doc, path).cloned().unwrap_or(default)
}

#[must_use]
/// Items of the list at a path; empty when the path is missing or not a list.
pub fn read_list<'a>(doc: &'a Document, path: &FieldPath) -> &'a [Value] {
    read(doc, path).and_then(Value::as_list).unwrap_or(&[])
}

#[must_use]
/// Text at a path; empty when the path is missing or not text.
pub fn read_text<'a>(doc: &'a Document, path: &FieldPath) -> &'a str {
    read(doc, path).and_then(Value::as_text).unwrap_or_default()
}

/// Returns the record stored under `key`, replacing a missing or non-record value with an empty one.
fn record_entry<'a>(fields: &'a mut Fields, key: &str) -> &'a mut Fields {
    let slot = fields
        .entry(key.to_string())
        .or_insert_with(Value::empty_record);
    if !matches!(slot, Value::Record(_)) {
        *slot = Value::empty_record();
    }
    match slot {
        Value::Record(inner) => inner,
        _ => unreachable!("slot was just made a record"),
    }
}

#[must_use]
/// Produces a new document with `value` stored at `path`.
///
/// Missing sections, and sections that hold something other than a record, become empty
/// records before the write, so the write itself never fails.
pub fn write(doc: &Document, path: &FieldPath, value: Value) -> Document {
    let mut fields = doc.fields().clone();
    let target = match path {
        FieldPath::Scalar { .. } => &mut fields,
        FieldPath::Section { section, .. } => record_entry(&mut fields, section),
        FieldPath::Nested {
            section, nested, ..
        } => record_entry(record_entry(&mut fields, section), nested),
    };
    target.insert(path.field().to_string(), value);
    Document::from_fields(fields)
}

#[cfg(test)]
#[path = "tests/path.rs"]
mod tests;
