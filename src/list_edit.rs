//! Item-by-item editing of list fields.
//!
//! Lists hold either text items (tech stack entries, key features) or small records (API
//! entries, screenshots). Every edit produces a new document: `Add` appends, `Update` replaces or
//! merges in place, `Remove` deletes one index and shifts the rest left. Edits that cannot apply,
//! such as a missing or out-of-range index, return the document unchanged.

use crate::document::{Document, Fields, Value};
use crate::path::{self, FieldPath};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Kind of list edit.
pub enum ListAction {
    /// Append a new item.
    Add,
    /// Change the item at an index.
    Update,
    /// Delete the item at an index.
    Remove,
}

impl FromStr for ListAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "remove" => Ok(Self::Remove),
            other => Err(format!("unknown list action: {other}")),
        }
    }
}

impl fmt::Display for ListAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Payload of a list edit.
pub enum Entry {
    /// A text item.
    Text(String),
    /// A whole record item.
    Record(Fields),
    /// One field of the record at the edited index.
    Field {
        /// Field name inside the record.
        name: String,
        /// New text of the field.
        value: String,
    },
    /// No payload; removals carry this, and editors resolve it to the list's default item.
    Blank,
}

impl Entry {
    /// A text payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// A single-field payload for record items.
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

fn replace_list(doc: &Document, list_path: &FieldPath, items: Vec<Value>) -> Document {
    path::write(doc, list_path, Value::List(items))
}

#[must_use]
/// Applies one list edit to the list at `list_path`, returning the resulting document.
///
/// A missing list reads as empty, so `Add` on a fresh section creates it. `Update` with a
/// [`Entry::Field`] merges that field into the record at `index` and leaves its other fields
/// alone; with text or a record it replaces the item. `index` is ignored by `Add` and required by
/// the other actions.
pub fn apply(
    doc: &Document,
    list_path: &FieldPath,
    action: ListAction,
    index: Option<usize>,
    entry: Entry,
) -> Document {
    let items = path::read_list(doc, list_path);

    match (action, index) {
        (ListAction::Add, _) => {
            let item = match entry {
                Entry::Text(text) => Value::Text(text),
                Entry::Record(fields) => Value::Record(fields),
                Entry::Field { .. } | Entry::Blank => {
                    debug!(path = %list_path, "add without an item ignored");
                    return doc.clone();
                }
            };
            let mut next = items.to_vec();
            next.push(item);
            replace_list(doc, list_path, next)
        }
        (ListAction::Update, Some(i)) if i < items.len() => {
            let replacement = match (entry, &items[i]) {
                (Entry::Text(text), _) => Value::Text(text),
                (Entry::Record(fields), _) => Value::Record(fields),
                (Entry::Field { name, value }, Value::Record(existing)) => {
                    let mut merged = existing.clone();
                    merged.insert(name, Value::Text(value));
                    Value::Record(merged)
                }
                (Entry::Field { .. } | Entry::Blank, _) => {
                    debug!(path = %list_path, index = i, "update payload does not fit item");
                    return doc.clone();
                }
            };
            let mut next = items.to_vec();
            next[i] = replacement;
            replace_list(doc, list_path, next)
        }
        (ListAction::Remove, Some(i)) if i < items.len() => {
            let next = items
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, item)| item.clone())
                .collect();
            replace_list(doc, list_path, next)
        }
        (action, index) => {
            debug!(path = %list_path, %action, ?index, len = items.len(), "list edit ignored");
            doc.clone()
        }
    }
}

#[must_use]
/// Like [`apply`], with the action given by name; unknown names leave the document unchanged.
pub fn apply_named(
    doc: &Document,
    list_path: &FieldPath,
    action: &str,
    index: Option<usize>,
    entry: Entry,
) -> Document {
    match action.parse::<ListAction>() {
        Ok(action) => apply(doc, list_path, action, index, entry),
        Err(reason) => {
            debug!(path = %list_path, %reason, "list edit ignored");
            doc.clone()
        }
    }
}

#[cfg(test)]
#[path = "tests/list_edit.rs"]
mod tests;
