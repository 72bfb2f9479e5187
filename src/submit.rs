//! The gate a finished form passes through before it reaches storage.
//!
//! Submission is refused outright while an image upload is still running, since the document
//! would otherwise reference an image that does not exist yet. Whether the submission creates a
//! new record or updates an existing one is decided only by the identity key of the record the
//! form was opened with, and that key is carried over to the outgoing document.

use crate::document::{Document, Fields, Value, IDENTITY_FIELD};
use crate::schema::Schema;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Whether a submission creates or updates a stored record.
pub enum SubmitMode {
    /// The form was opened without an identity key.
    Create,
    /// The form was opened on the stored record with this key.
    Update {
        /// Identity key of the stored record.
        id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A document cleared for storage.
pub struct Submission {
    /// Create or update.
    pub mode: SubmitMode,
    /// Fully-defaulted document, carrying the identity key in update mode.
    pub document: Document,
}

impl Submission {
    #[must_use]
    /// Payload to hand to storage; see [`persistable`].
    pub fn payload(&self) -> Document {
        persistable(&self.document)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Reasons a submission is refused without contacting storage.
pub enum Blocked {
    /// An image upload has not finished yet.
    #[error("an image upload is still in progress")]
    UploadPending,
    /// The form is not open for editing.
    #[error("the form is not open for editing")]
    NotEditing,
}

/// Checks and finalises a form document for submission.
///
/// `original` is the record the form was opened with; its identity key alone selects
/// [`SubmitMode`]. The outgoing document is `edited` normalised against `schema`, with the
/// original key merged back even if the edits dropped it.
///
/// # Errors
///
/// Returns [`Blocked::UploadPending`] when `upload_pending` is set.
pub fn try_submit(
    schema: &Schema,
    original: &Document,
    edited: &Document,
    upload_pending: bool,
) -> Result<Submission, Blocked> {
    if upload_pending {
        return Err(Blocked::UploadPending);
    }

    let mut document = schema.normalize(edited);
    let mode = match original.id() {
        Some(id) => {
            document = document.with_id(id);
            SubmitMode::Update { id: id.to_string() }
        }
        None => {
            document.remove(IDENTITY_FIELD);
            SubmitMode::Create
        }
    };

    Ok(Submission { mode, document })
}

fn clean_value(value: &Value) -> Option<Value> {
    match value {
        Value::Text(text) if text.is_empty() => None,
        Value::Text(_) | Value::Number(_) => Some(value.clone()),
        Value::List(items) => Some(Value::List(items.iter().filter_map(clean_value).collect())),
        Value::Record(fields) => Some(Value::Record(clean_fields(fields))),
    }
}

fn clean_fields(fields: &Fields) -> Fields {
    fields
        .iter()
        .filter_map(|(key, value)| clean_value(value).map(|v| (key.clone(), v)))
        .collect()
}

#[must_use]
/// Storage form of a document.
///
/// Empty text leaves are dropped (storage rejects them) while sections and lists stay, even
/// when empty. The identity key is dropped too; storage keys the record by it instead.
pub fn persistable(doc: &Document) -> Document {
    let mut fields = clean_fields(doc.fields());
    fields.remove(IDENTITY_FIELD);
    Document::from_fields(fields)
}

#[cfg(test)]
#[path = "tests/submit.rs"]
mod tests;
