//! Flattening a document into the rows of the terminal form.
//!
//! Rows follow the schema's declaration order so the form reads the same for every record.
//! Sections become headings, lists expand into one row per item followed by an "add" row, and
//! each record item expands into one row per field of its shape.

use crate::document::{Document, Value};
use crate::editor::ImageSlot;
use crate::path::{self, FieldPath};
use crate::schema::{FieldSpec, Kind, Schema};

#[derive(Clone, Debug, PartialEq, Eq)]
/// What a row stands for and where edits to it go.
pub enum Target {
    /// A section heading; not editable.
    Heading,
    /// A text or number field.
    Field(FieldPath),
    /// An image URL.
    Image(ImageSlot),
    /// One item of a text list.
    Item {
        /// Path of the list.
        list: FieldPath,
        /// Index of the item.
        index: usize,
    },
    /// One non-image field of a record list item.
    RecordField {
        /// Path of the list.
        list: FieldPath,
        /// Index of the record.
        index: usize,
        /// Field within the record.
        field: &'static str,
    },
    /// Placeholder for appending to a list.
    Add(FieldPath),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One line of the form.
pub struct Row {
    /// Indentation level.
    pub depth: usize,
    /// Caption.
    pub label: String,
    /// Current value as text.
    pub value: String,
    /// Edit target.
    pub target: Target,
}

impl Row {
    #[must_use]
    /// The list this row belongs to and the item index, if any.
    pub fn list(&self) -> Option<(&FieldPath, Option<usize>)> {
        match &self.target {
            Target::Item { list, index } | Target::RecordField { list, index, .. } => {
                Some((list, Some(*index)))
            }
            Target::Image(ImageSlot::Entry { list, index }) => Some((list, Some(*index))),
            Target::Add(list) => Some((list, None)),
            Target::Heading | Target::Field(_) | Target::Image(ImageSlot::Field(_)) => None,
        }
    }

    #[must_use]
    /// Whether the row's value can be typed in.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.target,
            Target::Field(_) | Target::Image(_) | Target::Item { .. } | Target::RecordField { .. }
        )
    }
}

fn row(depth: usize, label: impl Into<String>, value: impl Into<String>, target: Target) -> Row {
    Row {
        depth,
        label: label.into(),
        value: value.into(),
        target,
    }
}

fn push_field(rows: &mut Vec<Row>, doc: &Document, depth: usize, at: FieldPath, spec: &FieldSpec) {
    let value = path::read(doc, &at);
    match spec.kind {
        Kind::Text => rows.push(row(
            depth,
            spec.label,
            value.and_then(Value::as_text).unwrap_or_default(),
            Target::Field(at),
        )),
        Kind::Number => rows.push(row(
            depth,
            spec.label,
            value
                .and_then(Value::as_number)
                .unwrap_or_default()
                .to_string(),
            Target::Field(at),
        )),
        Kind::Image(_) => rows.push(row(
            depth,
            spec.label,
            value.and_then(Value::as_text).unwrap_or_default(),
            Target::Image(ImageSlot::Field(at)),
        )),
        Kind::Strings => {
            rows.push(row(depth, spec.label, "", Target::Heading));
            for (index, item) in path::read_list(doc, &at).iter().enumerate() {
                rows.push(row(
                    depth + 1,
                    format!("{}.", index + 1),
                    item.as_text().unwrap_or_default(),
                    Target::Item {
                        list: at.clone(),
                        index,
                    },
                ));
            }
            rows.push(row(depth + 1, "+", format!("add {}", spec.label), Target::Add(at)));
        }
        Kind::Records(shape) => {
            rows.push(row(depth, spec.label, "", Target::Heading));
            for (index, item) in path::read_list(doc, &at).iter().enumerate() {
                for &(field, _) in shape.fields {
                    let label = format!("{} {} {field}", shape.name, index + 1);
                    let text = item.field_text(field).unwrap_or_default();
                    let target = if shape.image_field == Some(field) {
                        Target::Image(ImageSlot::Entry {
                            list: at.clone(),
                            index,
                        })
                    } else {
                        Target::RecordField {
                            list: at.clone(),
                            index,
                            field,
                        }
                    };
                    rows.push(row(depth + 1, label, text, target));
                }
            }
            rows.push(row(depth + 1, "+", format!("add {}", shape.name), Target::Add(at)));
        }
        Kind::Section(specs) => {
            rows.push(row(depth, spec.label, "", Target::Heading));
            for inner in specs {
                let child = match &at {
                    FieldPath::Scalar { field } => FieldPath::section(field.as_str(), inner.name),
                    FieldPath::Section { section, field } => {
                        FieldPath::nested(section.as_str(), field.as_str(), inner.name)
                    }
                    FieldPath::Nested { .. } => continue,
                };
                push_field(rows, doc, depth + 1, child, inner);
            }
        }
    }
}

#[must_use]
/// Every row of the form for `doc`, in schema order.
pub fn rows(schema: &Schema, doc: &Document) -> Vec<Row> {
    let mut rows = Vec::new();
    for spec in schema.fields {
        push_field(&mut rows, doc, 0, FieldPath::scalar(spec.name), spec);
    }
    rows
}

#[cfg(test)]
#[path = "tests/outline.rs"]
mod tests;
