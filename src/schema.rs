//! Declared shapes of the documents the editor works on.
//!
//! A schema lists every field a profile or project must carry, so a document can be built fully
//! defaulted when an editor opens and normalised again before it leaves for storage. Storage
//! rejects absent values, so nothing declared here is ever left out of a submitted document.

use crate::document::{Document, Fields, Value};
use crate::path::{self, FieldPath};

/// HTTP methods offered for API entries, in display order.
pub const API_METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

#[derive(Debug, PartialEq, Eq)]
/// Fixed shape of the small records stored in record lists.
pub struct RecordShape {
    /// Human readable name of one entry.
    pub name: &'static str,
    /// Field names with the value a freshly added entry starts with.
    pub fields: &'static [(&'static str, &'static str)],
    /// Field holding an uploaded image URL, if entries carry one.
    pub image_field: Option<&'static str>,
    /// Storage folder for images uploaded into entries.
    pub folder: &'static str,
}

/// An endpoint of the API design section.
pub const API_ENTRY: RecordShape = RecordShape {
    name: "API",
    fields: &[("method", "GET"), ("endpoint", ""), ("description", "")],
    image_field: None,
    folder: "",
};

/// A captioned screenshot.
pub const SCREENSHOT: RecordShape = RecordShape {
    name: "Screenshot",
    fields: &[("image", ""), ("description", "")],
    image_field: Some("image"),
    folder: "screenshots",
};

impl RecordShape {
    #[must_use]
    /// A new entry with every field at its documented default.
    pub fn blank(&self) -> Fields {
        self.fields
            .iter()
            .map(|(name, default)| ((*name).to_string(), Value::from(*default)))
            .collect()
    }

    #[must_use]
    /// Fills fields missing from an existing entry, replacing non-text values with defaults.
    pub fn complete(&self, mut entry: Fields) -> Fields {
        for (name, default) in self.fields {
            let keep = matches!(entry.get(*name), Some(Value::Text(_)));
            if !keep {
                entry.insert((*name).to_string(), Value::from(*default));
            }
        }
        entry
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What a declared field holds.
pub enum Kind {
    /// Free text.
    Text,
    /// An image URL, uploaded into the named storage folder.
    Image(&'static str),
    /// An integer.
    Number,
    /// A list of text items.
    Strings,
    /// A list of fixed-shape records.
    Records(&'static RecordShape),
    /// A named sub-object with its own declared fields.
    Section(&'static [FieldSpec]),
}

impl Kind {
    #[must_use]
    /// Value a field of this kind holds before anything is entered.
    pub fn default_value(self) -> Value {
        match self {
            Self::Text | Self::Image(_) => Value::empty_text(),
            Self::Number => Value::Number(0),
            Self::Strings | Self::Records(_) => Value::empty_list(),
            Self::Section(specs) => Value::Record(template_fields(specs)),
        }
    }

    #[must_use]
    /// Whether the field is an ordered list editable item by item.
    pub fn is_list(self) -> bool {
        matches!(self, Self::Strings | Self::Records(_))
    }
}

#[derive(Debug, PartialEq, Eq)]
/// One declared field.
pub struct FieldSpec {
    /// Key inside the document.
    pub name: &'static str,
    /// Label shown by forms.
    pub label: &'static str,
    /// What the field holds.
    pub kind: Kind,
}

const fn spec(name: &'static str, label: &'static str, kind: Kind) -> FieldSpec {
    FieldSpec { name, label, kind }
}

const TECH_STACK: &[FieldSpec] = &[
    spec("fieldSkill", "Field Skill", Kind::Strings),
    spec("server", "Server/Deployment", Kind::Strings),
    spec("os", "OS", Kind::Strings),
    spec("collaboration", "Collaboration", Kind::Strings),
    spec("tools", "Tools", Kind::Strings),
    spec("db", "DB", Kind::Strings),
];

const ROLE: &[FieldSpec] = &[
    spec("summary", "Role summary", Kind::Text),
    spec("details", "Role details", Kind::Strings),
];

const CONTRIBUTION: &[FieldSpec] = &[
    spec("intro", "Introduction", Kind::Text),
    spec("period", "Period", Kind::Text),
    spec("members", "Members", Kind::Text),
    spec("keyFeatures", "Key features", Kind::Strings),
    spec("teamAchievement", "Team achievement", Kind::Text),
    spec("role", "Role", Kind::Section(ROLE)),
];

const API_DESIGN: &[FieldSpec] = &[
    spec("auth", "Auth APIs", Kind::Records(&API_ENTRY)),
    spec("data", "Data APIs", Kind::Records(&API_ENTRY)),
];

const ARCHITECTURE: &[FieldSpec] = &[
    spec("image", "Diagram", Kind::Image("architecture")),
    spec("description", "Description", Kind::Text),
];

const PROJECT_FIELDS: &[FieldSpec] = &[
    spec("title", "Title", Kind::Text),
    spec("description", "Description", Kind::Text),
    spec("techStack", "Tech stack", Kind::Section(TECH_STACK)),
    spec("contribution", "Contribution", Kind::Section(CONTRIBUTION)),
    spec("apiDesign", "API design", Kind::Section(API_DESIGN)),
    spec("screenshots", "Screenshots", Kind::Records(&SCREENSHOT)),
    spec("architecture", "Architecture", Kind::Section(ARCHITECTURE)),
    spec("order", "Order", Kind::Number),
];

const LINKS: &[FieldSpec] = &[
    spec("github", "GitHub", Kind::Text),
    spec("blog", "Blog", Kind::Text),
    spec("email", "Email", Kind::Text),
];

const PROFILE_FIELDS: &[FieldSpec] = &[
    spec("name", "Name", Kind::Text),
    spec("title", "Title", Kind::Text),
    spec("bio", "Bio", Kind::Text),
    spec("profileImage", "Profile image", Kind::Image("profile")),
    spec("skills", "Skills", Kind::Strings),
    spec("links", "Links", Kind::Section(LINKS)),
];

#[derive(Debug, PartialEq, Eq)]
/// Declared fields of one kind of document plus where it is stored.
pub struct Schema {
    /// Storage collection holding documents of this kind.
    pub collection: &'static str,
    /// Human readable name of one document.
    pub title: &'static str,
    /// Top-level declared fields.
    pub fields: &'static [FieldSpec],
}

/// Portfolio projects.
pub static PROJECT: Schema = Schema {
    collection: "projects",
    title: "Project",
    fields: PROJECT_FIELDS,
};

/// The owner's profile.
pub static PROFILE: Schema = Schema {
    collection: "profile",
    title: "Profile",
    fields: PROFILE_FIELDS,
};

fn template_fields(specs: &[FieldSpec]) -> Fields {
    specs
        .iter()
        .map(|spec| (spec.name.to_string(), spec.kind.default_value()))
        .collect()
}

fn normalize_fields(specs: &[FieldSpec], fields: &mut Fields) {
    for spec in specs {
        let current = fields.remove(spec.name);
        fields.insert(spec.name.to_string(), normalize_value(spec.kind, current));
    }
}

fn normalize_value(kind: Kind, current: Option<Value>) -> Value {
    match (kind, current) {
        (Kind::Text | Kind::Image(_), Some(Value::Text(text))) => Value::Text(text),
        (Kind::Number, Some(Value::Number(n))) => Value::Number(n),
        (Kind::Strings, Some(Value::List(items))) => Value::List(
            items
                .into_iter()
                .filter(|item| matches!(item, Value::Text(_)))
                .collect(),
        ),
        (Kind::Records(shape), Some(Value::List(items))) => Value::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Record(entry) => Some(Value::Record(shape.complete(entry))),
                    _ => None,
                })
                .collect(),
        ),
        (Kind::Section(specs), Some(Value::Record(mut inner))) => {
            normalize_fields(specs, &mut inner);
            Value::Record(inner)
        }
        (kind, _) => kind.default_value(),
    }
}

fn find(specs: &'static [FieldSpec], name: &str) -> Option<&'static FieldSpec> {
    specs.iter().find(|spec| spec.name == name)
}

impl Schema {
    #[must_use]
    /// Schema of portfolio projects.
    pub fn project() -> &'static Self {
        &PROJECT
    }

    #[must_use]
    /// Schema of the profile.
    pub fn profile() -> &'static Self {
        &PROFILE
    }

    #[must_use]
    /// The fully-defaulted empty document used when creating a new record.
    pub fn template(&self) -> Document {
        Document::from_fields(template_fields(self.fields))
    }

    #[must_use]
    /// Copy of `doc` with every declared field present and of the declared kind.
    ///
    /// Undeclared fields, such as the identity key, pass through untouched.
    pub fn normalize(&self, doc: &Document) -> Document {
        let mut fields = doc.fields().clone();
        normalize_fields(self.fields, &mut fields);
        Document::from_fields(fields)
    }

    #[must_use]
    /// Declared field at a path, if the schema has one there.
    pub fn spec_at(&self, path: &FieldPath) -> Option<&'static FieldSpec> {
        let mut specs = self.fields;
        for parent in path.parents() {
            match find(specs, parent)?.kind {
                Kind::Section(inner) => specs = inner,
                _ => return None,
            }
        }
        find(specs, path.field())
    }

    #[must_use]
    /// Declared kind of the field at a path.
    pub fn kind_at(&self, path: &FieldPath) -> Option<Kind> {
        self.spec_at(path).map(|spec| spec.kind)
    }

    #[must_use]
    /// Every non-section field with its path, in declaration order.
    pub fn leaves(&self) -> Vec<(FieldPath, &'static FieldSpec)> {
        let mut out = Vec::new();
        for top in self.fields {
            let Kind::Section(section) = top.kind else {
                out.push((FieldPath::scalar(top.name), top));
                continue;
            };
            for inner in section {
                let Kind::Section(nested) = inner.kind else {
                    out.push((FieldPath::section(top.name, inner.name), inner));
                    continue;
                };
                for leaf in nested {
                    out.push((FieldPath::nested(top.name, inner.name, leaf.name), leaf));
                }
            }
        }
        out
    }

    #[must_use]
    /// Every non-empty image URL referenced by a document.
    pub fn image_urls(&self, doc: &Document) -> Vec<String> {
        let mut urls = Vec::new();
        for (field_path, spec) in self.leaves() {
            match spec.kind {
                Kind::Image(_) => {
                    let url = path::read_text(doc, &field_path);
                    if !url.is_empty() {
                        urls.push(url.to_string());
                    }
                }
                Kind::Records(RecordShape {
                    image_field: Some(image_field),
                    ..
                }) => {
                    urls.extend(
                        path::read_list(doc, &field_path)
                            .iter()
                            .filter_map(|entry| entry.field_text(image_field))
                            .filter(|url| !url.is_empty())
                            .map(str::to_string),
                    );
                }
                _ => {}
            }
        }
        urls
    }
}

#[cfg(test)]
#[path = "tests/schema.rs"]
mod tests;
