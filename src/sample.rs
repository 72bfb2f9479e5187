//! Content shown before the admin has saved anything.

use crate::document::{Document, Fields, Value};
use crate::schema::Schema;
use tracing::error;

const PROJECTS_JSON: &str = include_str!("sample/projects.json");

#[must_use]
/// Profile written to storage the first time the profile is loaded.
pub fn default_profile() -> Document {
    let links: Fields = [
        ("github", "#"),
        ("blog", "#"),
        ("email", "email@example.com"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), Value::from(value)))
    .collect();

    let mut profile = Schema::profile().template();
    profile.insert("name", Value::from("Gildong Hong"));
    profile.insert("title", Value::from("Frontend Developer"));
    profile.insert(
        "bio",
        Value::from("Frontend developer with plenty of shipped projects."),
    );
    profile.insert("skills", Value::from(vec!["React", "Flutter", "JavaScript"]));
    profile.insert("links", Value::Record(links));
    profile
}

#[must_use]
/// Demonstration projects listed while storage holds none.
pub fn sample_projects() -> Vec<Document> {
    match serde_json::from_str::<Vec<Document>>(PROJECTS_JSON) {
        Ok(projects) => projects
            .iter()
            .map(|project| Schema::project().normalize(project))
            .collect(),
        Err(e) => {
            error!(error = %e, "bundled sample projects are malformed");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "tests/sample.rs"]
mod tests;
