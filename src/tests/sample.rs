use super::{default_profile, sample_projects};
use crate::path::{read, read_list, FieldPath};
use crate::schema::Schema;

#[test]
fn test_sample_projects_parse_and_are_complete() {
    let projects = sample_projects();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id(), Some("sample-1"));
    for project in &projects {
        assert_eq!(&Schema::project().normalize(project), project);
        assert!(!read_list(project, &FieldPath::section("apiDesign", "data")).is_empty());
    }
}

#[test]
fn test_sample_projects_are_ordered() {
    let orders: Vec<_> = sample_projects()
        .iter()
        .filter_map(|p| p.get("order").and_then(|v| v.as_number()))
        .collect();
    assert_eq!(orders, vec![0, 1]);
}

#[test]
fn test_default_profile() {
    let profile = default_profile();
    assert_eq!(profile.id(), None);
    assert_eq!(profile.text("profileImage"), "");
    assert_eq!(
        read(&profile, &FieldPath::section("links", "email")).and_then(|v| v.as_text()),
        Some("email@example.com")
    );
    assert_eq!(read_list(&profile, &FieldPath::scalar("skills")).len(), 3);
}
