use super::{Portfolio, PortfolioError, PROFILE_ID};
use crate::backend::memory::{MemoryImageStore, MemoryPersistence, PersistenceCall, StaticAuth};
use crate::document::{Document, Value};
use crate::editor::{EditorError, ImageSlot, Phase};
use crate::list_edit::{Entry, ListAction};
use crate::path::{read_list, read_text, FieldPath};
use crate::schema::Schema;
use crate::submit::Blocked;
use std::path::Path;
use std::sync::Arc;

struct Fixture {
    persistence: Arc<MemoryPersistence>,
    images: Arc<MemoryImageStore>,
    portfolio: Portfolio,
}

fn fixture(auth: StaticAuth) -> Fixture {
    let persistence = Arc::new(MemoryPersistence::new());
    let images = Arc::new(MemoryImageStore::new());
    let portfolio = Portfolio::new(persistence.clone(), images.clone(), Arc::new(auth));
    Fixture {
        persistence,
        images,
        portfolio,
    }
}

fn admin() -> Fixture {
    fixture(StaticAuth::admin())
}

fn project(title: &str, order: i64) -> Document {
    let mut doc = Document::new();
    doc.insert("title", Value::from(title));
    doc.insert("order", Value::Number(order));
    doc
}

#[test]
fn test_empty_storage_lists_samples() {
    let f = admin();
    let projects = f.portfolio.load_projects();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id(), Some("sample-1"));
}

#[test]
fn test_failing_storage_lists_samples() {
    use crate::backend::{BackendError, Persistence, StoredDocument};

    struct Offline;

    fn offline<T>() -> Result<T, BackendError> {
        Err(BackendError::Rejected("offline".to_string()))
    }

    impl Persistence for Offline {
        fn list(&self, _: &str) -> Result<Vec<StoredDocument>, BackendError> {
            offline()
        }
        fn get(&self, _: &str, _: &str) -> Result<Option<Document>, BackendError> {
            offline()
        }
        fn add(&self, _: &str, _: &Document) -> Result<String, BackendError> {
            offline()
        }
        fn put(&self, _: &str, _: &str, _: &Document) -> Result<(), BackendError> {
            offline()
        }
        fn update(&self, _: &str, _: &str, _: &Document) -> Result<(), BackendError> {
            offline()
        }
        fn delete(&self, _: &str, _: &str) -> Result<(), BackendError> {
            offline()
        }
    }

    let portfolio = Portfolio::new(
        Arc::new(Offline),
        Arc::new(MemoryImageStore::new()),
        Arc::new(StaticAuth::admin()),
    );
    assert_eq!(portfolio.load_projects().len(), 2);
    assert_eq!(portfolio.load_profile().text("title"), "Frontend Developer");
    assert_eq!(portfolio.load_profile().id(), Some(PROFILE_ID));
}

#[test]
fn test_stored_projects_sorted_by_order_and_complete() {
    let f = admin();
    f.persistence.insert("projects", "b", project("Second", 1));
    f.persistence.insert("projects", "a", project("Third", 2));
    f.persistence.insert("projects", "c", project("First", 0));

    let projects = f.portfolio.load_projects();

    let titles: Vec<_> = projects.iter().map(|p| p.text("title")).collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
    assert_eq!(projects[0].id(), Some("c"));
    assert_eq!(projects[0], Schema::project().normalize(&projects[0]));
}

#[test]
fn test_new_project_goes_last() {
    let f = admin();
    f.persistence.insert("projects", "a", project("One", 0));
    f.persistence.insert("projects", "b", project("Two", 1));
    let mut editor = f.portfolio.project_editor();
    editor.open(None);
    editor.set_text(&FieldPath::scalar("title"), "Three");

    let saved = f.portfolio.save_project(&mut editor).unwrap();

    assert_eq!(saved.get("order"), Some(&Value::Number(2)));
    assert_eq!(editor.phase(), Phase::Closed);
    let titles: Vec<_> = f
        .portfolio
        .load_projects()
        .iter()
        .map(|p| p.text("title").to_string())
        .collect();
    assert_eq!(titles, ["One", "Two", "Three"]);
}

#[test]
fn test_save_requires_admin_and_keeps_form_open() {
    let f = fixture(StaticAuth::new("admin@example.com", "pw"));
    let mut editor = f.portfolio.project_editor();
    editor.open(None);

    assert!(matches!(
        f.portfolio.save_project(&mut editor),
        Err(PortfolioError::Unauthorized)
    ));
    assert_eq!(editor.phase(), Phase::Editing);
    assert!(f.persistence.calls().is_empty());

    assert!(f.portfolio.login("admin@example.com", "pw"));
    assert!(f.portfolio.save_project(&mut editor).is_ok());
    assert!(f.portfolio.logout());
    assert!(!f.portfolio.is_admin());
}

#[test]
fn test_save_refused_while_uploading() {
    let f = admin();
    let mut editor = f.portfolio.project_editor();
    editor.open(None);
    let _ticket = editor
        .begin_upload(ImageSlot::Field(FieldPath::section("architecture", "image")))
        .unwrap();

    assert!(matches!(
        f.portfolio.save_project(&mut editor),
        Err(PortfolioError::Editor(EditorError::Blocked(
            Blocked::UploadPending
        )))
    ));
    assert!(f.persistence.calls().is_empty());
}

#[test]
fn test_update_flushes_removed_images_after_save() {
    let f = admin();
    let shot = f.images.seed("screenshots", "a.png");
    let mut stored = project("Shop", 0);
    stored.insert(
        "screenshots",
        Value::List(vec![Value::Record(
            [("image".to_string(), Value::from(shot.as_str()))]
                .into_iter()
                .collect(),
        )]),
    );
    f.persistence.insert("projects", "p1", stored);
    let mut editor = f.portfolio.project_editor();
    editor.open(f.portfolio.load_projects().first());

    editor.edit_list(
        &FieldPath::scalar("screenshots"),
        ListAction::Remove,
        Some(0),
        Entry::Blank,
    );
    assert!(f.images.contains(&shot));
    let saved = f.portfolio.save_project(&mut editor).unwrap();

    assert_eq!(saved.id(), Some("p1"));
    assert!(!f.images.contains(&shot));
    assert!(read_list(&saved, &FieldPath::scalar("screenshots")).is_empty());
}

#[test]
fn test_delete_project_removes_managed_images_then_document() {
    let f = admin();
    let shot = f.images.seed("screenshots", "a.png");
    let diagram = f.images.seed("architecture", "d.png");
    let mut stored = project("Shop", 0);
    stored.insert(
        "screenshots",
        Value::List(vec![Value::Record(
            [("image".to_string(), Value::from(shot.as_str()))]
                .into_iter()
                .collect(),
        )]),
    );
    stored.insert(
        "architecture",
        Value::Record(
            [
                ("image".to_string(), Value::from(diagram.as_str())),
                ("description".to_string(), Value::from("https://cdn/x.png")),
            ]
            .into_iter()
            .collect(),
        ),
    );
    f.persistence.insert("projects", "p1", stored);
    f.images.fail_deletes(true);

    f.portfolio.delete_project("p1").unwrap();

    assert_eq!(f.images.deletes(), vec![shot, diagram]);
    assert!(matches!(
        f.persistence.write_calls().as_slice(),
        [PersistenceCall::Delete(..)]
    ));
    assert!(matches!(
        f.portfolio.delete_project("p1"),
        Err(PortfolioError::NotFound(_))
    ));
}

#[test]
fn test_delete_requires_admin() {
    let f = fixture(StaticAuth::new("a", "b"));
    f.persistence.insert("projects", "p1", project("Shop", 0));
    assert!(matches!(
        f.portfolio.delete_project("p1"),
        Err(PortfolioError::Unauthorized)
    ));
    assert!(f.persistence.calls().is_empty());
}

#[test]
fn test_first_profile_load_stores_default() {
    let f = admin();

    let profile = f.portfolio.load_profile();

    assert_eq!(profile.id(), Some(PROFILE_ID));
    assert_eq!(profile.text("title"), "Frontend Developer");
    let calls = f.persistence.write_calls();
    let [PersistenceCall::Put(collection, id, payload)] = calls.as_slice() else {
        panic!("expected one put, got {calls:?}");
    };
    assert_eq!((collection.as_str(), id.as_str()), ("profile", PROFILE_ID));
    assert_eq!(payload.get("profileImage"), None);
}

#[test]
fn test_stored_profile_fills_gaps_from_default() {
    let f = admin();
    let mut stored = Document::new();
    stored.insert("name", Value::from("Ada"));
    f.persistence.insert("profile", PROFILE_ID, stored);

    let profile = f.portfolio.load_profile();

    assert_eq!(profile.text("name"), "Ada");
    assert_eq!(profile.text("title"), "Frontend Developer");
    assert!(f.persistence.write_calls().is_empty());
}

#[test]
fn test_profile_image_swap_deletes_previous_once() {
    let f = admin();
    let old = f.images.seed("profile", "old.png");
    let mut stored = Document::new();
    stored.insert("profileImage", Value::from(old.as_str()));
    f.persistence.insert("profile", PROFILE_ID, stored);

    let mut editor = f.portfolio.profile_editor();
    editor.open(Some(&f.portfolio.load_profile()));
    let slot = ImageSlot::Field(FieldPath::scalar("profileImage"));
    let new = editor.upload_image(slot, Path::new("me.png")).unwrap();

    let saved = f.portfolio.save_profile(&mut editor).unwrap();

    assert_eq!(saved.text("profileImage"), new);
    assert_eq!(f.images.deletes(), vec![old]);
    assert!(f.images.contains(&new));
}

#[test]
fn test_profile_image_typed_over_deletes_previous() {
    let f = admin();
    let old = f.images.seed("profile", "old.png");
    let mut stored = Document::new();
    stored.insert("profileImage", Value::from(old.as_str()));
    f.persistence.insert("profile", PROFILE_ID, stored);
    f.images.fail_deletes(true);

    let mut editor = f.portfolio.profile_editor();
    editor.open(Some(&f.portfolio.load_profile()));
    editor.set_text(&FieldPath::scalar("profileImage"), "https://cdn/me.png");
    let saved = f.portfolio.save_profile(&mut editor).unwrap();

    assert_eq!(saved.text("profileImage"), "https://cdn/me.png");
    assert_eq!(f.images.deletes(), vec![old]);
}

#[test]
fn test_stored_links_keep_defaults_for_missing_entries() {
    let f = admin();
    let mut stored = Document::new();
    stored.insert(
        "links",
        Value::Record(
            [("blog".to_string(), Value::from("https://blog.example.com"))]
                .into_iter()
                .collect(),
        ),
    );
    f.persistence.insert("profile", PROFILE_ID, stored);

    let profile = f.portfolio.load_profile();

    let github = FieldPath::section("links", "github");
    let blog = FieldPath::section("links", "blog");
    assert_eq!(read_text(&profile, &blog), "https://blog.example.com");
    assert_eq!(read_text(&profile, &github), "#");
    assert_eq!(
        read_text(&profile, &FieldPath::section("links", "email")),
        "email@example.com"
    );
}
