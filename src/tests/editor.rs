use super::{EditorError, FormEditor, ImageSlot, Phase, UploadError};
use crate::backend::memory::{MemoryImageStore, MemoryPersistence, PersistenceCall};
use crate::backend::BackendError;
use crate::document::{Document, Value};
use crate::list_edit::{Entry, ListAction};
use crate::path::{read, read_list, read_text, FieldPath};
use crate::schema::Schema;
use crate::submit::{Blocked, SubmitMode};
use std::path::Path;
use std::sync::Arc;

fn project_editor() -> (FormEditor, Arc<MemoryImageStore>) {
    let images = Arc::new(MemoryImageStore::new());
    let editor = FormEditor::new(Schema::project(), images.clone());
    (editor, images)
}

fn screenshots() -> FieldPath {
    FieldPath::scalar("screenshots")
}

fn with_screenshots(urls: &[&str]) -> Document {
    let shots = urls
        .iter()
        .map(|url| {
            Value::Record(
                [
                    ("image".to_string(), Value::from(*url)),
                    ("description".to_string(), Value::from("shot")),
                ]
                .into_iter()
                .collect(),
            )
        })
        .collect();
    let mut doc = Schema::project().template().with_id("p1");
    doc.insert("screenshots", Value::List(shots));
    doc
}

#[test]
fn test_closed_editor_ignores_edits() {
    let (mut editor, _) = project_editor();
    assert_eq!(editor.phase(), Phase::Closed);
    assert!(!editor.set_text(&FieldPath::scalar("title"), "Shop"));
    assert!(!editor.edit_list(&screenshots(), ListAction::Add, None, Entry::Blank));
    assert_eq!(editor.try_submit(), Err(Blocked::NotEditing));
}

#[test]
fn test_open_without_record_uses_template() {
    let (mut editor, _) = project_editor();
    editor.open(None);
    assert_eq!(editor.phase(), Phase::Editing);
    assert_eq!(editor.document(), &Schema::project().template());
    assert_eq!(editor.mode(), SubmitMode::Create);
}

#[test]
fn test_open_normalises_sparse_record() {
    let (mut editor, _) = project_editor();
    let sparse = Document::from_json(r#"{ "id": "p1", "title": "Shop" }"#).unwrap();
    editor.open(Some(&sparse));

    assert_eq!(editor.document().text("title"), "Shop");
    assert_eq!(
        read(
            editor.document(),
            &FieldPath::nested("contribution", "role", "details")
        ),
        Some(&Value::empty_list())
    );
    assert_eq!(
        editor.mode(),
        SubmitMode::Update {
            id: "p1".to_string()
        }
    );
}

#[test]
fn test_blank_add_uses_list_default() {
    let (mut editor, _) = project_editor();
    editor.open(None);
    let skills = FieldPath::section("techStack", "fieldSkill");
    let auth = FieldPath::section("apiDesign", "auth");

    assert!(editor.edit_list(&skills, ListAction::Add, None, Entry::Blank));
    assert!(editor.edit_list(&auth, ListAction::Add, None, Entry::Blank));

    assert_eq!(read_list(editor.document(), &skills), &[Value::from("")]);
    let entry = &read_list(editor.document(), &auth)[0];
    assert_eq!(entry.field_text("method"), Some("GET"));
    assert_eq!(entry.field_text("endpoint"), Some(""));
}

#[test]
fn test_subscribers_see_one_notification_per_edit() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let (mut editor, _) = project_editor();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    editor.subscribe(move |doc| sink.borrow_mut().push(doc.text("title").to_string()));

    editor.open(None);
    editor.set_text(&FieldPath::scalar("title"), "Shop");
    editor.set_text(&FieldPath::scalar("title"), "Shop");

    assert_eq!(*seen.borrow(), vec![String::new(), "Shop".to_string()]);
}

#[test]
fn test_submit_blocked_while_upload_pending() {
    let (mut editor, _) = project_editor();
    let persistence = MemoryPersistence::new();
    editor.open(None);
    let ticket = editor
        .begin_upload(ImageSlot::Field(FieldPath::section("architecture", "image")))
        .unwrap();

    let refused = editor.submit(&persistence);

    assert!(matches!(
        refused,
        Err(EditorError::Blocked(Blocked::UploadPending))
    ));
    assert!(persistence.calls().is_empty());
    assert_eq!(editor.phase(), Phase::Editing);

    editor
        .finish_upload(ticket, Ok("memory://architecture/a.png".to_string()))
        .unwrap();
    assert!(editor.submit(&persistence).is_ok());
}

#[test]
fn test_update_keeps_identity_through_edit_cycle() {
    let (mut editor, _) = project_editor();
    let persistence = MemoryPersistence::new();
    persistence.insert("projects", "p1", Document::new());
    editor.open(Some(&Schema::project().template().with_id("p1")));

    editor.set_text(&FieldPath::scalar("title"), "Shop");
    editor.edit_list(
        &FieldPath::section("techStack", "db"),
        ListAction::Add,
        None,
        Entry::text("Postgres"),
    );
    let saved = editor.submit(&persistence).unwrap();

    assert_eq!(saved.id(), Some("p1"));
    assert_eq!(editor.phase(), Phase::Closed);
    assert_eq!(editor.confirmed(), Some(&saved));
    let calls = persistence.calls();
    let [PersistenceCall::Update(collection, id, payload)] = calls.as_slice() else {
        panic!("expected one update, got {calls:?}");
    };
    assert_eq!((collection.as_str(), id.as_str()), ("projects", "p1"));
    assert_eq!(payload.id(), None);
    assert_eq!(payload.text("title"), "Shop");
}

#[test]
fn test_create_assigns_key_from_storage() {
    let (mut editor, _) = project_editor();
    let persistence = MemoryPersistence::new();
    editor.open(None);
    editor.set_text(&FieldPath::scalar("title"), "New");

    let saved = editor.submit(&persistence).unwrap();

    assert_eq!(saved.id(), Some("doc-1"));
    assert!(matches!(
        persistence.calls().as_slice(),
        [PersistenceCall::Add(..)]
    ));
}

#[test]
fn test_failed_save_returns_to_editing_with_edits() {
    let (mut editor, _) = project_editor();
    let persistence = MemoryPersistence::new();
    persistence.fail_writes(true);
    editor.open(None);
    editor.set_text(&FieldPath::scalar("title"), "Draft");

    let failed = editor.submit(&persistence);

    assert!(matches!(failed, Err(EditorError::Backend(_))));
    assert_eq!(editor.phase(), Phase::Editing);
    assert_eq!(editor.document().text("title"), "Draft");
    assert_eq!(editor.confirmed(), None);
}

#[test]
fn test_finish_submit_without_begin_is_refused() {
    let (mut editor, _) = project_editor();
    editor.open(None);
    assert!(matches!(
        editor.finish_submit(Ok(Document::new())),
        Err(EditorError::Blocked(Blocked::NotEditing))
    ));
    assert_eq!(editor.phase(), Phase::Editing);
}

#[test]
fn test_removing_managed_screenshot_deletes_image_once() {
    let (mut editor, images) = project_editor();
    let managed = images.seed("screenshots", "c.png");
    editor.open(Some(&with_screenshots(&[
        "https://example.com/a.png",
        "",
        managed.as_str(),
    ])));

    assert!(editor.edit_list(&screenshots(), ListAction::Remove, Some(2), Entry::Blank));
    assert_eq!(editor.pending_cleanup(), [managed.clone()]);

    let report = editor.flush_cleanup();

    assert_eq!(images.deletes(), vec![managed.clone()]);
    assert_eq!(report.deleted, vec![managed]);
    assert_eq!(read_list(editor.document(), &screenshots()).len(), 2);
    assert!(editor.pending_cleanup().is_empty());
}

#[test]
fn test_removal_stands_when_image_delete_fails() {
    let (mut editor, images) = project_editor();
    let managed = images.seed("screenshots", "c.png");
    images.fail_deletes(true);
    editor.open(Some(&with_screenshots(&["", "", managed.as_str()])));

    editor.edit_list(&screenshots(), ListAction::Remove, Some(2), Entry::Blank);
    let report = editor.flush_cleanup();

    assert_eq!(images.deletes().len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(read_list(editor.document(), &screenshots()).len(), 2);
}

#[test]
fn test_removing_unmanaged_screenshot_queues_nothing() {
    let (mut editor, images) = project_editor();
    editor.open(Some(&with_screenshots(&["https://example.com/a.png"])));

    editor.edit_list(&screenshots(), ListAction::Remove, Some(0), Entry::Blank);
    editor.flush_cleanup();

    assert!(images.deletes().is_empty());
}

#[test]
fn test_upload_into_entry_replaces_and_queues_old_image() {
    let (mut editor, images) = project_editor();
    let old = images.seed("screenshots", "old.png");
    editor.open(Some(&with_screenshots(&[old.as_str()])));
    let slot = ImageSlot::Entry {
        list: screenshots(),
        index: 0,
    };

    let url = editor.upload_image(slot.clone(), Path::new("new.png")).unwrap();

    assert_eq!(url, "memory://screenshots/1_new.png");
    assert_eq!(editor.image_at(&slot), url);
    assert_eq!(editor.pending_cleanup(), [old]);
    assert!(!editor.upload_pending());
}

#[test]
fn test_upload_uses_declared_folder() {
    let (mut editor, images) = project_editor();
    editor.open(None);
    editor
        .upload_image(
            ImageSlot::Field(FieldPath::section("architecture", "image")),
            Path::new("diagram.png"),
        )
        .unwrap();
    assert_eq!(images.uploads()[0].1, "architecture");
}

#[test]
fn test_second_upload_into_busy_slot_refused() {
    let (mut editor, _) = project_editor();
    editor.open(None);
    let slot = ImageSlot::Field(FieldPath::section("architecture", "image"));

    let _ticket = editor.begin_upload(slot.clone()).unwrap();

    assert!(matches!(
        editor.begin_upload(slot.clone()),
        Err(UploadError::Busy(_))
    ));
    assert!(editor.is_uploading(&slot));
}

#[test]
fn test_failed_upload_frees_slot() {
    let (mut editor, images) = project_editor();
    images.fail_uploads(true);
    editor.open(None);
    let slot = ImageSlot::Field(FieldPath::section("architecture", "image"));

    let failed = editor.upload_image(slot.clone(), Path::new("a.png"));

    assert!(matches!(failed, Err(UploadError::Failed(_))));
    assert!(!editor.upload_pending());
    assert_eq!(editor.image_at(&slot), "");
}

#[test]
fn test_non_image_slots_refused() {
    let (mut editor, _) = project_editor();
    editor.open(Some(&with_screenshots(&[""])));

    for slot in [
        ImageSlot::Field(FieldPath::scalar("title")),
        ImageSlot::Entry {
            list: FieldPath::section("apiDesign", "auth"),
            index: 0,
        },
        ImageSlot::Entry {
            list: screenshots(),
            index: 5,
        },
    ] {
        assert!(matches!(
            editor.begin_upload(slot),
            Err(UploadError::NotAnImage(_))
        ));
    }
}

#[test]
fn test_upload_result_after_reopen_is_discarded() {
    let (mut editor, images) = project_editor();
    editor.open(None);
    let ticket = editor
        .begin_upload(ImageSlot::Field(FieldPath::section("architecture", "image")))
        .unwrap();
    editor.cancel();
    editor.open(None);

    let late = images.seed("architecture", "late.png");
    let outcome = editor.finish_upload(ticket, Ok(late.clone()));

    assert!(matches!(outcome, Err(UploadError::Stale)));
    assert_eq!(
        read_text(editor.document(), &FieldPath::section("architecture", "image")),
        ""
    );
    assert_eq!(editor.pending_cleanup(), [late]);
}

#[test]
fn test_removing_entry_shifts_pending_upload_slots() {
    let (mut editor, _) = project_editor();
    editor.open(Some(&with_screenshots(&["", "", ""])));
    let doomed = editor
        .begin_upload(ImageSlot::Entry {
            list: screenshots(),
            index: 0,
        })
        .unwrap();
    let survivor = editor
        .begin_upload(ImageSlot::Entry {
            list: screenshots(),
            index: 2,
        })
        .unwrap();

    editor.edit_list(&screenshots(), ListAction::Remove, Some(0), Entry::Blank);

    assert!(editor.is_uploading(&ImageSlot::Entry {
        list: screenshots(),
        index: 1,
    }));
    assert!(matches!(
        editor.finish_upload(doomed, Ok("memory://screenshots/x.png".to_string())),
        Err(UploadError::Stale)
    ));
    let url = editor
        .finish_upload(survivor, Ok("memory://screenshots/y.png".to_string()))
        .unwrap();
    assert_eq!(
        read_list(editor.document(), &screenshots())[1].field_text("image"),
        Some(url.as_str())
    );
}

#[test]
fn test_clear_image_empties_slot_and_queues_managed_url() {
    let (mut editor, images) = project_editor();
    let photo = images.seed("profile", "me.png");
    let mut profile_editor = FormEditor::new(Schema::profile(), images.clone());
    let mut record = Schema::profile().template();
    record.insert("profileImage", Value::from(photo.as_str()));
    profile_editor.open(Some(&record));
    let slot = ImageSlot::Field(FieldPath::scalar("profileImage"));

    assert!(profile_editor.clear_image(&slot));
    assert!(!profile_editor.clear_image(&slot));
    assert_eq!(profile_editor.image_at(&slot), "");
    assert_eq!(profile_editor.pending_cleanup(), [photo]);

    editor.open(None);
    assert!(!editor.clear_image(&ImageSlot::Field(FieldPath::scalar("title"))));
}

#[test]
fn test_cancel_discards_queued_cleanup() {
    let (mut editor, images) = project_editor();
    let managed = images.seed("screenshots", "a.png");
    editor.open(Some(&with_screenshots(&[managed.as_str()])));
    editor.edit_list(&screenshots(), ListAction::Remove, Some(0), Entry::Blank);

    editor.cancel();

    assert_eq!(editor.phase(), Phase::Closed);
    assert!(editor.pending_cleanup().is_empty());
    assert!(editor.flush_cleanup().deleted.is_empty());
    assert!(images.contains(&managed));
}

#[test]
fn test_backend_error_converts_into_upload_error() {
    let err: UploadError = BackendError::Rejected("nope".to_string()).into();
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_reopen_discards_previous_session_cleanup() {
    let (mut editor, images) = project_editor();
    let keep = images.seed("screenshots", "keep.png");
    let record = with_screenshots(&[keep.as_str()]);
    editor.open(Some(&record));
    editor.edit_list(&screenshots(), ListAction::Remove, Some(0), Entry::Blank);
    assert_eq!(editor.pending_cleanup(), [keep.clone()]);

    editor.open(Some(&record));
    let persistence = MemoryPersistence::new();
    persistence.insert("projects", "p1", record.clone());
    let saved = editor.submit(&persistence).unwrap();

    assert!(editor.pending_cleanup().is_empty());
    assert!(editor.flush_cleanup().deleted.is_empty());
    assert!(images.deletes().is_empty());
    assert_eq!(read_list(&saved, &screenshots()).len(), 1);
}

#[test]
fn test_url_restored_after_clear_is_kept() {
    let (mut editor, images) = project_editor();
    let diagram = images.seed("architecture", "arch.png");
    let path = FieldPath::section("architecture", "image");
    let mut record = Schema::project().template().with_id("p1");
    record.insert(
        "architecture",
        Value::Record(
            [("image".to_string(), Value::from(diagram.as_str()))]
                .into_iter()
                .collect(),
        ),
    );
    editor.open(Some(&record));

    assert!(editor.clear_image(&ImageSlot::Field(path.clone())));
    assert!(editor.set_text(&path, diagram.as_str()));
    let report = editor.flush_cleanup();

    assert!(report.deleted.is_empty());
    assert!(images.deletes().is_empty());
    assert!(images.contains(&diagram));
    assert!(editor.pending_cleanup().is_empty());
}

#[test]
fn test_url_restored_after_upload_over_it_is_kept() {
    let (mut editor, images) = project_editor();
    let old = images.seed("screenshots", "old.png");
    editor.open(Some(&with_screenshots(&[old.as_str()])));
    let slot = ImageSlot::Entry {
        list: screenshots(),
        index: 0,
    };

    let new = editor.upload_image(slot, Path::new("new.png")).unwrap();
    editor.edit_list(
        &screenshots(),
        ListAction::Update,
        Some(0),
        Entry::field("image", old.as_str()),
    );
    let report = editor.flush_cleanup();

    assert!(report.deleted.is_empty());
    assert!(images.contains(&old));
    assert!(images.contains(&new));
}
