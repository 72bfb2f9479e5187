//! One open form: its document, its upload slots and its lifecycle.
//!
//! A [`FormEditor`] is `Closed` until opened on a stored record or a blank template, stays
//! `Editing` through any number of field and list edits, and moves to `Submitting` only when the
//! submit gate lets it. Image uploads are tracked per slot so a slot cannot be uploaded into twice
//! at once and so submission waits for every upload to land. Images dropped by an edit are not
//! deleted on the spot; their URLs wait in a cleanup queue until the caller flushes it.

use crate::backend::{BackendError, ImageStore, Persistence};
use crate::document::{Document, Value};
use crate::list_edit::{self, Entry, ListAction};
use crate::path::{self, FieldPath};
use crate::schema::{Kind, RecordShape, Schema};
use crate::store::{FormStore, SubscriptionId};
use crate::submit::{self, Blocked, Submission, SubmitMode};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Lifecycle of a form editor.
pub enum Phase {
    /// No document is loaded.
    Closed,
    /// The document accepts edits.
    Editing,
    /// The document has been handed to storage and awaits confirmation.
    Submitting,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A place in the document that holds an image URL.
pub enum ImageSlot {
    /// An image field such as the profile picture or the architecture diagram.
    Field(FieldPath),
    /// The image field of one record in a record list, such as a screenshot.
    Entry {
        /// Path of the record list.
        list: FieldPath,
        /// Index of the record.
        index: usize,
    },
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(path) => write!(f, "{path}"),
            Self::Entry { list, index } => write!(f, "{list}[{index}]"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
/// Claim on an image slot, handed out by [`FormEditor::begin_upload`].
pub struct UploadTicket {
    session: u64,
    id: u64,
    folder: &'static str,
}

impl UploadTicket {
    #[must_use]
    /// Storage folder the image belongs in.
    pub fn folder(&self) -> &'static str {
        self.folder
    }
}

#[derive(Debug, thiserror::Error)]
/// Reasons an image upload could not be started or applied.
pub enum UploadError {
    /// The editor is not open for editing.
    #[error("the form is not open for editing")]
    Closed,
    /// The slot does not hold an image.
    #[error("{0} is not an image field")]
    NotAnImage(ImageSlot),
    /// An upload into the slot is already running.
    #[error("an upload into {0} is already in progress")]
    Busy(ImageSlot),
    /// The form was closed, reopened or the entry removed while the upload ran.
    #[error("the upload finished after its form was closed or its entry removed")]
    Stale,
    /// The image store reported a failure.
    #[error("upload failed: {0}")]
    Failed(#[from] BackendError),
}

#[derive(Debug, thiserror::Error)]
/// Failure of a submit cycle.
pub enum EditorError {
    /// The submit gate refused the document.
    #[error(transparent)]
    Blocked(#[from] Blocked),
    /// Storage rejected the document; the form stays open.
    #[error("could not save: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Outcome of [`FormEditor::flush_cleanup`].
pub struct CleanupReport {
    /// URLs deleted from the image store.
    pub deleted: Vec<String>,
    /// URLs whose deletion failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Editor for one profile or project document.
pub struct FormEditor {
    schema: &'static Schema,
    images: Arc<dyn ImageStore>,
    store: FormStore,
    original: Document,
    phase: Phase,
    session: u64,
    next_ticket: u64,
    uploads: BTreeMap<u64, ImageSlot>,
    cleanup: Vec<String>,
    confirmed: Option<Document>,
}

impl FormEditor {
    #[must_use]
    /// A closed editor for documents of `schema`.
    pub fn new(schema: &'static Schema, images: Arc<dyn ImageStore>) -> Self {
        Self {
            schema,
            images,
            store: FormStore::default(),
            original: Document::new(),
            phase: Phase::Closed,
            session: 0,
            next_ticket: 0,
            uploads: BTreeMap::new(),
            cleanup: Vec::new(),
            confirmed: None,
        }
    }

    #[must_use]
    /// Schema the editor works against.
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    #[must_use]
    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    /// Whether edits are currently accepted.
    pub fn is_editing(&self) -> bool {
        self.phase == Phase::Editing
    }

    #[must_use]
    /// Current document snapshot.
    pub fn document(&self) -> &Document {
        self.store.document()
    }

    #[must_use]
    /// The record as it was when the form was opened.
    pub fn original(&self) -> &Document {
        &self.original
    }

    #[must_use]
    /// Whether the form creates a new record or updates the one it was opened on.
    pub fn mode(&self) -> SubmitMode {
        match self.original.id() {
            Some(id) => SubmitMode::Update { id: id.to_string() },
            None => SubmitMode::Create,
        }
    }

    #[must_use]
    /// Document storage confirmed at the end of the last successful submit.
    pub fn confirmed(&self) -> Option<&Document> {
        self.confirmed.as_ref()
    }

    /// Watches every change to the document.
    pub fn subscribe(&mut self, callback: impl FnMut(&Document) + 'static) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    /// Stops watching.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Opens the form on a stored record, or on a blank template when `record` is `None`.
    ///
    /// Any previous session is discarded, including uploads still running for it and images it
    /// queued for cleanup.
    pub fn open(&mut self, record: Option<&Document>) {
        let document = record.map_or_else(|| self.schema.template(), |r| self.schema.normalize(r));
        self.original = document.clone();
        self.session += 1;
        self.uploads.clear();
        if !self.cleanup.is_empty() {
            debug!(count = self.cleanup.len(), "queued image cleanup discarded on reopen");
            self.cleanup.clear();
        }
        self.phase = Phase::Editing;
        info!(
            collection = self.schema.collection,
            id = document.id().unwrap_or("<new>"),
            session = self.session,
            "form opened"
        );
        self.store.reset(document);
    }

    /// Closes the form and discards its edits and queued cleanup.
    pub fn cancel(&mut self) {
        if self.phase == Phase::Closed {
            return;
        }
        if !self.cleanup.is_empty() {
            debug!(count = self.cleanup.len(), "queued image cleanup discarded");
        }
        self.cleanup.clear();
        self.uploads.clear();
        self.phase = Phase::Closed;
        info!(collection = self.schema.collection, "form cancelled");
    }

    fn accept(&mut self, next: Document) -> bool {
        if next == *self.store.document() {
            return false;
        }
        self.store.replace(next);
        true
    }

    /// Stores `value` at `path`; returns whether the document changed.
    pub fn set_field(&mut self, path: &FieldPath, value: Value) -> bool {
        if !self.is_editing() {
            debug!(%path, phase = ?self.phase, "edit ignored while not editing");
            return false;
        }
        let next = path::write(self.store.document(), path, value);
        self.accept(next)
    }

    /// Stores text at `path`; returns whether the document changed.
    pub fn set_text(&mut self, path: &FieldPath, text: impl Into<String>) -> bool {
        self.set_field(path, Value::Text(text.into()))
    }

    fn record_shape(&self, list: &FieldPath) -> Option<&'static RecordShape> {
        match self.schema.kind_at(list)? {
            Kind::Records(shape) => Some(shape),
            _ => None,
        }
    }

    fn resolve_entry(&self, list: &FieldPath, action: ListAction, entry: Entry) -> Entry {
        if action != ListAction::Add || entry != Entry::Blank {
            return entry;
        }
        match self.schema.kind_at(list) {
            Some(Kind::Strings) => Entry::text(""),
            Some(Kind::Records(shape)) => Entry::Record(shape.blank()),
            _ => Entry::Blank,
        }
    }

    /// Applies one list edit; returns whether the document changed.
    ///
    /// A blank `Add` appends the list's default item. Removing a record whose image lives in the
    /// image store queues that image for cleanup.
    pub fn edit_list(
        &mut self,
        list: &FieldPath,
        action: ListAction,
        index: Option<usize>,
        entry: Entry,
    ) -> bool {
        if !self.is_editing() {
            debug!(%list, phase = ?self.phase, "list edit ignored while not editing");
            return false;
        }
        let entry = self.resolve_entry(list, action, entry);
        let removed_image = match (action, index) {
            (ListAction::Remove, Some(i)) => self.entry_image(list, i),
            _ => None,
        };

        let next = list_edit::apply(self.store.document(), list, action, index, entry);
        if !self.accept(next) {
            return false;
        }
        if let (ListAction::Remove, Some(i)) = (action, index) {
            self.shift_uploads(list, i);
            if let Some(url) = removed_image {
                self.queue_cleanup(url);
            }
        }
        true
    }

    fn entry_image(&self, list: &FieldPath, index: usize) -> Option<String> {
        let image_field = self.record_shape(list)?.image_field?;
        path::read_list(self.store.document(), list)
            .get(index)?
            .field_text(image_field)
            .map(str::to_string)
    }

    fn shift_uploads(&mut self, removed_list: &FieldPath, removed: usize) {
        self.uploads.retain(|_, slot| match slot {
            ImageSlot::Entry { list, index } if list == removed_list => {
                if *index == removed {
                    return false;
                }
                if *index > removed {
                    *index -= 1;
                }
                true
            }
            _ => true,
        });
    }

    fn queue_cleanup(&mut self, url: String) {
        if url.is_empty() || !self.images.is_managed(&url) {
            return;
        }
        debug!(%url, "image queued for cleanup");
        self.cleanup.push(url);
    }

    #[must_use]
    /// Image URLs waiting to be deleted.
    pub fn pending_cleanup(&self) -> &[String] {
        &self.cleanup
    }

    /// Deletes every queued image the document no longer references.
    ///
    /// An image whose URL was typed or uploaded back into any slot stays. Failures are logged
    /// and reported, never retried.
    pub fn flush_cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let live = self.schema.image_urls(self.store.document());
        for url in std::mem::take(&mut self.cleanup) {
            if live.contains(&url) {
                debug!(%url, "queued image is referenced again, kept");
                continue;
            }
            if report.deleted.contains(&url) || report.failed.iter().any(|(u, _)| *u == url) {
                continue;
            }
            match self.images.delete(&url) {
                Ok(()) => report.deleted.push(url),
                Err(e) => {
                    warn!(%url, error = %e, "image cleanup failed");
                    report.failed.push((url, e.to_string()));
                }
            }
        }
        report
    }

    fn slot_folder(&self, slot: &ImageSlot) -> Option<&'static str> {
        match slot {
            ImageSlot::Field(path) => match self.schema.kind_at(path)? {
                Kind::Image(folder) => Some(folder),
                _ => None,
            },
            ImageSlot::Entry { list, index } => {
                let shape = self.record_shape(list)?;
                shape.image_field?;
                let len = path::read_list(self.store.document(), list).len();
                (*index < len).then_some(shape.folder)
            }
        }
    }

    #[must_use]
    /// URL currently held by an image slot, empty when unset.
    pub fn image_at(&self, slot: &ImageSlot) -> String {
        match slot {
            ImageSlot::Field(path) => path::read_text(self.store.document(), path).to_string(),
            ImageSlot::Entry { list, index } => self.entry_image(list, *index).unwrap_or_default(),
        }
    }

    fn write_image(&mut self, slot: &ImageSlot, url: &str) {
        let next = match slot {
            ImageSlot::Field(path) => {
                path::write(self.store.document(), path, Value::from(url))
            }
            ImageSlot::Entry { list, index } => {
                let Some(image_field) = self.record_shape(list).and_then(|s| s.image_field) else {
                    return;
                };
                list_edit::apply(
                    self.store.document(),
                    list,
                    ListAction::Update,
                    Some(*index),
                    Entry::field(image_field, url),
                )
            }
        };
        self.accept(next);
    }

    #[must_use]
    /// Whether any upload is still running.
    pub fn upload_pending(&self) -> bool {
        !self.uploads.is_empty()
    }

    #[must_use]
    /// Whether an upload into this slot is running.
    pub fn is_uploading(&self, slot: &ImageSlot) -> bool {
        self.uploads.values().any(|s| s == slot)
    }

    /// Marks a slot as uploading.
    ///
    /// # Errors
    ///
    /// Refuses when the form is not editing, the slot holds no image, or the slot is already
    /// uploading.
    pub fn begin_upload(&mut self, slot: ImageSlot) -> Result<UploadTicket, UploadError> {
        if !self.is_editing() {
            return Err(UploadError::Closed);
        }
        let Some(folder) = self.slot_folder(&slot) else {
            return Err(UploadError::NotAnImage(slot));
        };
        if self.is_uploading(&slot) {
            return Err(UploadError::Busy(slot));
        }
        self.next_ticket += 1;
        let id = self.next_ticket;
        debug!(%slot, folder, ticket = id, "upload started");
        self.uploads.insert(id, slot);
        Ok(UploadTicket {
            session: self.session,
            id,
            folder,
        })
    }

    /// Applies the outcome of an upload and frees its slot.
    ///
    /// On success the URL is written into the slot and the image it replaces, if managed, is
    /// queued for cleanup. A result arriving after the form was closed or reopened, or after its
    /// entry was removed, is dropped and its image queued for cleanup instead.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Stale`] for a dropped result and [`UploadError::Failed`] when the
    /// upload itself failed.
    #[allow(clippy::needless_pass_by_value)]
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, BackendError>,
    ) -> Result<String, UploadError> {
        let slot = if ticket.session == self.session {
            self.uploads.remove(&ticket.id)
        } else {
            None
        };
        let Some(slot) = slot else {
            debug!(ticket = ticket.id, "stale upload result dropped");
            if let Ok(url) = result {
                self.queue_cleanup(url);
            }
            return Err(UploadError::Stale);
        };

        let url = result.inspect_err(|e| warn!(%slot, error = %e, "upload failed"))?;
        let previous = self.image_at(&slot);
        self.write_image(&slot, &url);
        if previous != url {
            self.queue_cleanup(previous);
        }
        info!(%slot, %url, "image uploaded");
        Ok(url)
    }

    /// Uploads a local image into a slot, in the slot's storage folder.
    ///
    /// # Errors
    ///
    /// See [`FormEditor::begin_upload`] and [`FormEditor::finish_upload`].
    pub fn upload_image(&mut self, slot: ImageSlot, local: &Path) -> Result<String, UploadError> {
        let ticket = self.begin_upload(slot)?;
        let result = self.images.upload(local, ticket.folder());
        self.finish_upload(ticket, result)
    }

    /// Empties an image slot; the image it held, if managed, is queued for cleanup.
    pub fn clear_image(&mut self, slot: &ImageSlot) -> bool {
        if !self.is_editing() || self.slot_folder(slot).is_none() {
            return false;
        }
        let previous = self.image_at(slot);
        if previous.is_empty() {
            return false;
        }
        self.write_image(slot, "");
        self.queue_cleanup(previous);
        true
    }

    /// Runs the submit gate without changing phase.
    ///
    /// # Errors
    ///
    /// See [`Blocked`].
    pub fn try_submit(&self) -> Result<Submission, Blocked> {
        if !self.is_editing() {
            return Err(Blocked::NotEditing);
        }
        submit::try_submit(
            self.schema,
            &self.original,
            self.store.document(),
            self.upload_pending(),
        )
    }

    /// Runs the submit gate and, when it passes, moves to `Submitting`.
    ///
    /// # Errors
    ///
    /// See [`Blocked`]; the editor stays `Editing`.
    pub fn begin_submit(&mut self) -> Result<Submission, Blocked> {
        let submission = self
            .try_submit()
            .inspect_err(|reason| info!(%reason, "submit refused"))?;
        self.phase = Phase::Submitting;
        Ok(submission)
    }

    /// Applies the outcome of a storage call started by [`FormEditor::begin_submit`].
    ///
    /// Success closes the form and records the confirmed document; failure returns to `Editing`
    /// with the edits intact.
    ///
    /// # Errors
    ///
    /// Returns the storage failure, or [`Blocked::NotEditing`] when no submit is in progress.
    pub fn finish_submit(
        &mut self,
        result: Result<Document, BackendError>,
    ) -> Result<Document, EditorError> {
        if self.phase != Phase::Submitting {
            return Err(Blocked::NotEditing.into());
        }
        match result {
            Ok(document) => {
                info!(
                    collection = self.schema.collection,
                    id = document.id().unwrap_or_default(),
                    "form saved"
                );
                self.phase = Phase::Closed;
                self.confirmed = Some(document.clone());
                Ok(document)
            }
            Err(e) => {
                warn!(collection = self.schema.collection, error = %e, "save failed");
                self.phase = Phase::Editing;
                Err(e.into())
            }
        }
    }

    /// Submits the form to `persistence`: creates or updates the record and closes the form.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Blocked`] without contacting storage when the gate refuses, and
    /// [`EditorError::Backend`] when storage fails.
    pub fn submit(&mut self, persistence: &dyn Persistence) -> Result<Document, EditorError> {
        let submission = self.begin_submit()?;
        let result = store_submission(persistence, self.schema.collection, &submission);
        self.finish_submit(result)
    }
}

/// Writes a submission to storage and returns the confirmed document with its identity key.
///
/// # Errors
///
/// Returns the storage failure.
pub fn store_submission(
    persistence: &dyn Persistence,
    collection: &str,
    submission: &Submission,
) -> Result<Document, BackendError> {
    let payload = submission.payload();
    match &submission.mode {
        SubmitMode::Create => {
            let id = persistence.add(collection, &payload)?;
            Ok(submission.document.clone().with_id(id))
        }
        SubmitMode::Update { id } => {
            persistence.update(collection, id, &payload)?;
            Ok(submission.document.clone())
        }
    }
}

#[cfg(test)]
#[path = "tests/editor.rs"]
mod tests;
