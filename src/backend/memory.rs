//! In-memory collaborators that record every call.
//!
//! These back the test suite and stand in for real storage in demos. Failures can be scripted so
//! error paths can be driven without touching the disk.

use super::{Auth, BackendError, ImageStore, Persistence, StoredDocument};
use crate::document::Document;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Clone, Debug, PartialEq, Eq)]
/// A call received by [`MemoryPersistence`].
pub enum PersistenceCall {
    /// `list(collection)`.
    List(String),
    /// `get(collection, id)`.
    Get(String, String),
    /// `add(collection, document)`.
    Add(String, Document),
    /// `put(collection, id, document)`.
    Put(String, String, Document),
    /// `update(collection, id, document)`.
    Update(String, String, Document),
    /// `delete(collection, id)`.
    Delete(String, String),
}

#[derive(Default)]
/// Document storage held in a map, with a call log.
pub struct MemoryPersistence {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Document>>>,
    calls: Mutex<Vec<PersistenceCall>>,
    next_id: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryPersistence {
    #[must_use]
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document without logging a call.
    pub fn insert(&self, collection: &str, id: &str, document: Document) {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }

    #[must_use]
    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<PersistenceCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    /// Calls that would have written to storage.
    pub fn write_calls(&self) -> Vec<PersistenceCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(call, PersistenceCall::List(_) | PersistenceCall::Get(..))
            })
            .collect()
    }

    /// Makes every following write fail with [`BackendError::Rejected`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: PersistenceCall) -> Result<(), BackendError> {
        let is_write = !matches!(call, PersistenceCall::List(_) | PersistenceCall::Get(..));
        self.calls.lock().push(call);
        if is_write && self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("scripted write failure".to_string()));
        }
        Ok(())
    }
}

fn not_found(collection: &str, id: &str) -> BackendError {
    BackendError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

impl Persistence for MemoryPersistence {
    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, BackendError> {
        self.record(PersistenceCall::List(collection.to_string()))?;
        Ok(self
            .collections
            .lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, document)| StoredDocument {
                        id: id.clone(),
                        document: document.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        self.record(PersistenceCall::Get(collection.to_string(), id.to_string()))?;
        Ok(self
            .collections
            .lock()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn add(&self, collection: &str, document: &Document) -> Result<String, BackendError> {
        self.record(PersistenceCall::Add(
            collection.to_string(),
            document.clone(),
        ))?;
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.insert(collection, &id, document.clone());
        Ok(id)
    }

    fn put(&self, collection: &str, id: &str, document: &Document) -> Result<(), BackendError> {
        self.record(PersistenceCall::Put(
            collection.to_string(),
            id.to_string(),
            document.clone(),
        ))?;
        self.insert(collection, id, document.clone());
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), BackendError> {
        self.record(PersistenceCall::Update(
            collection.to_string(),
            id.to_string(),
            document.clone(),
        ))?;
        let mut collections = self.collections.lock();
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;
        *slot = document.clone();
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        self.record(PersistenceCall::Delete(
            collection.to_string(),
            id.to_string(),
        ))?;
        self.collections
            .lock()
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| not_found(collection, id))
    }
}

/// URL scheme used by [`MemoryImageStore`].
pub const MEMORY_SCHEME: &str = "memory://";

#[derive(Default)]
/// Image storage that remembers uploaded URLs, with a log of deletes.
pub struct MemoryImageStore {
    objects: Mutex<BTreeSet<String>>,
    uploads: Mutex<Vec<(String, String)>>,
    deletes: Mutex<Vec<String>>,
    next_object: AtomicU64,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryImageStore {
    #[must_use]
    /// Empty image storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing object and returns its URL.
    pub fn seed(&self, folder: &str, name: &str) -> String {
        let url = format!("{MEMORY_SCHEME}{folder}/{name}");
        self.objects.lock().insert(url.clone());
        url
    }

    #[must_use]
    /// Whether an object is currently stored under the URL.
    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().contains(url)
    }

    #[must_use]
    /// `(local path, folder)` of every upload attempt, oldest first.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().clone()
    }

    #[must_use]
    /// URL of every delete attempt, oldest first.
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }

    /// Makes uploads fail with [`BackendError::Rejected`].
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Makes deletes fail with [`BackendError::Rejected`].
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl ImageStore for MemoryImageStore {
    fn upload(&self, local: &Path, folder: &str) -> Result<String, BackendError> {
        self.uploads
            .lock()
            .push((local.display().to_string(), folder.to_string()));
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("scripted upload failure".to_string()));
        }
        let n = self.next_object.fetch_add(1, Ordering::SeqCst) + 1;
        let name = local
            .file_name()
            .map_or_else(|| "image".to_string(), |f| f.to_string_lossy().to_string());
        Ok(self.seed(folder, &format!("{n}_{name}")))
    }

    fn delete(&self, url: &str) -> Result<(), BackendError> {
        self.deletes.lock().push(url.to_string());
        if !self.is_managed(url) {
            return Err(BackendError::UnmanagedUrl(url.to_string()));
        }
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("scripted delete failure".to_string()));
        }
        self.objects.lock().remove(url);
        Ok(())
    }

    fn is_managed(&self, url: &str) -> bool {
        url.starts_with(MEMORY_SCHEME)
    }
}

/// Login gate accepting one fixed pair of credentials.
pub struct StaticAuth {
    email: String,
    password: String,
    logged_in: AtomicBool,
}

impl StaticAuth {
    /// Gate accepting `email` with `password`, starting logged out.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            logged_in: AtomicBool::new(false),
        }
    }

    /// Gate that starts with an admin already logged in.
    pub fn admin() -> Self {
        let auth = Self::new("admin@example.com", "admin");
        auth.logged_in.store(true, Ordering::SeqCst);
        auth
    }
}

impl Auth for StaticAuth {
    fn login(&self, email: &str, password: &str) -> bool {
        let ok = email == self.email && password == self.password;
        if ok {
            self.logged_in.store(true, Ordering::SeqCst);
        }
        ok
    }

    fn logout(&self) -> bool {
        self.logged_in.swap(false, Ordering::SeqCst)
    }

    fn is_admin(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "../tests/memory.rs"]
mod tests;
