//! Collaborators the editor talks to: document storage, image storage and admin login.
//!
//! The editor never reaches for a global client. It is handed trait objects, so the same code
//! runs against the JSON directory backend of the terminal app or the recording in-memory fakes
//! used by tests.

pub mod auth;
pub mod fs;
pub mod memory;

use crate::document::Document;
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
/// Failure reported by a storage or image collaborator.
pub enum BackendError {
    /// Underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Stored data could not be read or written as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// No document with this key exists in the collection.
    #[error("no document {id:?} in collection {collection:?}")]
    NotFound {
        /// Collection searched.
        collection: String,
        /// Missing key.
        id: String,
    },
    /// The URL does not belong to this image store.
    #[error("not a managed image URL: {0}")]
    UnmanagedUrl(String),
    /// The collaborator refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A document together with the key it is stored under.
pub struct StoredDocument {
    /// Storage key.
    pub id: String,
    /// Stored fields, without the key.
    pub document: Document,
}

impl StoredDocument {
    #[must_use]
    /// The document with its key merged in as the identity field.
    pub fn with_identity(&self) -> Document {
        self.document.clone().with_id(self.id.clone())
    }
}

/// Keyed document storage, grouped into named collections.
pub trait Persistence: Send + Sync {
    /// Every document of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, BackendError>;

    /// One document by key, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Stores a new document under a fresh key and returns the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be stored.
    fn add(&self, collection: &str, document: &Document) -> Result<String, BackendError>;

    /// Creates or overwrites the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be stored.
    fn put(&self, collection: &str, id: &str, document: &Document) -> Result<(), BackendError>;

    /// Overwrites an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no document has this key.
    fn update(&self, collection: &str, id: &str, document: &Document)
        -> Result<(), BackendError>;

    /// Removes a document.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no document has this key.
    fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError>;
}

/// Storage for uploaded images, addressed by URL.
pub trait ImageStore: Send + Sync {
    /// Uploads a local image into `folder` and returns its URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or stored.
    fn upload(&self, local: &Path, folder: &str) -> Result<String, BackendError>;

    /// Deletes a previously uploaded image.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not managed here or the delete fails.
    fn delete(&self, url: &str) -> Result<(), BackendError>;

    /// Whether this store owns the URL and may delete it.
    fn is_managed(&self, url: &str) -> bool;
}

/// Admin login gate for mutating operations.
pub trait Auth: Send + Sync {
    /// Attempts to log in; returns whether it succeeded.
    fn login(&self, email: &str, password: &str) -> bool;

    /// Logs out; returns whether a session was ended.
    fn logout(&self) -> bool;

    /// Whether an admin is currently logged in.
    fn is_admin(&self) -> bool;
}
