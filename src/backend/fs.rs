//! File-backed collaborators for the terminal app.
//!
//! Each collection is one pretty-printed JSON file mapping keys to documents, rewritten whole on
//! every change. Uploaded images are copied under a media directory and handed out as
//! `folio-media://` URLs, which are the only URLs this store will delete.

use super::{BackendError, ImageStore, Persistence, StoredDocument};
use crate::document::Document;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// URL scheme of images stored by [`DirImageStore`].
pub const MEDIA_SCHEME: &str = "folio-media://";

type Collection = BTreeMap<String, Document>;

/// Collections stored as `<root>/<collection>.json`.
pub struct JsonDirPersistence {
    root: PathBuf,
}

impl JsonDirPersistence {
    /// Storage rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    fn load(&self, collection: &str) -> Result<Collection, BackendError> {
        match fs::read_to_string(self.file(collection)) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Collection::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, collection: &str, docs: &Collection) -> Result<(), BackendError> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(docs)?;
        fs::write(self.file(collection), json)?;
        debug!(collection, count = docs.len(), "collection written");
        Ok(())
    }
}

fn not_found(collection: &str, id: &str) -> BackendError {
    BackendError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

impl Persistence for JsonDirPersistence {
    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, BackendError> {
        Ok(self
            .load(collection)?
            .into_iter()
            .map(|(id, document)| StoredDocument { id, document })
            .collect())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        Ok(self.load(collection)?.remove(id))
    }

    fn add(&self, collection: &str, document: &Document) -> Result<String, BackendError> {
        let mut docs = self.load(collection)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        docs.insert(id.clone(), document.clone());
        self.save(collection, &docs)?;
        info!(collection, %id, "document added");
        Ok(id)
    }

    fn put(&self, collection: &str, id: &str, document: &Document) -> Result<(), BackendError> {
        let mut docs = self.load(collection)?;
        docs.insert(id.to_string(), document.clone());
        self.save(collection, &docs)?;
        info!(collection, id, "document stored");
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), BackendError> {
        let mut docs = self.load(collection)?;
        let slot = docs.get_mut(id).ok_or_else(|| not_found(collection, id))?;
        *slot = document.clone();
        self.save(collection, &docs)?;
        info!(collection, id, "document updated");
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        let mut docs = self.load(collection)?;
        if docs.remove(id).is_none() {
            return Err(not_found(collection, id));
        }
        self.save(collection, &docs)?;
        info!(collection, id, "document deleted");
        Ok(())
    }
}

/// Images copied into `<root>/<folder>/`.
pub struct DirImageStore {
    root: PathBuf,
}

impl DirImageStore {
    /// Image storage rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    /// Local file behind a managed URL, refusing anything that would leave the root.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.strip_prefix(MEDIA_SCHEME)?);
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (inside && relative.components().next().is_some()).then(|| self.root.join(relative))
    }
}

fn object_name(local: &Path) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let mut tag = uuid::Uuid::new_v4().simple().to_string();
    tag.truncate(8);
    match local.extension() {
        Some(ext) => format!("{millis}_{tag}.{}", ext.to_string_lossy()),
        None => format!("{millis}_{tag}"),
    }
}

impl ImageStore for DirImageStore {
    fn upload(&self, local: &Path, folder: &str) -> Result<String, BackendError> {
        let relative = Path::new(folder).join(object_name(local));
        let url = format!("{MEDIA_SCHEME}{}", relative.display());
        let target = self
            .resolve(&url)
            .ok_or_else(|| BackendError::Rejected(format!("invalid upload folder {folder:?}")))?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(local, &target)?;
        info!(local = %local.display(), %url, "image uploaded");
        Ok(url)
    }

    fn delete(&self, url: &str) -> Result<(), BackendError> {
        let target = self
            .resolve(url)
            .ok_or_else(|| BackendError::UnmanagedUrl(url.to_string()))?;
        fs::remove_file(target)?;
        info!(url, "image deleted");
        Ok(())
    }

    fn is_managed(&self, url: &str) -> bool {
        self.resolve(url).is_some()
    }
}

#[cfg(test)]
#[path = "../tests/fs.rs"]
mod tests;
