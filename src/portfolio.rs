//! Collection-level operations of the portfolio: listing, saving and deleting projects, and the
//! single profile document.
//!
//! Everything that changes storage requires an admin login. Image cleanup that accompanies a
//! change is best effort: a failed delete is logged and never undoes the change it belongs to.

use crate::backend::{Auth, BackendError, ImageStore, Persistence};
use crate::document::{Document, Value};
use crate::editor::{store_submission, CleanupReport, EditorError, FormEditor};
use crate::sample;
use crate::schema::Schema;
use crate::submit::{self, Submission, SubmitMode};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Storage key of the profile document.
pub const PROFILE_ID: &str = "main";

#[derive(Debug, thiserror::Error)]
/// Failure of a portfolio operation.
pub enum PortfolioError {
    /// The operation needs an admin login.
    #[error("admin login required")]
    Unauthorized,
    /// No stored project has this key.
    #[error("no project {0:?}")]
    NotFound(String),
    /// The form could not be submitted.
    #[error(transparent)]
    Editor(#[from] EditorError),
    /// Storage failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Portfolio operations over injected collaborators.
pub struct Portfolio {
    persistence: Arc<dyn Persistence>,
    images: Arc<dyn ImageStore>,
    auth: Arc<dyn Auth>,
}

fn order_of(project: &Document) -> i64 {
    project
        .get("order")
        .and_then(Value::as_number)
        .unwrap_or(0)
}

impl Portfolio {
    /// Portfolio backed by the given collaborators.
    pub fn new(
        persistence: Arc<dyn Persistence>,
        images: Arc<dyn ImageStore>,
        auth: Arc<dyn Auth>,
    ) -> Self {
        Self {
            persistence,
            images,
            auth,
        }
    }

    #[must_use]
    /// A closed editor for projects, uploading through this portfolio's image store.
    pub fn project_editor(&self) -> FormEditor {
        FormEditor::new(Schema::project(), Arc::clone(&self.images))
    }

    #[must_use]
    /// A closed editor for the profile.
    pub fn profile_editor(&self) -> FormEditor {
        FormEditor::new(Schema::profile(), Arc::clone(&self.images))
    }

    /// Attempts an admin login.
    pub fn login(&self, email: &str, password: &str) -> bool {
        self.auth.login(email, password)
    }

    /// Ends the admin session.
    pub fn logout(&self) -> bool {
        self.auth.logout()
    }

    #[must_use]
    /// Whether mutating operations are allowed.
    pub fn is_admin(&self) -> bool {
        self.auth.is_admin()
    }

    fn require_admin(&self) -> Result<(), PortfolioError> {
        if self.auth.is_admin() {
            Ok(())
        } else {
            warn!("mutation refused without admin login");
            Err(PortfolioError::Unauthorized)
        }
    }

    #[must_use]
    /// Every stored project, complete and sorted by `order`.
    ///
    /// While storage holds no project, or cannot be read, the sample projects are listed.
    pub fn load_projects(&self) -> Vec<Document> {
        let schema = Schema::project();
        match self.persistence.list(schema.collection) {
            Ok(stored) if !stored.is_empty() => {
                let mut projects: Vec<_> = stored
                    .iter()
                    .map(|s| schema.normalize(&s.with_identity()))
                    .collect();
                projects.sort_by_key(order_of);
                info!(count = projects.len(), "projects loaded");
                projects
            }
            Ok(_) => {
                info!("no stored projects, listing samples");
                sample::sample_projects()
            }
            Err(e) => {
                error!(error = %e, "could not load projects, listing samples");
                sample::sample_projects()
            }
        }
    }

    fn save_with(
        &self,
        editor: &mut FormEditor,
        write: impl FnOnce(&mut Submission) -> Result<Document, BackendError>,
    ) -> Result<(Document, CleanupReport), PortfolioError> {
        self.require_admin()?;
        let mut submission = editor.begin_submit().map_err(EditorError::from)?;
        let result = write(&mut submission);
        let saved = editor.finish_submit(result)?;
        Ok((saved, editor.flush_cleanup()))
    }

    /// Saves the project form; a new project is placed after every existing one.
    ///
    /// Images dropped while editing are deleted once the save is confirmed.
    ///
    /// # Errors
    ///
    /// Fails without an admin login, when the form cannot be submitted, or when storage fails;
    /// in the last two cases the form stays open.
    pub fn save_project(&self, editor: &mut FormEditor) -> Result<Document, PortfolioError> {
        let collection = Schema::project().collection;
        self.save_with(editor, |submission| {
            if submission.mode == SubmitMode::Create {
                let count = self.persistence.list(collection)?.len();
                let order = i64::try_from(count).unwrap_or(i64::MAX);
                submission.document.insert("order", Value::Number(order));
            }
            store_submission(self.persistence.as_ref(), collection, submission)
        })
        .map(|(saved, _)| saved)
    }

    /// Deletes a project together with every image it owns.
    ///
    /// # Errors
    ///
    /// Fails without an admin login, when no project has this key, or when storage fails.
    /// Image deletions that fail are logged and do not stop the project delete.
    pub fn delete_project(&self, id: &str) -> Result<(), PortfolioError> {
        self.require_admin()?;
        let schema = Schema::project();
        let project = self
            .persistence
            .get(schema.collection, id)?
            .ok_or_else(|| PortfolioError::NotFound(id.to_string()))?;

        for url in schema.image_urls(&project) {
            if !self.images.is_managed(&url) {
                continue;
            }
            if let Err(e) = self.images.delete(&url) {
                warn!(%url, error = %e, "project image could not be deleted");
            }
        }
        self.persistence.delete(schema.collection, id)?;
        info!(id, "project deleted");
        Ok(())
    }

    #[must_use]
    /// The profile, with fields it lacks taken from the default profile.
    ///
    /// Sections such as `links` are merged field by field, so a stored section missing one link
    /// still shows the default for it.
    ///
    /// The default profile is stored the first time it is needed. Storage failures are logged
    /// and answered with the default profile.
    pub fn load_profile(&self) -> Document {
        let schema = Schema::profile();
        let defaults = sample::default_profile();
        match self.persistence.get(schema.collection, PROFILE_ID) {
            Ok(Some(stored)) => {
                let mut fields = defaults.into_fields();
                for (name, value) in stored.into_fields() {
                    if let (Some(Value::Record(default)), Value::Record(section)) =
                        (fields.get_mut(&name), &value)
                    {
                        default.extend(section.clone());
                    } else {
                        fields.insert(name, value);
                    }
                }
                schema
                    .normalize(&Document::from_fields(fields))
                    .with_id(PROFILE_ID)
            }
            Ok(None) => {
                let payload = submit::persistable(&defaults);
                match self.persistence.put(schema.collection, PROFILE_ID, &payload) {
                    Ok(()) => info!("default profile stored"),
                    Err(e) => error!(error = %e, "could not store default profile"),
                }
                defaults.with_id(PROFILE_ID)
            }
            Err(e) => {
                error!(error = %e, "could not load profile");
                defaults.with_id(PROFILE_ID)
            }
        }
    }

    /// Saves the profile form over the stored profile.
    ///
    /// When the profile image changed, the previous one is deleted if this store owns it; a
    /// failed delete is logged and the save still succeeds.
    ///
    /// # Errors
    ///
    /// Fails without an admin login, when the form cannot be submitted, or when storage fails.
    pub fn save_profile(&self, editor: &mut FormEditor) -> Result<Document, PortfolioError> {
        let collection = Schema::profile().collection;
        let previous = editor.original().text("profileImage").to_string();
        let (saved, cleanup) = self.save_with(editor, |submission| {
            self.persistence
                .put(collection, PROFILE_ID, &submission.payload())?;
            Ok(submission.document.clone().with_id(PROFILE_ID))
        })?;

        let handled = cleanup.deleted.contains(&previous)
            || cleanup.failed.iter().any(|(url, _)| *url == previous);
        let replaced = !previous.is_empty() && previous != saved.text("profileImage");
        if replaced && !handled && self.images.is_managed(&previous) {
            match self.images.delete(&previous) {
                Ok(()) => info!(url = %previous, "previous profile image deleted"),
                Err(e) => warn!(url = %previous, error = %e, "previous profile image kept"),
            }
        }
        Ok(saved)
    }
}

#[cfg(test)]
#[path = "tests/portfolio.rs"]
mod tests;
