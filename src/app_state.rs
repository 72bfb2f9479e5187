//! The core state machine bridging the portfolio and the interactive form.
//!
//! A TUI needs a single source of truth that can be interrogated and mutated as the user navigates
//! and edits. The open form lives in a [`FormEditor`]; this state keeps the rows it is displayed
//! as, the text buffer of the field being typed in, and the command line.

use crate::document::{Document, Value};
use crate::editor::{FormEditor, ImageSlot, Phase};
use crate::list_edit::{Entry, ListAction};
use crate::outline::{self, Row, Target};
use crate::path::FieldPath;
use crate::portfolio::Portfolio;
use crate::schema::{Kind, API_METHODS};
use edtui::{EditorState, Lines};
use std::path::Path;
use tracing::debug;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// Which document the session edits.
pub enum FormMode {
    /// The project collection, starting from the project list.
    Projects,
    /// The single profile document; quitting the form quits the app.
    Profile,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// Determines which UI screen renders and how input is interpreted.
pub enum View {
    /// Lists projects.
    Projects,
    /// Shows the rows of the open form.
    Form,
    /// Provides a vim-like editor for one field.
    Field,
    /// Captures vim-style command input after ':' keystroke.
    Command,
}

#[derive(PartialEq, Eq, Debug)]
/// Whether the event loop keeps running after a command.
pub enum Flow {
    /// Keep running.
    Continue,
    /// Leave the app.
    Quit,
}

/// Session state of the terminal front end.
pub struct AppState {
    /// Storage, images and login.
    pub portfolio: Portfolio,
    /// Projects or profile session.
    pub form_mode: FormMode,
    /// Projects as last loaded.
    pub projects: Vec<Document>,
    /// Selected project in the project list.
    pub current_project_index: usize,
    /// The form being edited.
    pub editor: FormEditor,
    /// Rows of the open form.
    pub rows: Vec<Row>,
    /// Selected row in the form.
    pub current_row_index: usize,
    /// Active UI screen determining input handling.
    pub current_view: View,
    /// View the command line returns to.
    pub command_origin: View,
    /// Editor buffer content when the field view is active.
    pub editor_state: Option<EditorState>,
    /// Accumulates vim-style command input after ':' is pressed.
    pub command_buffer: String,
    /// Status feedback displayed in the help bar.
    pub message: Option<String>,
    /// Maximum line width for text wrapping in the editor.
    pub wrap_width: usize,
    /// Document confirmed by the last successful save.
    pub last_saved: Option<Document>,
}

impl AppState {
    #[must_use]
    /// Initialises the session: the project list, or the profile form opened straight away.
    pub fn new(portfolio: Portfolio, form_mode: FormMode, wrap_width: usize) -> Self {
        let editor = match form_mode {
            FormMode::Projects => portfolio.project_editor(),
            FormMode::Profile => portfolio.profile_editor(),
        };
        let mut state = Self {
            portfolio,
            form_mode,
            projects: Vec::new(),
            current_project_index: 0,
            editor,
            rows: Vec::new(),
            current_row_index: 0,
            current_view: View::Projects,
            command_origin: View::Projects,
            editor_state: None,
            command_buffer: String::new(),
            message: None,
            wrap_width,
            last_saved: None,
        };
        match form_mode {
            FormMode::Projects => state.reload_projects(),
            FormMode::Profile => {
                let profile = state.portfolio.load_profile();
                state.open_form(Some(&profile));
            }
        }
        state
    }

    /// Reads the project list again, keeping the selection in range.
    pub fn reload_projects(&mut self) {
        self.projects = self.portfolio.load_projects();
        self.current_project_index = self
            .current_project_index
            .min(self.projects.len().saturating_sub(1));
    }

    fn refresh_rows(&mut self) {
        self.rows = if self.editor.phase() == Phase::Closed {
            Vec::new()
        } else {
            outline::rows(self.editor.schema(), self.editor.document())
        };
        self.current_row_index = self
            .current_row_index
            .min(self.rows.len().saturating_sub(1));
    }

    fn open_form(&mut self, record: Option<&Document>) {
        self.editor.open(record);
        self.current_row_index = 0;
        self.refresh_rows();
        self.current_view = View::Form;
    }

    #[must_use]
    /// The selected form row.
    pub fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.current_row_index)
    }

    #[must_use]
    /// Line width for the field being edited, narrowed by the row's indentation.
    pub fn max_line_width(&self) -> usize {
        let indent = self.current_row().map_or(0, |row| row.depth * 2);
        self.wrap_width.saturating_sub(indent)
    }

    /// Moves the selection up in the list or form.
    pub fn select_previous(&mut self) {
        match self.current_view {
            View::Projects => {
                self.current_project_index = self.current_project_index.saturating_sub(1);
            }
            View::Form => self.current_row_index = self.current_row_index.saturating_sub(1),
            View::Field | View::Command => {}
        }
    }

    /// Moves the selection down in the list or form.
    pub fn select_next(&mut self) {
        match self.current_view {
            View::Projects => {
                if self.current_project_index + 1 < self.projects.len() {
                    self.current_project_index += 1;
                }
            }
            View::Form => {
                if self.current_row_index + 1 < self.rows.len() {
                    self.current_row_index += 1;
                }
            }
            View::Field | View::Command => {}
        }
    }

    /// Opens the selected project in the form.
    pub fn open_selected_project(&mut self) {
        let Some(project) = self.projects.get(self.current_project_index).cloned() else {
            self.message = Some("No projects".to_string());
            return;
        };
        self.open_form(Some(&project));
    }

    fn require_admin(&mut self) -> bool {
        if self.portfolio.is_admin() {
            return true;
        }
        self.message = Some("Admin login required (:login <email> <password>)".to_string());
        false
    }

    /// Opens a blank project form.
    pub fn new_project(&mut self) {
        if self.require_admin() {
            self.open_form(None);
        }
    }

    /// Deletes the selected project and its images.
    pub fn delete_selected_project(&mut self) {
        if !self.require_admin() {
            return;
        }
        let Some(id) = self
            .projects
            .get(self.current_project_index)
            .and_then(Document::id)
            .map(str::to_string)
        else {
            self.message = Some("No project selected".to_string());
            return;
        };
        match self.portfolio.delete_project(&id) {
            Ok(()) => {
                self.message = Some(format!("Deleted {id}"));
                self.reload_projects();
            }
            Err(e) => self.message = Some(format!("Error deleting: {e}")),
        }
    }

    /// Closes the form without saving.
    pub fn close_form(&mut self) -> Flow {
        self.editor.cancel();
        self.refresh_rows();
        match self.form_mode {
            FormMode::Projects => {
                self.current_view = View::Projects;
                Flow::Continue
            }
            FormMode::Profile => Flow::Quit,
        }
    }

    /// Saves the form through the portfolio; returns whether it was saved.
    pub fn save_form(&mut self) -> bool {
        let result = match self.form_mode {
            FormMode::Projects => self.portfolio.save_project(&mut self.editor),
            FormMode::Profile => self.portfolio.save_profile(&mut self.editor),
        };
        match result {
            Ok(saved) => {
                self.message = Some(format!("Saved {}", saved.id().unwrap_or_default()));
                self.last_saved = Some(saved);
                true
            }
            Err(e) => {
                self.message = Some(format!("Error saving: {e}"));
                false
            }
        }
    }

    fn after_save(&mut self, close: bool) -> Flow {
        match (self.form_mode, close) {
            (FormMode::Projects, _) => {
                self.reload_projects();
                self.refresh_rows();
                self.current_view = View::Projects;
                Flow::Continue
            }
            (FormMode::Profile, true) => Flow::Quit,
            (FormMode::Profile, false) => {
                let saved = self.last_saved.clone();
                let row = self.current_row_index;
                self.open_form(saved.as_ref());
                self.current_row_index = row.min(self.rows.len().saturating_sub(1));
                Flow::Continue
            }
        }
    }

    /// Loads the selected row's value into the editor buffer.
    ///
    /// On an "add" row the list gets a new item instead.
    pub fn enter_field_view(&mut self) {
        let Some(row) = self.current_row().cloned() else {
            return;
        };
        if let Target::Add(_) = row.target {
            self.add_item();
            return;
        }
        if !row.is_editable() {
            return;
        }
        self.editor_state = Some(EditorState::new(Lines::from(row.value.as_str())));
        self.current_view = View::Field;
    }

    fn buffer_text(&self) -> Option<String> {
        self.editor_state.as_ref().map(|editor_state| {
            editor_state
                .lines
                .iter_row()
                .map(|line| line.iter().collect::<String>())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    /// Writes the editor buffer into the selected field, staying in the field view.
    pub fn save_field(&mut self) -> bool {
        let (Some(text), Some(row)) = (self.buffer_text(), self.current_row().cloned()) else {
            return false;
        };
        let changed = self.apply_text(&row.target, text.trim_end_matches('\n').to_string());
        self.refresh_rows();
        changed
    }

    /// Returns to the form, optionally writing the buffer into the field first.
    pub fn exit_field_view(&mut self, save: bool) {
        if save {
            self.save_field();
        }
        self.editor_state = None;
        self.current_view = View::Form;
    }

    fn image_field_of(&self, list: &FieldPath) -> Option<&'static str> {
        match self.editor.schema().kind_at(list)? {
            Kind::Records(shape) => shape.image_field,
            _ => None,
        }
    }

    /// Stores typed text at a row's target.
    pub fn apply_text(&mut self, target: &Target, text: String) -> bool {
        if !self.require_admin() {
            return false;
        }
        let changed = match target {
            Target::Field(path) => {
                if self.editor.schema().kind_at(path) == Some(Kind::Number) {
                    match text.trim().parse::<i64>() {
                        Ok(n) => self.editor.set_field(path, Value::Number(n)),
                        Err(_) => {
                            self.message = Some(format!("Not a number: {text}"));
                            return false;
                        }
                    }
                } else {
                    self.editor.set_text(path, text)
                }
            }
            Target::Image(ImageSlot::Field(path)) => self.editor.set_text(path, text),
            Target::Image(ImageSlot::Entry { list, index }) => match self.image_field_of(list) {
                Some(field) => self.editor.edit_list(
                    list,
                    ListAction::Update,
                    Some(*index),
                    Entry::field(field, text),
                ),
                None => false,
            },
            Target::Item { list, index } => {
                self.editor
                    .edit_list(list, ListAction::Update, Some(*index), Entry::Text(text))
            }
            Target::RecordField { list, index, field } => self.editor.edit_list(
                list,
                ListAction::Update,
                Some(*index),
                Entry::field(*field, text),
            ),
            Target::Heading | Target::Add(_) => false,
        };
        debug!(?target, changed, "field edited");
        changed
    }

    /// Appends a default item to the list of the selected row.
    pub fn add_item(&mut self) {
        if !self.require_admin() {
            return;
        }
        let Some((list, _)) = self.current_row().and_then(Row::list) else {
            self.message = Some("Not on a list".to_string());
            return;
        };
        let list = list.clone();
        if self.editor.edit_list(&list, ListAction::Add, None, Entry::Blank) {
            self.refresh_rows();
            self.message = Some(format!("Added to {list}"));
        }
    }

    /// Removes the list item of the selected row.
    pub fn remove_item(&mut self) {
        if !self.require_admin() {
            return;
        }
        let Some((list, Some(index))) = self.current_row().and_then(Row::list) else {
            self.message = Some("Not on a list item".to_string());
            return;
        };
        let list = list.clone();
        let queued = self.editor.pending_cleanup().len();
        if self
            .editor
            .edit_list(&list, ListAction::Remove, Some(index), Entry::Blank)
        {
            self.refresh_rows();
            self.message = Some(if self.editor.pending_cleanup().len() == queued {
                format!("Removed {list}[{index}]")
            } else {
                format!("Removed {list}[{index}]; its image is deleted on save")
            });
        }
    }

    fn current_image_slot(&mut self) -> Option<ImageSlot> {
        let slot = match self.current_row().map(|row| &row.target) {
            Some(Target::Image(slot)) => Some(slot.clone()),
            _ => None,
        };
        if slot.is_none() {
            self.message = Some("Not on an image".to_string());
        }
        slot
    }

    /// Uploads a local file into the image slot of the selected row.
    pub fn upload(&mut self, file: &str) {
        if file.is_empty() {
            self.message = Some("Usage: :u <file>".to_string());
            return;
        }
        if !self.require_admin() {
            return;
        }
        let Some(slot) = self.current_image_slot() else {
            return;
        };
        self.message = Some(match self.editor.upload_image(slot, Path::new(file)) {
            Ok(url) => format!("Uploaded {url}"),
            Err(e) => format!("Error uploading: {e}"),
        });
        self.refresh_rows();
    }

    /// Empties the image slot of the selected row.
    pub fn clear_image(&mut self) {
        if !self.require_admin() {
            return;
        }
        let Some(slot) = self.current_image_slot() else {
            return;
        };
        if self.editor.clear_image(&slot) {
            self.refresh_rows();
            self.message = Some(format!("Cleared {slot}"));
        }
    }

    /// Sets the HTTP method of the API entry on the selected row.
    pub fn set_method(&mut self, method: &str) {
        let method = method.to_ascii_uppercase();
        if !API_METHODS.contains(&method.as_str()) {
            self.message = Some(format!("Method must be one of {}", API_METHODS.join(", ")));
            return;
        }
        let Some(Target::RecordField { list, index, .. }) =
            self.current_row().map(|row| row.target.clone())
        else {
            self.message = Some("Not on an API entry".to_string());
            return;
        };
        let has_method = match self.editor.schema().kind_at(&list) {
            Some(Kind::Records(shape)) => shape.fields.iter().any(|(f, _)| *f == "method"),
            _ => false,
        };
        if !has_method {
            self.message = Some("Not on an API entry".to_string());
            return;
        }
        let target = Target::RecordField {
            list,
            index,
            field: "method",
        };
        if self.apply_text(&target, method) {
            self.refresh_rows();
        }
    }

    fn login(&mut self, args: &str) {
        let mut parts = args.split_whitespace();
        let (Some(email), Some(password)) = (parts.next(), parts.next()) else {
            self.message = Some("Usage: :login <email> <password>".to_string());
            return;
        };
        self.message = Some(if self.portfolio.login(email, password) {
            format!("Logged in as {email}")
        } else {
            "Login failed".to_string()
        });
    }

    fn logout(&mut self) {
        self.message = Some(if self.portfolio.logout() {
            "Logged out".to_string()
        } else {
            "Not logged in".to_string()
        });
    }

    /// Runs a `:` command entered from `command_origin`.
    pub fn execute_command(&mut self, cmd: &str) -> Flow {
        let cmd = cmd.trim();
        let (name, args) = cmd
            .split_once(' ')
            .map_or((cmd, ""), |(name, args)| (name, args.trim()));
        self.current_view = self.command_origin;

        match (self.command_origin, name) {
            (_, "login") => self.login(args),
            (_, "logout") => self.logout(),
            (View::Field, "w") => {
                if self.save_field() {
                    self.message = Some("Field updated".to_string());
                }
            }
            (View::Field, "x") => self.exit_field_view(true),
            (View::Field, "q" | "q!") => self.exit_field_view(false),
            (View::Form, "w") => {
                if self.save_form() {
                    return self.after_save(false);
                }
            }
            (View::Form, "x") => {
                if self.save_form() {
                    return self.after_save(true);
                }
            }
            (View::Form, "q" | "q!") => return self.close_form(),
            (View::Form, "a") => self.add_item(),
            (View::Form, "d") => self.remove_item(),
            (View::Form, "u") => self.upload(args),
            (View::Form, "clear") => self.clear_image(),
            (View::Form, "m") => self.set_method(args),
            (View::Projects, "q" | "q!") => return Flow::Quit,
            (View::Projects, "new") => self.new_project(),
            (View::Projects, "rm") => self.delete_selected_project(),
            _ => self.message = Some(format!("Unknown command: {cmd}")),
        }
        Flow::Continue
    }
}

#[cfg(test)]
#[path = "tests/app_state.rs"]
mod tests;
