//! folio: nested form state for editing portfolio projects and the owner's profile.
//!
//! Documents are JSON-like trees declared by a [`schema::Schema`]. A [`editor::FormEditor`]
//! holds one open form: it applies field and list edits, tracks image uploads and the images left
//! behind by edits, and decides whether a save creates or updates. [`portfolio::Portfolio`] wires
//! editors to storage, image hosting and admin login, and the terminal front end in
//! [`app_state`] and [`ui`] drives it all from the keyboard.

pub mod app_state;
pub mod backend;
pub mod config;
pub mod document;
pub mod editor;
pub mod list_edit;
pub mod outline;
pub mod path;
pub mod portfolio;
pub mod sample;
pub mod schema;
pub mod store;
pub mod submit;
pub mod ui;
