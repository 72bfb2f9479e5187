//! The UI renders the application state into something visible and vim-able.
//!
//! The draw function dispatches based on the current view (project list, form, or field editor).
//! The command line borrows the bottom bar of whichever view it was opened from.

use crate::app_state::{AppState, FormMode, View};
use crate::editor::Phase;
use crate::outline::Target;
use edtui::{EditorTheme, EditorView};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Renders the active view based on current application state.
pub fn draw(f: &mut Frame, app: &mut AppState) {
    let view = match app.current_view {
        View::Command => app.command_origin,
        view => view,
    };
    match view {
        View::Projects | View::Command => draw_projects(f, app),
        View::Form => draw_form(f, app),
        View::Field => draw_field(f, app),
    }
}

fn help_bar(f: &mut Frame, app: &AppState, area: Rect, help: &str) {
    let text = if app.current_view == View::Command {
        format!(":{}", app.command_buffer)
    } else if let Some(ref msg) = app.message {
        msg.clone()
    } else {
        help.to_string()
    };
    let widget = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    f.render_widget(widget, area);
}

fn login_badge(app: &AppState) -> &'static str {
    if app.portfolio.is_admin() {
        "admin"
    } else {
        "read-only"
    }
}

fn draw_projects(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let items: Vec<ListItem> = app
        .projects
        .iter()
        .enumerate()
        .map(|(i, project)| {
            let title = match project.text("title") {
                "" => "(untitled)",
                title => title,
            };
            let line = Line::from(vec![
                Span::styled(
                    title.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    project.text("description").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            let style = if i == app.current_project_index {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = format!("Projects ({}, {})", app.projects.len(), login_badge(app));
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, chunks[0]);

    help_bar(
        f,
        app,
        chunks[1],
        "↑/↓: Navigate | Enter: Open | :new New | :rm Delete | :login / :logout | :q Quit",
    );
}

fn row_style(target: &Target, selected: bool) -> Style {
    let style = match target {
        Target::Heading => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        Target::Add(_) => Style::default().fg(Color::DarkGray),
        Target::Image(_) => Style::default().fg(Color::Magenta),
        Target::Field(_) | Target::Item { .. } | Target::RecordField { .. } => Style::default(),
    };
    if selected {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

fn form_title(app: &AppState) -> String {
    let schema = app.editor.schema();
    let state = match app.editor.phase() {
        Phase::Closed => "closed",
        Phase::Editing if app.editor.upload_pending() => "uploading",
        Phase::Editing => "editing",
        Phase::Submitting => "saving",
    };
    match (app.form_mode, app.editor.original().id()) {
        (FormMode::Projects, None) => format!("New {} ({state}, {})", schema.title, login_badge(app)),
        (_, id) => format!(
            "{} {} ({state}, {})",
            schema.title,
            id.unwrap_or_default(),
            login_badge(app)
        ),
    }
}

fn draw_form(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let indent = "  ".repeat(row.depth);
            let line = match row.target {
                Target::Heading => Line::from(format!("{indent}{}", row.label)),
                _ => Line::from(vec![
                    Span::raw(format!("{indent}{}: ", row.label)),
                    Span::raw(row.value.replace('\n', " ⏎ ")),
                ]),
            };
            ListItem::new(line).style(row_style(&row.target, i == app.current_row_index))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(form_title(app)),
    );
    f.render_widget(list, chunks[0]);

    help_bar(
        f,
        app,
        chunks[1],
        "Enter: Edit | :a Add | :d Remove | :u <file> Upload | :clear | :m <METHOD> | :w Save | :x Save & Close | :q Close",
    );
}

fn draw_field(f: &mut Frame, app: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Breadcrumb
            Constraint::Min(0),    // Editor
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let label = app
        .current_row()
        .map(|row| row.label.clone())
        .unwrap_or_default();
    let breadcrumb = format!("{} > {label}", form_title(app));
    let breadcrumb_widget =
        Paragraph::new(breadcrumb).block(Block::default().borders(Borders::ALL).title("Navigation"));
    f.render_widget(breadcrumb_widget, chunks[0]);

    let title = format!("{label} (max line: {} chars)", app.max_line_width());
    if let Some(ref mut editor_state) = app.editor_state {
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(chunks[1]);
        f.render_widget(block, chunks[1]);

        let editor = EditorView::new(editor_state)
            .theme(EditorTheme::default())
            .wrap(true);
        f.render_widget(editor, inner);
    }

    help_bar(
        f,
        app,
        chunks[2],
        ":w Apply | :x Apply & Back | :q Back | :q! Discard",
    );
}
