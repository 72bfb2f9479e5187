//! folio: A terminal admin editor for portfolio projects and the profile.
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use edtui::EditorEventHandler;
use folio::backend::auth::ConfigAuth;
use folio::backend::fs::{DirImageStore, JsonDirPersistence};
use folio::portfolio::Portfolio;
use folio::{app_state, config, ui};
use ratatui::crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Edit portfolio projects and the profile", long_about = None)]
struct Args {
    /// Directory holding the collection files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory uploaded images are copied into
    #[arg(long, value_name = "DIR")]
    media_dir: Option<PathBuf>,

    /// Edit the profile instead of the projects
    #[arg(long)]
    profile: bool,
}

fn setup_tracing(cfg: &config::Config) -> io::Result<()> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    if cfg.log_file.is_empty() {
        return Ok(());
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)?;
    let filter = EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let (mut cfg, config_error) = match config::Config::read(Path::new(config::CONFIG_FILE)) {
        Ok(cfg) => (cfg.unwrap_or_else(config::Config::defaults), None),
        Err(e) => (config::Config::defaults(), Some(e)),
    };

    // Override config with command line args
    if let Some(dir) = args.data_dir {
        cfg.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(dir) = args.media_dir {
        cfg.media_dir = dir.to_string_lossy().to_string();
    }
    setup_tracing(&cfg)?;
    if let Some(e) = config_error {
        warn!(file = config::CONFIG_FILE, error = %e, "ignoring unparsable config");
    }
    info!(data_dir = %cfg.data_dir, media_dir = %cfg.media_dir, "starting");

    let portfolio = Portfolio::new(
        Arc::new(JsonDirPersistence::new(&cfg.data_dir)),
        Arc::new(DirImageStore::new(&cfg.media_dir)),
        Arc::new(ConfigAuth::new(
            &cfg.admin_email,
            &cfg.admin_password_sha256,
        )),
    );
    let mode = if args.profile {
        app_state::FormMode::Profile
    } else {
        app_state::FormMode::Projects
    };
    let state = app_state::AppState::new(portfolio, mode, cfg.wrap_width);

    run_tui(state)
}

fn run_tui(mut app: app_state::AppState) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut editor_handler = EditorEventHandler::default();

    let result = run_app(&mut terminal, &mut app, &mut editor_handler);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    } else if let Some(saved) = app.last_saved {
        let json = saved.to_json_pretty().map_err(io::Error::other)?;
        println!("{json}");
    }

    Ok(())
}

fn open_command_line(app: &mut app_state::AppState) {
    app.command_origin = app.current_view;
    app.current_view = app_state::View::Command;
    app.command_buffer.clear();
    app.message = None;
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut app_state::AppState,
    editor_handler: &mut EditorEventHandler,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            match app.current_view {
                app_state::View::Projects => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
                    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
                    KeyCode::Enter => app.open_selected_project(),
                    KeyCode::Char(':') => open_command_line(app),
                    _ => {}
                },
                app_state::View::Form => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        if app.close_form() == app_state::Flow::Quit {
                            return Ok(());
                        }
                    }
                    KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
                    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
                    KeyCode::Enter => app.enter_field_view(),
                    KeyCode::Char(':') => open_command_line(app),
                    _ => {}
                },
                app_state::View::Field => {
                    let normal = app
                        .editor_state
                        .as_ref()
                        .is_some_and(|state| state.mode == edtui::EditorMode::Normal);
                    match key.code {
                        KeyCode::Char(':') if normal => open_command_line(app),
                        KeyCode::Esc if normal => app.exit_field_view(false),
                        _ => {
                            if let Some(ref mut editor_state) = app.editor_state {
                                editor_handler.on_key_event(key, editor_state);
                            }
                        }
                    }
                }
                app_state::View::Command => match key.code {
                    KeyCode::Char(c) => {
                        app.command_buffer.push(c);
                    }
                    KeyCode::Backspace => {
                        app.command_buffer.pop();
                    }
                    KeyCode::Esc => {
                        app.current_view = app.command_origin;
                    }
                    KeyCode::Enter => {
                        let cmd = app.command_buffer.clone();
                        if app.execute_command(&cmd) == app_state::Flow::Quit {
                            return Ok(());
                        }
                    }
                    _ => {}
                },
            }
        }
    }
}
