//! Terminal front end.
//!
//! - `app`: the state value every message transforms.
//! - `commands`, `contracts`, `overlays`: the routing tables handed to the
//!   router.
//! - `input`: the message loop; `actions`: tab-level gestures.
//! - `ui`, `help`: rendering.

mod actions;
mod app;
mod commands;
mod contracts;
mod help;
mod input;
pub mod keymap;
mod overlays;
mod ui;

use std::io;
use std::sync::mpsc;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tally_router::{KeyRegistry, LoadReport, Router};
use tracing::info;

pub use app::{AppState, Effect};
use app::Notice;
pub use input::Paths;
use input::{Host, run_app, spawn_event_reader};

use crate::error::Result;
use crate::ledger::{Ledger, SavedFilter, load_filters};

/// Assemble the router from `keys` and the built-in tables.
pub fn build_router(keys: KeyRegistry, filters: &[SavedFilter]) -> Result<Router<AppState, Effect>> {
    Ok(Router::new(
        keys,
        commands::build_commands(filters)?,
        contracts::build_contracts()?,
        contracts::build_text_inputs(),
        overlays::build_overlays()?,
        |state: &AppState| state.tab_scope(),
    ))
}

/// Tell the user what loading the keybinding file did.
fn report_keybindings(state: &mut AppState, report: LoadReport, paths: &Paths) {
    match report {
        LoadReport::Loaded => {}
        LoadReport::Created => {
            state.info(format!("Wrote default keybindings to {}", paths.keybindings.display()));
        }
        LoadReport::Migrated => state.info("Keybindings file upgraded to the current format"),
        LoadReport::Regenerated { reason, backup } => {
            let moved = match backup {
                Some(backup) => format!("Your file was moved to {}.", backup.display()),
                None => "Your file could not be moved aside and was overwritten.".to_string(),
            };
            state.notice = Some(Notice {
                title: "Keybindings reset to defaults".to_string(),
                lines: vec![
                    reason,
                    String::new(),
                    moved,
                    format!("A fresh template was written to {}.", paths.keybindings.display()),
                ],
            });
        }
    }
}

/// Load keybindings and saved filters, then run until the user quits.
pub fn run(paths: Paths) -> anyhow::Result<()> {
    let defaults = keymap::default_keys();
    let (keys, report) = keymap::load(&paths.keybindings)?;

    let mut ledger = Ledger::demo();
    if let Some(filters) = load_filters(&paths.filters)? {
        ledger.filters = filters;
    }
    let router = build_router(keys, &ledger.filters)?;

    let mut state = AppState::new(ledger);
    state.keybindings_path = paths.keybindings.display().to_string();
    report_keybindings(&mut state, report, &paths);

    let (tx, rx) = mpsc::channel();
    let mut host = Host::new(router, defaults, paths, tx.clone());
    spawn_event_reader(tx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(err) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            return Err(err.into());
        }
    };

    info!("terminal ready");
    let result = run_app(&mut terminal, &mut host, state, &rx);

    // Cleanup terminal
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn paths() -> Paths {
        Paths {
            keybindings: PathBuf::from("/tmp/tally/keybindings.toml"),
            filters: PathBuf::from("/tmp/tally/filters.toml"),
        }
    }

    #[test]
    fn regenerated_file_raises_a_notice() {
        let mut state = AppState::new(Ledger::demo());
        let report = LoadReport::Regenerated {
            reason: "Unknown scope 'nope'".to_string(),
            backup: Some(PathBuf::from("/tmp/tally/keybindings.toml.bak")),
        };
        report_keybindings(&mut state, report, &paths());
        let notice = state.notice.expect("notice");
        assert_eq!(notice.lines[0], "Unknown scope 'nope'");
        assert!(notice.lines[2].contains("keybindings.toml.bak"));
    }

    #[test]
    fn created_file_is_a_status_message() {
        let mut state = AppState::new(Ledger::demo());
        report_keybindings(&mut state, LoadReport::Created, &paths());
        assert!(state.notice.is_none());
        assert!(state.status.expect("status").text.contains("keybindings.toml"));
    }

    #[test]
    fn router_tables_are_consistent() {
        let ledger = Ledger::demo();
        let router = build_router(keymap::default_keys(), &ledger.filters).expect("router");
        let state = AppState::new(ledger);
        assert_eq!(router.footer_scope(&state), "dashboard");
        assert!(router.commands().get("filter:apply:groceries").is_some());
    }
}
