//! The event loop.
//!
//! Terminal events, confirmation timeouts and background task results all
//! arrive as [`Msg`]s on one channel. Each message turns the current
//! [`AppState`] into the next one; effects that take time run on their own
//! thread and report back through the same channel.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use tally_router::{KeyRegistry, KeybindingConfig, Route, Router};
use tracing::{debug, info, warn};

use super::actions::apply_action;
use super::app::{AppState, Effect, Notice};
use super::commands::{FILTER_GROUP, filter_commands};
use super::keymap::key_name;
use super::ui;
use crate::ledger::{SavedFilter, save_filters};

pub enum Msg {
    Key(KeyEvent),
    Resize,
    /// The confirmation armed with this token timed out.
    ConfirmTimeout(u64),
    /// A background task finished; `Err` carries a message for the status bar.
    TaskDone(Result<String, String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Files the host reads and writes while running.
#[derive(Clone, Debug)]
pub struct Paths {
    pub keybindings: PathBuf,
    pub filters: PathBuf,
}

pub struct Host {
    router: Router<AppState, Effect>,
    /// Built-in keys; reloads apply the user's file on top of these.
    defaults: KeyRegistry,
    paths: Paths,
    tx: Sender<Msg>,
    /// Filter lists queued for the writer thread, oldest first.
    filter_writer: Sender<Vec<SavedFilter>>,
}

impl Host {
    pub fn new(router: Router<AppState, Effect>, defaults: KeyRegistry, paths: Paths, tx: Sender<Msg>) -> Self {
        let filter_writer = spawn_filter_writer(paths.filters.clone(), tx.clone());
        Self {
            router,
            defaults,
            paths,
            tx,
            filter_writer,
        }
    }

    pub fn router(&self) -> &Router<AppState, Effect> {
        &self.router
    }

    pub fn handle(&mut self, state: AppState, msg: Msg) -> (AppState, Flow) {
        match msg {
            Msg::Key(key) => match key_name(key) {
                Some(name) => self.handle_key(state, &name),
                None => (state, Flow::Continue),
            },
            Msg::Resize => (state, Flow::Continue),
            Msg::ConfirmTimeout(token) => {
                let mut state = state;
                if state.confirm.expire(token) {
                    state.info("Delete cancelled.");
                }
                (state, Flow::Continue)
            }
            Msg::TaskDone(result) => {
                let mut state = state;
                match result {
                    Ok(message) => debug!(message = %message, "background task finished"),
                    Err(message) => {
                        warn!(error = %message, "background task failed");
                        state.error(message);
                    }
                }
                (state, Flow::Continue)
            }
        }
    }

    pub fn handle_key(&mut self, state: AppState, key: &str) -> (AppState, Flow) {
        let dispatch = self.router.dispatch_key(state, key);
        let mut state = dispatch.outcome.state;
        if let Some(err) = dispatch.outcome.error {
            debug!(key, error = %err, "key produced an error");
            state.error(err.to_string());
        }
        if let Route::Unhandled {
            action: Some(action), ..
        } = dispatch.route
        {
            state = apply_action(state, action);
        }
        state.clamp_selection();
        match dispatch.outcome.effect {
            Some(effect) => self.apply_effect(state, effect),
            None => (state, Flow::Continue),
        }
    }

    fn apply_effect(&mut self, mut state: AppState, effect: Effect) -> (AppState, Flow) {
        match effect {
            Effect::Quit => return (state, Flow::Quit),
            Effect::ReloadKeybindings => state = self.reload_keybindings(state),
            Effect::FiltersChanged => {
                let replaced = self
                    .router
                    .commands_mut()
                    .replace_generated(FILTER_GROUP, filter_commands(&state.ledger.filters));
                debug!(count = replaced.len(), "rebuilt saved filter commands");
                if self.filter_writer.send(state.ledger.filters.clone()).is_err() {
                    warn!("filter writer stopped");
                    state.error("Could not save filters: writer stopped");
                }
            }
            Effect::ArmConfirm(ticket) => {
                let tx = self.tx.clone();
                thread::spawn(move || {
                    thread::sleep(ticket.after);
                    let _ = tx.send(Msg::ConfirmTimeout(ticket.token));
                });
            }
        }
        (state, Flow::Continue)
    }

    /// Re-read the keybinding file. A bad file is reported and the live
    /// keys stay as they are; the file itself is left for the user to fix.
    fn reload_keybindings(&mut self, mut state: AppState) -> AppState {
        let path = &self.paths.keybindings;
        let reloaded =
            KeybindingConfig::load(path).and_then(|config| self.router.reload_keybindings(&self.defaults, &config));
        match reloaded {
            Ok(()) => {
                info!(path = %path.display(), "keybindings reloaded");
                state.info("Keybindings reloaded");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "keybinding reload rejected");
                state.notice = Some(Notice {
                    title: "Keybindings not reloaded".to_string(),
                    lines: vec![
                        err.to_string(),
                        String::new(),
                        format!("File: {}", path.display()),
                        "The previous keybindings are still active.".to_string(),
                    ],
                });
            }
        }
        state
    }
}

/// Save filter lists one at a time, in the order they were queued, so the
/// file always ends up holding the newest list.
fn spawn_filter_writer(path: PathBuf, tx: Sender<Msg>) -> Sender<Vec<SavedFilter>> {
    let (queue, pending) = mpsc::channel::<Vec<SavedFilter>>();
    thread::spawn(move || {
        for filters in pending {
            let result = save_filters(&path, &filters)
                .map(|()| format!("Saved {} filters", filters.len()))
                .map_err(|e| format!("Could not save filters: {e}"));
            if tx.send(Msg::TaskDone(result)).is_err() {
                break;
            }
        }
    });
    queue
}

/// Forward terminal events to the loop until the receiver goes away.
pub fn spawn_event_reader(tx: Sender<Msg>) {
    thread::spawn(move || {
        loop {
            let msg = match event::read() {
                // Only key presses (Windows reports Press + Release)
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Msg::Key(key),
                Ok(Event::Resize(_, _)) => Msg::Resize,
                Ok(_) => continue,
                Err(err) => {
                    warn!(error = %err, "terminal event read failed");
                    break;
                }
            };
            if tx.send(msg).is_err() {
                break;
            }
        }
    });
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    host: &mut Host,
    mut state: AppState,
    rx: &Receiver<Msg>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, &state, host.router()))?;

        let Ok(msg) = rx.recv() else {
            return Ok(());
        };
        let (next, flow) = host.handle(state, msg);
        state = next;
        if flow == Flow::Quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::tui::app::{Pending, Tab};
    use crate::tui::build_router;
    use crate::tui::keymap::default_keys;
    use std::fs;
    use std::time::{Duration, Instant};

    fn temp_paths(name: &str) -> Paths {
        let dir = std::env::temp_dir().join(format!("tally_host_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("temp dir");
        Paths {
            keybindings: dir.join("keybindings.toml"),
            filters: dir.join("filters.toml"),
        }
    }

    fn host(name: &str) -> (Host, Receiver<Msg>, AppState) {
        let ledger = Ledger::demo();
        let router = build_router(default_keys(), &ledger.filters).expect("router");
        let (tx, rx) = mpsc::channel();
        let host = Host::new(router, default_keys(), temp_paths(name), tx);
        (host, rx, AppState::new(ledger))
    }

    fn keys(host: &mut Host, mut state: AppState, keys: &[&str]) -> (AppState, Flow) {
        let mut flow = Flow::Continue;
        for key in keys {
            (state, flow) = host.handle_key(state, key);
        }
        (state, flow)
    }

    #[test]
    fn quit_from_any_tab() {
        let (mut host, _rx, state) = host("quit");
        let (state, flow) = keys(&mut host, state, &["tab"]);
        assert_eq!(state.tab, Tab::Transactions);
        assert_eq!(flow, Flow::Continue);
        let (_, flow) = keys(&mut host, state, &["q"]);
        assert_eq!(flow, Flow::Quit);
    }

    #[test]
    fn q_in_detail_closes_instead_of_quitting() {
        let (mut host, _rx, state) = host("detail_q");
        let (state, _) = keys(&mut host, state, &["tab", "enter"]);
        assert_eq!(state.detail, Some(1));
        let (state, flow) = keys(&mut host, state, &["q"]);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(state.detail, None);
    }

    #[test]
    fn disabled_command_reports_reason() {
        let (mut host, _rx, state) = host("budget");
        let (state, _) = keys(&mut host, state, &[":"]);
        let mut state = state;
        for ch in "nav:budget".chars() {
            state = host.handle_key(state, &ch.to_string()).0;
        }
        let (state, _) = keys(&mut host, state, &["enter"]);
        assert_eq!(state.tab, Tab::Dashboard);
        let status = state.status.expect("status");
        assert!(status.error);
        assert_eq!(status.text, "Budget tab is not available yet.");
    }

    #[test]
    fn command_line_runs_commands_scoped_to_the_tab_underneath() {
        let (mut host, _rx, state) = host("cmdline_scope");
        let (mut state, _) = keys(&mut host, state, &["tab", ":"]);
        for ch in "txn:delete".chars() {
            state = host.handle_key(state, &ch.to_string()).0;
        }
        let (state, _) = keys(&mut host, state, &["enter"]);
        assert!(state.confirm.is_armed_for(&Pending::DeleteTransaction, "1"));
        assert!(state.status.as_ref().is_some_and(|s| !s.error));
    }

    #[test]
    fn delete_times_out_through_the_queue() {
        let (mut host, rx, state) = host("timeout");
        let (state, _) = keys(&mut host, state, &["tab", "d"]);
        assert!(state.confirm.is_armed_for(&Pending::DeleteTransaction, "1"));

        let msg = rx.recv_timeout(Duration::from_secs(10)).expect("timeout message");
        let (state, _) = host.handle(state, msg);
        assert!(!state.confirm.is_armed());
        assert_eq!(state.status.map(|s| s.text).as_deref(), Some("Delete cancelled."));
    }

    #[test]
    fn stale_timeout_is_ignored() {
        let (mut host, _rx, state) = host("stale");
        let (mut state, _) = keys(&mut host, state, &["tab"]);
        state.confirm.press(Pending::DeleteTransaction, "1", Instant::now());
        state.confirm.reset();
        let (state, _) = keys(&mut host, state, &["d"]);
        let (state, _) = host.handle(state, Msg::ConfirmTimeout(1));
        assert!(state.confirm.is_armed());
    }

    #[test]
    fn second_press_deletes() {
        let (mut host, _rx, state) = host("delete");
        let before = state.ledger.transactions.len();
        let (state, _) = keys(&mut host, state, &["tab", "d", "d"]);
        assert_eq!(state.ledger.transactions.len(), before - 1);
        assert!(state.ledger.get(1).is_none());
    }

    #[test]
    fn bad_reload_keeps_live_keys() {
        let (mut host, _rx, state) = host("reload_bad");
        fs::write(
            &host.paths.keybindings,
            "version = 2\n[scopes.transactions]\ndown = [\"/\"]\n",
        )
        .expect("write");
        let (state, _) = keys(&mut host, state, &["tab", "tab", "tab", "n", "r"]);
        assert_eq!(state.tab_scope(), "settings.keybindings");
        let notice = state.notice.as_ref().expect("notice");
        assert!(notice.lines[0].contains("bound to more than one action"));
        assert_eq!(
            host.router().keys().lookup("j", "transactions").map(|b| b.action),
            Some(tally_router::Action::Down)
        );
        // The file is left alone for the user to fix.
        assert!(fs::read_to_string(&host.paths.keybindings).expect("read").contains("\"/\""));

        let (state, _) = keys(&mut host, state, &["enter"]);
        assert!(state.notice.is_none());
    }

    #[test]
    fn esc_on_transactions_backs_out_without_a_filter() {
        let (mut host, _rx, state) = host("esc_back");
        let (state, _) = keys(&mut host, state, &["tab", "d"]);
        assert!(state.confirm.is_armed());
        let (state, _) = keys(&mut host, state, &["esc"]);
        assert!(!state.confirm.is_armed());
        assert!(state.status.is_none());
    }

    #[test]
    fn esc_on_transactions_clears_an_active_filter() {
        let (mut host, _rx, state) = host("esc_filter");
        let (state, _) = keys(&mut host, state, &["tab", "/", "b", "u", "s", "enter"]);
        assert_eq!(state.active_filter.as_deref(), Some("bus"));
        let (state, _) = keys(&mut host, state, &["esc"]);
        assert_eq!(state.active_filter, None);
        assert!(state.status.as_ref().is_some_and(|s| !s.error));
    }

    #[test]
    fn filter_saves_land_in_order() {
        let (mut host, rx, mut state) = host("save_order");
        state.ledger.filters.truncate(1);
        let (mut state, _) = host.apply_effect(state, Effect::FiltersChanged);
        state.ledger.filters.push(SavedFilter {
            key: "late".to_string(),
            query: "payee:late".to_string(),
        });
        let (mut state, _) = host.apply_effect(state, Effect::FiltersChanged);
        for _ in 0..2 {
            let msg = rx.recv_timeout(Duration::from_secs(10)).expect("save result");
            state = host.handle(state, msg).0;
        }
        assert!(state.status.as_ref().is_none_or(|s| !s.error));
        let saved = fs::read_to_string(&host.paths.filters).expect("saved");
        assert!(saved.contains("payee:late"));
    }

    #[test]
    fn good_reload_rebinds() {
        let (mut host, _rx, state) = host("reload_good");
        fs::write(
            &host.paths.keybindings,
            "version = 2\n[scopes.global]\nquit = [\"ctrl+q\"]\n",
        )
        .expect("write");
        let (state, _) = keys(&mut host, state, &["tab", "tab", "tab", "n", "r"]);
        assert_eq!(state.status.as_ref().map(|s| s.text.as_str()), Some("Keybindings reloaded"));
        let (state, flow) = keys(&mut host, state, &["q"]);
        assert_eq!(flow, Flow::Continue);
        let (_, flow) = keys(&mut host, state, &["ctrl+q"]);
        assert_eq!(flow, Flow::Quit);
    }

    #[test]
    fn saved_filter_becomes_a_command_and_is_persisted() {
        let (mut host, rx, state) = host("filters");
        let mut steps = vec!["tab", "/"];
        steps.extend(["b", "u", "s", "enter", "s", "b", "u", "s", "enter"]);
        let (state, _) = keys(&mut host, state, &steps);
        assert!(host.router().commands().get("filter:apply:bus").is_some());

        let msg = rx.recv_timeout(Duration::from_secs(10)).expect("save result");
        let (state, _) = host.handle(state, msg);
        assert!(state.status.as_ref().is_none_or(|s| !s.error));
        let saved = fs::read_to_string(&host.paths.filters).expect("saved");
        assert!(saved.contains("bus"));
    }
}
