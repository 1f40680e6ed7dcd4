//! Overlay precedence table.
//!
//! Entries are ordered most-blocking first. Guards are plain predicates on
//! the state snapshot and may be true at the same time; the earliest true
//! entry is the foreground overlay. Dispatch, footer rendering and command
//! context all ask this table, so there is one answer to "which modal is
//! open".

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::commands::CommandRegistry;
use crate::error::TableError;
use crate::keys::KeyRegistry;
use crate::outcome::Outcome;
use crate::text::{KeyInput, TextInputTable, classify};

type GuardFn<S> = Arc<dyn Fn(&S) -> bool>;
type ScopeFn<S> = Arc<dyn Fn(&S) -> String>;
type HandlerFn<S, E> = Arc<dyn Fn(S, &HandlerCtx<'_, S, E>) -> Outcome<S, E>>;

/// Why a caller wants the active scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopePurpose {
    Footer,
    /// Scope commands are searched and executed in.
    CommandContext,
}

/// What an overlay handler gets besides the state.
pub struct HandlerCtx<'a, S, E> {
    /// Normalized key name.
    pub key: &'a str,
    /// Scope of the overlay handling the key.
    pub scope: String,
    /// Scope commands run in (the palette runs commands on behalf of the
    /// view underneath it).
    pub context: &'a str,
    pub keys: &'a KeyRegistry,
    pub commands: &'a CommandRegistry<S, E>,
    pub text_inputs: &'a TextInputTable,
}

impl<'a, S, E> HandlerCtx<'a, S, E> {
    pub fn new(
        key: &'a str,
        context: &'a str,
        keys: &'a KeyRegistry,
        commands: &'a CommandRegistry<S, E>,
        text_inputs: &'a TextInputTable,
    ) -> Self {
        Self {
            key,
            scope: String::new(),
            context,
            keys,
            commands,
            text_inputs,
        }
    }

    /// Action bound to the key in the overlay's scope (or globally).
    pub fn action(&self) -> Option<Action> {
        self.keys.lookup(self.key, &self.scope).map(|b| b.action)
    }

    pub fn classify(&self) -> KeyInput {
        classify(self.key, &self.scope, self.keys, self.text_inputs)
    }

    /// Run a command in the context scope.
    pub fn execute(&self, id: &str, state: S) -> Outcome<S, E> {
        self.commands.execute_by_id(id, self.context, state)
    }
}

pub struct OverlayEntry<S, E> {
    pub name: String,
    guard: GuardFn<S>,
    scope: ScopeFn<S>,
    handler: HandlerFn<S, E>,
    pub in_footer: bool,
    pub in_command_context: bool,
}

impl<S, E> Clone for OverlayEntry<S, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            guard: Arc::clone(&self.guard),
            scope: Arc::clone(&self.scope),
            handler: Arc::clone(&self.handler),
            in_footer: self.in_footer,
            in_command_context: self.in_command_context,
        }
    }
}

impl<S, E> fmt::Debug for OverlayEntry<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayEntry")
            .field("name", &self.name)
            .field("in_footer", &self.in_footer)
            .field("in_command_context", &self.in_command_context)
            .finish_non_exhaustive()
    }
}

impl<S: 'static, E: 'static> OverlayEntry<S, E> {
    /// An entry with a fixed scope, counted for both footer and command
    /// context.
    pub fn new(
        name: impl Into<String>,
        scope: impl Into<String>,
        guard: impl Fn(&S) -> bool + 'static,
        handler: impl Fn(S, &HandlerCtx<'_, S, E>) -> Outcome<S, E> + 'static,
    ) -> Self {
        let scope = scope.into();
        Self {
            name: name.into(),
            guard: Arc::new(guard),
            scope: Arc::new(move |_| scope.clone()),
            handler: Arc::new(handler),
            in_footer: true,
            in_command_context: true,
        }
    }

    /// Derive the scope from state, e.g. a notice whose scope depends on
    /// what it reports.
    pub fn scope_with(mut self, scope: impl Fn(&S) -> String + 'static) -> Self {
        self.scope = Arc::new(scope);
        self
    }

    pub fn without_footer(mut self) -> Self {
        self.in_footer = false;
        self
    }

    pub fn without_command_context(mut self) -> Self {
        self.in_command_context = false;
        self
    }
}

impl<S, E> OverlayEntry<S, E> {
    pub fn is_active(&self, state: &S) -> bool {
        (self.guard)(state)
    }

    pub fn scope(&self, state: &S) -> String {
        (self.scope)(state)
    }

    fn serves(&self, purpose: ScopePurpose) -> bool {
        match purpose {
            ScopePurpose::Footer => self.in_footer,
            ScopePurpose::CommandContext => self.in_command_context,
        }
    }
}

pub struct OverlayTable<S, E> {
    entries: Vec<OverlayEntry<S, E>>,
}

impl<S, E> Clone for OverlayTable<S, E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<S, E> fmt::Debug for OverlayTable<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<S, E> OverlayTable<S, E> {
    /// Build the table; `entries` are in priority order.
    pub fn new(entries: Vec<OverlayEntry<S, E>>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(TableError::DuplicateOverlay(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[OverlayEntry<S, E>] {
        &self.entries
    }

    fn foreground(&self, state: &S) -> Option<&OverlayEntry<S, E>> {
        self.entries.iter().find(|entry| entry.is_active(state))
    }

    /// Name of the foreground overlay.
    pub fn active(&self, state: &S) -> Option<&str> {
        self.foreground(state).map(|entry| entry.name.as_str())
    }

    /// Scope of the first active entry serving `purpose`.
    pub fn active_scope(&self, state: &S, purpose: ScopePurpose) -> Option<String> {
        self.entries
            .iter()
            .filter(|entry| entry.serves(purpose))
            .find(|entry| entry.is_active(state))
            .map(|entry| entry.scope(state))
    }

    /// Hand the key to the foreground overlay. The state comes back
    /// untouched in `Err` when no overlay is active.
    pub fn dispatch<'t>(
        &'t self,
        state: S,
        mut ctx: HandlerCtx<'_, S, E>,
    ) -> Result<(&'t str, Outcome<S, E>), S> {
        let Some(entry) = self.foreground(&state) else {
            return Err(state);
        };
        ctx.scope = entry.scope(&state);
        let outcome = (entry.handler)(state, &ctx);
        Ok((entry.name.as_str(), outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Binding;

    #[derive(Clone, Debug, Default)]
    struct State {
        notice: bool,
        palette: bool,
        detail: bool,
        handled_by: Vec<&'static str>,
    }

    fn mark(name: &'static str) -> impl Fn(State, &HandlerCtx<'_, State, ()>) -> Outcome<State, ()> {
        move |mut state, _ctx| {
            state.handled_by.push(name);
            Outcome::ok(state)
        }
    }

    fn table() -> OverlayTable<State, ()> {
        OverlayTable::new(vec![
            OverlayEntry::new("notice", "notice", |s: &State| s.notice, mark("notice")),
            OverlayEntry::new("palette", "palette", |s: &State| s.palette, mark("palette")).without_command_context(),
            OverlayEntry::new("detail", "detail", |s: &State| s.detail, mark("detail")),
        ])
        .expect("table")
    }

    fn dispatch(table: &OverlayTable<State, ()>, state: State) -> Result<(String, State), State> {
        let keys = KeyRegistry::new();
        let commands = CommandRegistry::new();
        let text = TextInputTable::new();
        let ctx = HandlerCtx::new("enter", "dashboard", &keys, &commands, &text);
        table
            .dispatch(state, ctx)
            .map(|(name, outcome)| (name.to_string(), outcome.state))
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = OverlayTable::<State, ()>::new(vec![
            OverlayEntry::new("help", "help", |_: &State| true, mark("a")),
            OverlayEntry::new("help", "help", |_: &State| true, mark("b")),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateOverlay("help".to_string()));
    }

    #[test]
    fn earliest_true_guard_wins() {
        let table = table();
        let state = State {
            notice: true,
            palette: true,
            detail: true,
            ..State::default()
        };
        let (name, state) = dispatch(&table, state).expect("handled");
        assert_eq!(name, "notice");
        assert_eq!(state.handled_by, vec!["notice"]);
        assert_eq!(table.active_scope(&state, ScopePurpose::Footer).as_deref(), Some("notice"));
    }

    #[test]
    fn no_active_overlay_returns_state() {
        let table = table();
        let state = dispatch(&table, State::default()).expect_err("nothing active");
        assert!(state.handled_by.is_empty());
        assert_eq!(table.active(&state), None);
    }

    #[test]
    fn palette_is_skipped_for_command_context() {
        let table = table();
        let state = State {
            palette: true,
            detail: true,
            ..State::default()
        };
        assert_eq!(table.active(&state), Some("palette"));
        assert_eq!(table.active_scope(&state, ScopePurpose::Footer).as_deref(), Some("palette"));
        assert_eq!(
            table.active_scope(&state, ScopePurpose::CommandContext).as_deref(),
            Some("detail")
        );
    }

    #[test]
    fn handler_sees_its_own_scope() {
        let mut keys = KeyRegistry::new();
        keys.register(Binding::new("detail", Action::Cancel, &["esc"], "close"));
        let commands = CommandRegistry::new();
        let text = TextInputTable::new();
        let table = OverlayTable::new(vec![OverlayEntry::new(
            "detail",
            "detail",
            |s: &State| s.detail,
            |mut state: State, ctx: &HandlerCtx<'_, State, ()>| {
                if ctx.action() == Some(Action::Cancel) {
                    state.detail = false;
                }
                Outcome::ok(state)
            },
        )])
        .expect("table");
        let state = State {
            detail: true,
            ..State::default()
        };
        let ctx = HandlerCtx::new("esc", "transactions", &keys, &commands, &text);
        let (_, outcome) = table.dispatch(state, ctx).expect("handled");
        assert!(!outcome.state.detail);
    }
}
