//! The dispatcher.
//!
//! A key goes to the foreground overlay if there is one. Otherwise it is
//! looked up in the context scope; a binding carrying a command id runs that
//! command, anything else is handed back to the host as [`Route::Unhandled`]
//! for ordinary tab handling.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::action::Action;
use crate::commands::{CommandMatch, CommandRegistry};
use crate::contract::{ContractTable, FooterHint};
use crate::error::ConfigError;
use crate::keys::{KeyRegistry, KeybindingConfig, normalize_key};
use crate::outcome::Outcome;
use crate::overlay::{HandlerCtx, OverlayTable, ScopePurpose};
use crate::text::{KeyInput, TextInputTable, classify};

type TabScopeFn<S> = Arc<dyn Fn(&S) -> String>;

/// Where a key ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Overlay(String),
    Command(String),
    /// No overlay and no command binding. `action` is the binding's action
    /// in `scope`, if any.
    Unhandled { action: Option<Action>, scope: String },
}

#[derive(Debug)]
pub struct Dispatch<S, E> {
    pub outcome: Outcome<S, E>,
    pub route: Route,
}

pub struct Router<S, E> {
    keys: KeyRegistry,
    commands: CommandRegistry<S, E>,
    contracts: ContractTable,
    text_inputs: TextInputTable,
    overlays: OverlayTable<S, E>,
    tab_scope: TabScopeFn<S>,
}

impl<S, E> fmt::Debug for Router<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("scopes", &self.keys.scopes())
            .field("commands", &self.commands.len())
            .field("overlays", &self.overlays)
            .finish_non_exhaustive()
    }
}

impl<S, E> Router<S, E> {
    /// `tab_scope` resolves the scope of the base view (active tab plus any
    /// sub-state it owns). It is only consulted when no overlay applies.
    pub fn new(
        keys: KeyRegistry,
        commands: CommandRegistry<S, E>,
        contracts: ContractTable,
        text_inputs: TextInputTable,
        overlays: OverlayTable<S, E>,
        tab_scope: impl Fn(&S) -> String + 'static,
    ) -> Self {
        Self {
            keys,
            commands,
            contracts,
            text_inputs,
            overlays,
            tab_scope: Arc::new(tab_scope),
        }
    }

    pub fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    pub fn commands(&self) -> &CommandRegistry<S, E> {
        &self.commands
    }

    /// For rebuilding generated command groups.
    pub fn commands_mut(&mut self) -> &mut CommandRegistry<S, E> {
        &mut self.commands
    }

    pub fn contracts(&self) -> &ContractTable {
        &self.contracts
    }

    pub fn overlays(&self) -> &OverlayTable<S, E> {
        &self.overlays
    }

    pub fn tab_scope(&self, state: &S) -> String {
        (self.tab_scope)(state)
    }

    /// Scope commands are searched and run in.
    pub fn context_scope(&self, state: &S) -> String {
        self.overlays
            .active_scope(state, ScopePurpose::CommandContext)
            .unwrap_or_else(|| self.tab_scope(state))
    }

    pub fn footer_scope(&self, state: &S) -> String {
        self.overlays
            .active_scope(state, ScopePurpose::Footer)
            .unwrap_or_else(|| self.tab_scope(state))
    }

    pub fn footer(&self, state: &S) -> Vec<FooterHint> {
        self.contracts.render_footer(&self.footer_scope(state), &self.keys)
    }

    /// Classify a key in the base view's scope, for tab-level handling.
    pub fn classify(&self, key: &str, state: &S) -> KeyInput {
        classify(&normalize_key(key), &self.tab_scope(state), &self.keys, &self.text_inputs)
    }

    pub fn search(&self, query: &str, state: &S, last_used: Option<&str>) -> Vec<CommandMatch<'_, S, E>> {
        let scope = self.context_scope(state);
        self.commands.search(query, &scope, state, last_used)
    }

    pub fn execute(&self, id: &str, state: S) -> Outcome<S, E> {
        let scope = self.context_scope(&state);
        self.commands.execute_by_id(id, &scope, state)
    }

    pub fn dispatch_key(&self, state: S, key: &str) -> Dispatch<S, E> {
        let key = normalize_key(key);
        let context = self.context_scope(&state);

        let ctx = HandlerCtx::new(&key, &context, &self.keys, &self.commands, &self.text_inputs);
        let state = match self.overlays.dispatch(state, ctx) {
            Ok((name, outcome)) => {
                trace!(key = %key, overlay = name, "routed to overlay");
                return Dispatch {
                    outcome,
                    route: Route::Overlay(name.to_string()),
                };
            }
            Err(state) => state,
        };

        let binding = self.keys.lookup(&key, &context);
        if let Some(id) = binding.and_then(|b| b.command_id.as_deref()) {
            debug!(key = %key, scope = %context, command = id, "routed to command");
            return Dispatch {
                outcome: self.commands.execute_by_id(id, &context, state),
                route: Route::Command(id.to_string()),
            };
        }

        let action = binding.map(|b| b.action);
        trace!(key = %key, scope = %context, action = ?action, "unhandled by router");
        Dispatch {
            outcome: Outcome::ok(state),
            route: Route::Unhandled {
                action,
                scope: context,
            },
        }
    }

    /// Swap in `defaults` with `config` applied. On error the live table is
    /// untouched.
    pub fn reload_keybindings(
        &mut self,
        defaults: &KeyRegistry,
        config: &KeybindingConfig,
    ) -> Result<(), ConfigError> {
        let mut fresh = defaults.clone();
        fresh.apply_config(config)?;
        self.keys = fresh;
        info!("reloaded keybindings");
        Ok(())
    }

    /// Replace the key table outright, e.g. after the loader regenerated it.
    pub fn set_keys(&mut self, keys: KeyRegistry) {
        self.keys = keys;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Availability, Command};
    use crate::contract::{DisplayKind, Hint, Intent, InteractionContract};
    use crate::keys::{Binding, KeyOverride};
    use crate::overlay::OverlayEntry;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct State {
        tab: &'static str,
        palette: bool,
        detail: bool,
        searches: u32,
    }

    fn router() -> Router<State, &'static str> {
        let mut keys = KeyRegistry::new();
        keys.register(Binding::new("detail", Action::Cancel, &["esc"], "close"));
        keys.register(Binding::new("transactions", Action::Search, &["/"], "search").command("filter:open"));
        keys.register(Binding::new("transactions", Action::Down, &["j"], "down"));
        keys.register(Binding::global(Action::Quit, &["q"], "quit").command("app:quit"));
        keys.register(Binding::global(Action::Palette, &["ctrl+p"], "palette"));

        let mut commands = CommandRegistry::new();
        commands
            .register(
                Command::new("filter:open", "Search transactions", |mut s: State| {
                    s.searches += 1;
                    Outcome::ok(s)
                })
                .scopes(&["transactions"]),
            )
            .expect("register");
        commands
            .register(Command::new("app:quit", "Quit", |s| Outcome::with_effect(s, "quit")).global())
            .expect("register");
        commands
            .register(
                Command::new("nav:budget", "Go to budget", |s| Outcome::ok(s))
                    .global()
                    .enabled_when(|_| Availability::Disabled("Budget tab is not available yet.".into())),
            )
            .expect("register");

        let mut contracts = ContractTable::new();
        contracts
            .insert(InteractionContract::new(
                "transactions",
                DisplayKind::List,
                vec![Hint::new(Intent::Move, "down"), Hint::new(Intent::Select, "open")],
            ))
            .expect("contract");
        contracts
            .insert(InteractionContract::new(
                "detail",
                DisplayKind::Document,
                vec![Hint::new(Intent::Cancel, "close")],
            ))
            .expect("contract");

        let overlays = OverlayTable::new(vec![
            OverlayEntry::new("palette", "palette", |s: &State| s.palette, |mut s: State, _ctx: &HandlerCtx<'_, State, &'static str>| {
                s.palette = false;
                Outcome::ok(s)
            })
            .without_command_context(),
            OverlayEntry::new("detail", "detail", |s: &State| s.detail, |mut s: State, ctx: &HandlerCtx<'_, State, &'static str>| {
                if ctx.action() == Some(Action::Cancel) {
                    s.detail = false;
                }
                Outcome::ok(s)
            }),
        ])
        .expect("overlays");

        Router::new(keys, commands, contracts, TextInputTable::new(), overlays, |s: &State| {
            s.tab.to_string()
        })
    }

    fn on(tab: &'static str) -> State {
        State {
            tab,
            ..State::default()
        }
    }

    #[test]
    fn command_binding_runs_command_in_scope() {
        let router = router();
        let dispatch = router.dispatch_key(on("transactions"), "/");
        assert_eq!(dispatch.route, Route::Command("filter:open".to_string()));
        assert_eq!(dispatch.outcome.state.searches, 1);
    }

    #[test]
    fn global_command_binding_falls_back() {
        let router = router();
        let dispatch = router.dispatch_key(on("dashboard"), "q");
        assert_eq!(dispatch.route, Route::Command("app:quit".to_string()));
        assert_eq!(dispatch.outcome.effect, Some("quit"));
    }

    #[test]
    fn plain_bindings_are_unhandled() {
        let router = router();
        let dispatch = router.dispatch_key(on("transactions"), "j");
        assert_eq!(
            dispatch.route,
            Route::Unhandled {
                action: Some(Action::Down),
                scope: "transactions".to_string()
            }
        );
        let dispatch = router.dispatch_key(on("dashboard"), "/");
        assert_eq!(
            dispatch.route,
            Route::Unhandled {
                action: None,
                scope: "dashboard".to_string()
            }
        );
    }

    #[test]
    fn overlay_consumes_key_before_commands() {
        let router = router();
        let state = State {
            detail: true,
            ..on("transactions")
        };
        let dispatch = router.dispatch_key(state, "q");
        assert_eq!(dispatch.route, Route::Overlay("detail".to_string()));
        assert!(dispatch.outcome.effect.is_none());
        assert!(dispatch.outcome.state.detail);
    }

    #[test]
    fn scopes_follow_the_table() {
        let router = router();
        let state = State {
            palette: true,
            detail: true,
            ..on("transactions")
        };
        assert_eq!(router.footer_scope(&state), "palette");
        assert_eq!(router.context_scope(&state), "detail");
        let base = on("transactions");
        assert_eq!(router.footer_scope(&base), "transactions");
        assert_eq!(router.context_scope(&base), "transactions");
    }

    #[test]
    fn footer_uses_resolved_scope() {
        let router = router();
        let footer = router.footer(&on("transactions"));
        assert_eq!(footer, vec![FooterHint {
            key: "j".to_string(),
            label: "down".to_string()
        }]);
        let detail = State {
            detail: true,
            ..on("transactions")
        };
        assert_eq!(router.footer(&detail)[0].key, "Esc");
    }

    #[test]
    fn search_uses_context_scope() {
        let router = router();
        let ids: Vec<&str> = router
            .search("", &on("transactions"), None)
            .iter()
            .map(|m| m.command.id.as_str())
            .collect();
        assert_eq!(ids, vec!["app:quit", "filter:open", "nav:budget"]);
        let ids: Vec<&str> = router
            .search("", &on("dashboard"), None)
            .iter()
            .map(|m| m.command.id.as_str())
            .collect();
        assert_eq!(ids, vec!["app:quit", "nav:budget"]);
    }

    #[test]
    fn disabled_command_leaves_state() {
        let router = router();
        let outcome = router.execute("nav:budget", on("dashboard"));
        assert_eq!(outcome.state.tab, "dashboard");
        assert_eq!(
            outcome.error.map(|e| e.to_string()).as_deref(),
            Some("Budget tab is not available yet.")
        );
    }

    #[test]
    fn failed_reload_keeps_live_keys() {
        let mut router = router();
        let defaults = router.keys().clone();
        let bad = KeybindingConfig::from_overrides(vec![KeyOverride {
            scope: "transactions".to_string(),
            action: "down".to_string(),
            keys: vec!["/".to_string()],
        }]);
        assert!(router.reload_keybindings(&defaults, &bad).is_err());
        assert_eq!(router.keys().lookup("j", "transactions").map(|b| b.action), Some(Action::Down));

        let good = KeybindingConfig::from_overrides(vec![KeyOverride {
            scope: "transactions".to_string(),
            action: "down".to_string(),
            keys: vec!["n".to_string()],
        }]);
        router.reload_keybindings(&defaults, &good).expect("reload");
        assert_eq!(router.keys().lookup("n", "transactions").map(|b| b.action), Some(Action::Down));
        assert!(router.keys().lookup("j", "transactions").is_none());
    }
}
