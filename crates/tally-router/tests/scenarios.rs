//! End-to-end routing scenarios against small, isolated tables.

use std::cell::Cell;
use std::rc::Rc;

use tally_router::{
    Action, Availability, Binding, Command, CommandError, CommandRegistry, ContractTable,
    DisplayKind, HandlerCtx, Hint, Intent, InteractionContract, KeyOverride, KeyRegistry,
    KeybindingConfig, Outcome, OverlayEntry, OverlayTable, Route, Router, ScopePurpose,
    TextInputTable, generated_id,
};

#[derive(Clone, Debug, Default, PartialEq)]
struct State {
    tab: &'static str,
    applied: Option<String>,
    overlays: [bool; 3],
    handled_by: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq)]
struct SavedFilter {
    key: String,
    query: String,
}

fn global_fallback_keys() -> KeyRegistry {
    let mut keys = KeyRegistry::new();
    keys.register(Binding::new("transactions", Action::Search, &["/"], "search").command("filter:open"));
    keys.register(Binding::global(Action::Quit, &["q"], "quit"));
    keys.register(Binding::global(Action::NextTab, &["tab"], "next tab"));
    keys
}

fn filter_commands(filters: &[SavedFilter]) -> Vec<Command<State, ()>> {
    filters
        .iter()
        .map(|filter| {
            let snapshot = filter.clone();
            Command::new(
                generated_id("filter:apply", &filter.key),
                format!("Apply filter: {}", filter.key),
                move |mut state: State| {
                    state.applied = Some(snapshot.query.clone());
                    Outcome::ok(state)
                },
            )
            .scopes(&["transactions"])
        })
        .collect()
}

#[test]
fn lookup_falls_back_to_global() {
    let keys = global_fallback_keys();
    assert_eq!(keys.lookup("/", "transactions").map(|b| b.action), Some(Action::Search));
    assert_eq!(
        keys.lookup("/", "transactions").and_then(|b| b.command_id.as_deref()),
        Some("filter:open")
    );
    assert!(keys.lookup("/", "dashboard").is_none());
    assert_eq!(keys.lookup("q", "transactions").map(|b| b.action), Some(Action::Quit));
    assert_eq!(keys.lookup("tab", "rules").map(|b| b.action), Some(Action::NextTab));
}

#[test]
fn later_overlapping_binding_does_not_replace_first() {
    let mut keys = global_fallback_keys();
    let result = keys.register(Binding::new("transactions", Action::Delete, &["d", "/"], "delete"));
    assert_eq!(result, tally_router::Registration::Skipped { key: "/".to_string() });
    assert_eq!(keys.lookup("/", "transactions").map(|b| b.action), Some(Action::Search));
    assert!(keys.lookup("d", "transactions").is_none());
}

#[test]
fn duplicate_override_entry_is_rejected_atomically() {
    let mut keys = global_fallback_keys();
    let config = KeybindingConfig::from_overrides(vec![
        KeyOverride {
            scope: "global".to_string(),
            action: "quit".to_string(),
            keys: vec!["x".to_string()],
        },
        KeyOverride {
            scope: "global".to_string(),
            action: "exit".to_string(),
            keys: vec!["z".to_string()],
        },
    ]);
    let err = keys.apply_config(&config).unwrap_err();
    assert!(err.to_string().contains("quit"));
    assert_eq!(keys.lookup("q", "transactions").map(|b| b.action), Some(Action::Quit));
    assert!(keys.lookup("x", "transactions").is_none());
}

#[test]
fn disabled_budget_navigation_explains_itself() {
    let mut commands: CommandRegistry<State, ()> = CommandRegistry::new();
    commands
        .register(
            Command::new("nav:budget", "Go to budget", |mut s: State| {
                s.tab = "budget";
                Outcome::ok(s)
            })
            .global()
            .enabled_when(|_| Availability::Disabled("Budget tab is not available yet.".to_string())),
        )
        .expect("register");

    let state = State {
        tab: "dashboard",
        ..State::default()
    };
    let results = commands.search("", "global", &state, None);
    assert_eq!(results.len(), 1);
    assert!(!results[0].enabled);
    assert_eq!(results[0].reason.as_deref(), Some("Budget tab is not available yet."));

    let outcome = commands.execute_by_id("nav:budget", "global", state);
    let err = outcome.error.expect("disabled");
    assert!(err.to_string().contains("Budget tab is not available yet."));
    assert_eq!(outcome.state.tab, "dashboard");
}

#[test]
fn generated_filter_commands_survive_rename() {
    let mut commands: CommandRegistry<State, ()> = CommandRegistry::new();
    let mut filters = vec![
        SavedFilter {
            key: "groceries".to_string(),
            query: "cat:food".to_string(),
        },
        SavedFilter {
            key: "rent".to_string(),
            query: "payee:landlord".to_string(),
        },
    ];
    commands.replace_generated("saved_filters", filter_commands(&filters));

    let groceries = commands.execute_by_id("filter:apply:groceries", "transactions", State::default());
    assert_eq!(groceries.state.applied.as_deref(), Some("cat:food"));
    let rent = commands.execute_by_id("filter:apply:rent", "transactions", State::default());
    assert_eq!(rent.state.applied.as_deref(), Some("payee:landlord"));

    // Commands close over a snapshot; editing the source does not leak in.
    filters[1].query = "payee:someone-else".to_string();
    let rent = commands.execute_by_id("filter:apply:rent", "transactions", State::default());
    assert_eq!(rent.state.applied.as_deref(), Some("payee:landlord"));

    filters[0].key = "food".to_string();
    commands.replace_generated("saved_filters", filter_commands(&filters));
    assert!(commands.get("filter:apply:groceries").is_none());
    assert!(commands.get("filter:apply:food").is_some());
    let ids: Vec<&str> = commands.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(
        commands
            .execute_by_id("filter:apply:groceries", "transactions", State::default())
            .error,
        Some(CommandError::Unknown("filter:apply:groceries".to_string()))
    );
}

#[test]
fn empty_search_lists_visible_commands_with_mru_first() {
    let mut commands: CommandRegistry<State, ()> = CommandRegistry::new();
    for (id, label) in [("app:help", "Help"), ("app:quit", "Quit"), ("keys:reload", "Reload keybindings")] {
        commands
            .register(Command::new(id, label, |s| Outcome::ok(s)).global())
            .expect("register");
    }
    commands
        .register(Command::new("txn:delete", "Delete transaction", |s| Outcome::ok(s)).scopes(&["transactions"]))
        .expect("register");
    commands
        .register(Command::new("debug:state", "Dump state", |s| Outcome::ok(s)).hidden())
        .expect("register");

    let state = State::default();
    let ids = |last: Option<&str>| -> Vec<String> {
        commands
            .search("", "dashboard", &state, last)
            .into_iter()
            .map(|m| m.command.id.clone())
            .collect()
    };
    assert_eq!(ids(None), vec!["app:help", "app:quit", "keys:reload"]);
    assert_eq!(ids(Some("keys:reload")), vec!["keys:reload", "app:help", "app:quit"]);
    assert_eq!(ids(Some("txn:delete")), vec!["app:help", "app:quit", "keys:reload"]);

    // The MRU id only reorders matches; it does not resurrect non-matches.
    let results = commands.search("help", "dashboard", &state, Some("app:quit"));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].command.id, "app:help");
}

#[test]
fn scope_mismatch_never_calls_execute() {
    let calls = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&calls);
    let mut commands: CommandRegistry<State, ()> = CommandRegistry::new();
    commands
        .register(
            Command::new("txn:delete", "Delete transaction", move |s| {
                counter.set(counter.get() + 1);
                Outcome::ok(s)
            })
            .scopes(&["transactions"]),
        )
        .expect("register");

    for scope in ["dashboard", "rules", "global"] {
        let outcome = commands.execute_by_id("txn:delete", scope, State::default());
        assert!(matches!(outcome.error, Some(CommandError::ScopeMismatch { .. })));
    }
    assert_eq!(calls.get(), 0);
}

fn layered_router() -> Router<State, ()> {
    let mark = |name: &'static str| {
        move |mut s: State, _ctx: &HandlerCtx<'_, State, ()>| {
            s.handled_by = Some(name);
            Outcome::ok(s)
        }
    };
    let overlays = OverlayTable::new(vec![
        OverlayEntry::new("notice", "notice", |s: &State| s.overlays[0], mark("notice")),
        OverlayEntry::new("palette", "palette", |s: &State| s.overlays[1], mark("palette"))
            .without_command_context(),
        OverlayEntry::new("search", "search", |s: &State| s.overlays[2], mark("search")),
    ])
    .expect("overlays");

    let mut keys = global_fallback_keys();
    keys.register(Binding::new("notice", Action::Confirm, &["enter"], "dismiss"));
    keys.register(Binding::new("search", Action::Confirm, &["enter"], "apply"));

    let mut contracts = ContractTable::new();
    for scope in ["notice", "search"] {
        contracts
            .insert(InteractionContract::new(
                scope,
                DisplayKind::Dialog,
                vec![Hint::new(Intent::Confirm, scope), Hint::new(Intent::Delete, "delete")],
            ))
            .expect("contract");
    }

    Router::new(
        keys,
        CommandRegistry::new(),
        contracts,
        TextInputTable::new(),
        overlays,
        |s: &State| s.tab.to_string(),
    )
}

#[test]
fn earliest_guard_wins_for_dispatch_and_footer() {
    let router = layered_router();
    for active in [[true, true, true], [true, false, true], [false, true, true], [false, false, true]] {
        let state = State {
            tab: "transactions",
            overlays: active,
            ..State::default()
        };
        let expected = ["notice", "palette", "search"][active.iter().position(|a| *a).unwrap_or(2)];
        let footer_scope = router.overlays().active_scope(&state, ScopePurpose::Footer);
        let dispatch = router.dispatch_key(state, "enter");
        assert_eq!(dispatch.route, Route::Overlay(expected.to_string()));
        assert_eq!(dispatch.outcome.state.handled_by, Some(expected));
        assert_eq!(footer_scope.as_deref(), Some(expected));
    }
}

#[test]
fn footer_never_shows_unbound_hints() {
    let router = layered_router();
    let state = State {
        tab: "transactions",
        overlays: [false, false, true],
        ..State::default()
    };
    let footer = router.footer(&state);
    assert_eq!(footer.len(), 1);
    assert_eq!(footer[0].label, "search");
    for hint in &footer {
        assert_ne!(hint.label, "delete");
    }
}
