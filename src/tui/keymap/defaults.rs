use tally_router::{Action, Binding, KeyRegistry};

/// Built-in keybindings.
///
/// Registration is first-wins per (scope, key), so overlay scopes go first,
/// then tab scopes, then `global`. A scope binding that shares a key with a
/// global one shadows it only inside that scope.
pub fn default_keys() -> KeyRegistry {
    let mut keys = KeyRegistry::new();
    keys.register_all(overlay_bindings());
    keys.register_all(tab_bindings());
    keys.register_all(global_bindings());
    keys
}

fn list_moves(scope: &str) -> Vec<Binding> {
    vec![
        Binding::new(scope, Action::Down, &["j", "down"], "Move down"),
        Binding::new(scope, Action::Up, &["k", "up"], "Move up"),
        Binding::new(scope, Action::PageDown, &["pgdown", "ctrl+d"], "Page down"),
        Binding::new(scope, Action::PageUp, &["pgup", "ctrl+u"], "Page up"),
        Binding::new(scope, Action::Top, &["g", "home"], "First row"),
        Binding::new(scope, Action::Bottom, &["G", "end"], "Last row"),
    ]
}

fn overlay_bindings() -> Vec<Binding> {
    let mut bindings = vec![
        Binding::new("notice", Action::Confirm, &["enter", "space"], "Dismiss"),
        Binding::new("notice", Action::Cancel, &["esc", "q"], "Dismiss"),
        Binding::new("help", Action::Cancel, &["esc", "q", "?"], "Close help"),
    ];
    bindings.extend(list_moves("help"));
    bindings.extend([
        Binding::new("palette", Action::Confirm, &["enter"], "Run command"),
        Binding::new("palette", Action::Cancel, &["esc", "ctrl+p"], "Close palette"),
        Binding::new("palette", Action::Down, &["down", "ctrl+n"], "Next command"),
        Binding::new("palette", Action::Up, &["up"], "Previous command"),
        Binding::new("palette", Action::Left, &["left"], "Caret left"),
        Binding::new("palette", Action::Right, &["right"], "Caret right"),
        Binding::new("command_line", Action::Confirm, &["enter"], "Run"),
        Binding::new("command_line", Action::Cancel, &["esc"], "Cancel"),
        Binding::new("command_line", Action::Left, &["left"], "Caret left"),
        Binding::new("command_line", Action::Right, &["right"], "Caret right"),
        Binding::new("detail", Action::Cancel, &["esc", "q", "enter"], "Close"),
        Binding::new("detail", Action::Delete, &["d"], "Delete transaction"),
        Binding::new("detail", Action::Down, &["j", "down"], "Next transaction"),
        Binding::new("detail", Action::Up, &["k", "up"], "Previous transaction"),
        Binding::new("search", Action::Confirm, &["enter"], "Keep filter"),
        Binding::new("search", Action::Cancel, &["esc"], "Cancel search"),
        Binding::new("search", Action::Left, &["left"], "Caret left"),
        Binding::new("search", Action::Right, &["right"], "Caret right"),
        Binding::new("filter_name", Action::Confirm, &["enter"], "Save filter"),
        Binding::new("filter_name", Action::Cancel, &["esc"], "Cancel"),
    ]);
    bindings
}

fn tab_bindings() -> Vec<Binding> {
    let mut bindings = vec![
        Binding::new("transactions", Action::Search, &["/", "ctrl+f"], "Search").command("filter:open"),
        Binding::new("transactions", Action::Confirm, &["enter"], "Open"),
        Binding::new("transactions", Action::Delete, &["d"], "Delete").command("txn:delete"),
        Binding::new("transactions", Action::Save, &["s"], "Save filter").command("filter:save"),
        Binding::new("transactions", Action::Cancel, &["esc"], "Clear filter or back"),
    ];
    bindings.extend(list_moves("transactions"));
    bindings.extend(list_moves("rules"));
    for pane in ["settings.general", "settings.keybindings"] {
        bindings.push(Binding::new(pane, Action::NextPane, &["n", "right"], "Next pane"));
    }
    bindings.push(
        Binding::new("settings.keybindings", Action::Apply, &["r"], "Reload keybindings").command("keys:reload"),
    );
    bindings
}

fn global_bindings() -> Vec<Binding> {
    vec![
        Binding::global(Action::Quit, &["q", "ctrl+c"], "Quit").command("app:quit"),
        Binding::global(Action::Help, &["?", "f1"], "Help").command("app:help"),
        Binding::global(Action::Palette, &["ctrl+p"], "Command palette"),
        Binding::global(Action::CommandLine, &[":"], "Command line"),
        Binding::global(Action::NextTab, &["tab"], "Next tab"),
        Binding::global(Action::PrevTab, &["shift+tab"], "Previous tab"),
        Binding::global(Action::Cancel, &["esc"], "Back"),
    ]
}
