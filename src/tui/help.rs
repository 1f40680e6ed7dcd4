//! Help text content for the help modal

use tally_router::{GLOBAL, KeyRegistry, display_key};

const KEY_COLUMN: usize = 16;

/// Heading shown for a scope.
fn scope_title(scope: &str) -> String {
    match scope {
        GLOBAL => "Everywhere".to_string(),
        "command_line" => "Command line".to_string(),
        "filter_name" => "Naming a filter".to_string(),
        other => {
            let mut words = other.split(['.', '_']);
            let mut title = String::new();
            if let Some(first) = words.next() {
                let mut chars = first.chars();
                if let Some(c) = chars.next() {
                    title.extend(c.to_uppercase());
                    title.push_str(chars.as_str());
                }
            }
            for word in words {
                title.push_str(" / ");
                title.push_str(word);
            }
            title
        }
    }
}

/// Every live binding, grouped by scope, global last.
///
/// Section headings are flush left; binding rows are indented two spaces.
pub fn help_lines(keys: &KeyRegistry) -> Vec<String> {
    let mut scopes: Vec<&str> = keys.scopes().into_iter().filter(|s| *s != GLOBAL).collect();
    if keys.has_scope(GLOBAL) {
        scopes.push(GLOBAL);
    }

    let mut lines = Vec::new();
    for scope in scopes {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{}:", scope_title(scope)));
        for binding in keys.bindings_in(scope) {
            let shown: Vec<String> = binding.keys.iter().map(|k| display_key(k)).collect();
            let mut row = format!("  {:<width$}{}", shown.join("/"), binding.help, width = KEY_COLUMN);
            if let Some(id) = &binding.command_id {
                row.push_str(&format!("  ({id})"));
            }
            lines.push(row);
        }
    }
    lines.push(String::new());
    lines.push("Press Esc or q to close".to_string());
    lines
}
