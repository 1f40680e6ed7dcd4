//! Footer contracts and text-entry behavior for every scope.

use tally_router::{
    Action, ContractTable, DisplayKind, Hint, Intent, InteractionContract, TextInputBehavior,
    TextInputTable,
};

use crate::error::Result;

pub fn build_contracts() -> Result<ContractTable> {
    let mut table = ContractTable::new();
    let contracts = [
        InteractionContract::new(
            "notice",
            DisplayKind::Dialog,
            vec![Hint::new(Intent::Confirm, "dismiss")],
        ),
        InteractionContract::new(
            "help",
            DisplayKind::Document,
            vec![Hint::new(Intent::Move, "scroll"), Hint::new(Intent::Cancel, "close")],
        ),
        InteractionContract::new(
            "palette",
            DisplayKind::Palette,
            vec![
                Hint::new(Intent::Move, "next"),
                Hint::new(Intent::Select, "run"),
                Hint::new(Intent::Cancel, "close"),
            ],
        ),
        InteractionContract::new(
            "command_line",
            DisplayKind::TextEntry,
            vec![Hint::new(Intent::Confirm, "run"), Hint::new(Intent::Cancel, "cancel")],
        ),
        InteractionContract::new(
            "detail",
            DisplayKind::Document,
            vec![
                Hint::new(Intent::Move, "next"),
                Hint::new(Intent::Delete, "delete"),
                Hint::new(Intent::Cancel, "close"),
            ],
        ),
        InteractionContract::new(
            "search",
            DisplayKind::TextEntry,
            vec![Hint::new(Intent::Confirm, "keep"), Hint::new(Intent::Cancel, "cancel")],
        ),
        InteractionContract::new(
            "filter_name",
            DisplayKind::TextEntry,
            vec![Hint::new(Intent::Save, "save").action(Action::Confirm), Hint::new(Intent::Cancel, "cancel")],
        ),
        InteractionContract::new(
            "dashboard",
            DisplayKind::Document,
            vec![
                Hint::new(Intent::Select, "next tab").action(Action::NextTab),
                Hint::new(Intent::Apply, "commands").action(Action::Palette),
                Hint::new(Intent::Cancel, "quit").action(Action::Quit),
            ],
        ),
        InteractionContract::new(
            "transactions",
            DisplayKind::List,
            vec![
                Hint::new(Intent::Move, "move"),
                Hint::new(Intent::Select, "open"),
                Hint::new(Intent::Apply, "search").action(Action::Search),
                Hint::new(Intent::Save, "save filter"),
                Hint::new(Intent::Delete, "delete"),
                Hint::new(Intent::Cancel, "clear filter"),
                Hint::new(Intent::Apply, "commands").action(Action::Palette),
            ],
        ),
        InteractionContract::new(
            "budget",
            DisplayKind::Document,
            vec![Hint::new(Intent::Select, "next tab").action(Action::NextTab)],
        ),
        InteractionContract::new(
            "rules",
            DisplayKind::List,
            vec![
                Hint::new(Intent::Move, "move"),
                Hint::new(Intent::Apply, "commands").action(Action::Palette),
            ],
        ),
        InteractionContract::new(
            "settings.general",
            DisplayKind::Form,
            vec![
                Hint::new(Intent::Move, "pane").action(Action::NextPane),
                Hint::new(Intent::Toggle, "toggle").omitted(),
            ],
        ),
        InteractionContract::new(
            "settings.keybindings",
            DisplayKind::Form,
            vec![
                Hint::new(Intent::Move, "pane").action(Action::NextPane),
                Hint::new(Intent::Apply, "reload"),
                Hint::new(Intent::Select, "help").action(Action::Help),
            ],
        ),
    ];
    for contract in contracts {
        table.insert(contract)?;
    }
    Ok(table)
}

pub fn build_text_inputs() -> TextInputTable {
    let mut table = TextInputTable::new();
    table.insert("palette", TextInputBehavior::caret_aware());
    table.insert("command_line", TextInputBehavior::caret_aware());
    table.insert("search", TextInputBehavior::caret_aware());
    table.insert("filter_name", TextInputBehavior::append_only());
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::keymap::default_keys;

    #[test]
    fn every_labeled_hint_has_a_default_key() {
        let contracts = build_contracts().expect("contracts");
        assert_eq!(contracts.audit(&default_keys()), Vec::new());
    }

    #[test]
    fn transactions_footer_uses_live_keys() {
        let contracts = build_contracts().expect("contracts");
        let footer = contracts.render_footer("transactions", &default_keys());
        let labels: Vec<(&str, &str)> = footer.iter().map(|h| (h.key.as_str(), h.label.as_str())).collect();
        assert_eq!(
            labels,
            vec![
                ("j", "move"),
                ("Enter", "open"),
                ("/", "search"),
                ("s", "save filter"),
                ("d", "delete"),
                ("Esc", "clear filter"),
                ("Ctrl+P", "commands"),
            ]
        );
    }
}
