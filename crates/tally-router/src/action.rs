use std::fmt;

/// Direction of a navigation gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Semantic gestures that keys are bound to.
///
/// Actions decouple physical keys from behavior. Several names in the
/// keybinding vocabulary resolve to the same action (`select`, `activate`
/// and `confirm` are all [`Action::Confirm`]); see [`Action::parse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Move selection up one row.
    Up,
    /// Move selection down one row.
    Down,
    /// Move left (previous column, or caret left in text).
    Left,
    /// Move right (next column, or caret right in text).
    Right,
    PageUp,
    PageDown,
    /// Jump to the first row.
    Top,
    /// Jump to the last row.
    Bottom,
    /// Accept the current item or input.
    Confirm,
    /// Dismiss the foreground layer or abort input.
    Cancel,
    /// Open incremental search.
    Search,
    /// Cycle the sort order.
    Sort,
    /// Delete the selected item.
    Delete,
    /// Toggle the selected item.
    Toggle,
    /// Edit the selected item.
    Edit,
    /// Create a new item.
    Add,
    Save,
    Apply,
    Help,
    /// Open the command palette.
    Palette,
    /// Open the `:` command line.
    CommandLine,
    NextTab,
    PrevTab,
    /// Focus the next pane inside a multi-pane tab.
    NextPane,
    Quit,
}

/// Every action once, in declaration order.
pub const ALL_ACTIONS: &[Action] = &[
    Action::Up,
    Action::Down,
    Action::Left,
    Action::Right,
    Action::PageUp,
    Action::PageDown,
    Action::Top,
    Action::Bottom,
    Action::Confirm,
    Action::Cancel,
    Action::Search,
    Action::Sort,
    Action::Delete,
    Action::Toggle,
    Action::Edit,
    Action::Add,
    Action::Save,
    Action::Apply,
    Action::Help,
    Action::Palette,
    Action::CommandLine,
    Action::NextTab,
    Action::PrevTab,
    Action::NextPane,
    Action::Quit,
];

impl Action {
    /// Canonical name used in keybinding files and exports.
    pub fn name(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::PageUp => "page_up",
            Action::PageDown => "page_down",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::Confirm => "confirm",
            Action::Cancel => "cancel",
            Action::Search => "search",
            Action::Sort => "sort",
            Action::Delete => "delete",
            Action::Toggle => "toggle",
            Action::Edit => "edit",
            Action::Add => "add",
            Action::Save => "save",
            Action::Apply => "apply",
            Action::Help => "help",
            Action::Palette => "palette",
            Action::CommandLine => "command_line",
            Action::NextTab => "next_tab",
            Action::PrevTab => "prev_tab",
            Action::NextPane => "next_pane",
            Action::Quit => "quit",
        }
    }

    /// Resolve a name or alias to an action.
    ///
    /// Matching is case-insensitive and treats `-` and spaces as `_`.
    pub fn parse(input: &str) -> Option<Action> {
        let norm = input.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let action = match norm.as_str() {
            "up" | "move_up" | "prev" | "previous" => Action::Up,
            "down" | "move_down" | "next" => Action::Down,
            "left" | "move_left" => Action::Left,
            "right" | "move_right" => Action::Right,
            "page_up" | "pageup" => Action::PageUp,
            "page_down" | "pagedown" => Action::PageDown,
            "top" | "first" | "home" => Action::Top,
            "bottom" | "last" | "end" => Action::Bottom,
            "confirm" | "select" | "activate" | "accept" | "open" => Action::Confirm,
            "cancel" | "back" | "close" | "dismiss" => Action::Cancel,
            "search" | "find" | "filter" => Action::Search,
            "sort" => Action::Sort,
            "delete" | "remove" => Action::Delete,
            "toggle" => Action::Toggle,
            "edit" => Action::Edit,
            "add" | "new" | "create" => Action::Add,
            "save" => Action::Save,
            "apply" => Action::Apply,
            "help" => Action::Help,
            "palette" | "command_palette" => Action::Palette,
            "command_line" | "command" | "cmdline" => Action::CommandLine,
            "next_tab" => Action::NextTab,
            "prev_tab" | "previous_tab" => Action::PrevTab,
            "next_pane" | "focus_next" => Action::NextPane,
            "quit" | "exit" => Action::Quit,
            _ => return None,
        };
        Some(action)
    }

    /// The direction for the four directional actions.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            Action::Left => Some(Direction::Left),
            Action::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
