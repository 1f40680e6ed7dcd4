//! Text-entry behavior per scope and the one routine that turns a key into
//! text, a caret move, list navigation or an action.
//!
//! List scopes and text scopes share [`classify`]; what differs between them
//! is declared in the [`TextInputTable`], never branched on by scope name.

use std::collections::HashMap;

use crate::action::{Action, Direction};
use crate::keys::{KeyRegistry, single_char};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEditing {
    /// Left/right move a caret inside the buffer.
    CaretAware,
    /// Text is only ever appended or backspaced.
    AppendOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextInputBehavior {
    pub editing: TextEditing,
    /// Single-character keys are typed even if the scope binds them
    /// (`j` types a `j` instead of moving down).
    pub suppress_letter_keys: bool,
}

impl TextInputBehavior {
    pub fn caret_aware() -> Self {
        Self {
            editing: TextEditing::CaretAware,
            suppress_letter_keys: true,
        }
    }

    pub fn append_only() -> Self {
        Self {
            editing: TextEditing::AppendOnly,
            suppress_letter_keys: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TextInputTable {
    behaviors: HashMap<String, TextInputBehavior>,
}

impl TextInputTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scope: impl Into<String>, behavior: TextInputBehavior) {
        self.behaviors.insert(scope.into(), behavior);
    }

    pub fn get(&self, scope: &str) -> Option<TextInputBehavior> {
        self.behaviors.get(scope).copied()
    }
}

/// What a key means in a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Text(char),
    Caret(Direction),
    Navigate(Direction),
    Action(Action),
    Unbound,
}

/// Resolve `key` in `scope`.
///
/// Scopes with a text behavior type printable single characters; with
/// `suppress_letter_keys` this wins over any binding. Horizontal moves are
/// caret moves in caret-aware scopes and ignored in append-only ones.
/// Vertical moves are always navigation, so a palette list still scrolls
/// while its query field has focus.
pub fn classify(key: &str, scope: &str, keys: &KeyRegistry, behaviors: &TextInputTable) -> KeyInput {
    let behavior = behaviors.get(scope);
    let typed = typed_char(key);

    if let (Some(behavior), Some(ch)) = (behavior, typed)
        && behavior.suppress_letter_keys
    {
        return KeyInput::Text(ch);
    }

    if let Some(binding) = keys.lookup(key, scope) {
        return match (binding.action.direction(), behavior) {
            (Some(dir @ (Direction::Left | Direction::Right)), Some(behavior)) => match behavior.editing {
                TextEditing::CaretAware => KeyInput::Caret(dir),
                TextEditing::AppendOnly => KeyInput::Unbound,
            },
            (Some(dir), _) => KeyInput::Navigate(dir),
            (None, _) => KeyInput::Action(binding.action),
        };
    }

    match (behavior, typed) {
        (Some(_), Some(ch)) => KeyInput::Text(ch),
        _ => KeyInput::Unbound,
    }
}

fn typed_char(key: &str) -> Option<char> {
    if key == "space" {
        return Some(' ');
    }
    single_char(key).filter(|c| !c.is_control())
}

/// A single-line text buffer with a byte-offset caret on char boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextField {
    buffer: String,
    caret: usize,
    editing: TextEditing,
}

impl TextField {
    pub fn new(editing: TextEditing) -> Self {
        Self {
            buffer: String::new(),
            caret: 0,
            editing,
        }
    }

    pub fn with_text(editing: TextEditing, text: &str) -> Self {
        Self {
            buffer: text.to_string(),
            caret: text.len(),
            editing,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Caret position in characters, for rendering.
    pub fn caret_column(&self) -> usize {
        self.buffer[..self.caret].chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn insert(&mut self, ch: char) {
        match self.editing {
            TextEditing::CaretAware => {
                self.buffer.insert(self.caret, ch);
                self.caret += ch.len_utf8();
            }
            TextEditing::AppendOnly => {
                self.buffer.push(ch);
                self.caret = self.buffer.len();
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.caret == 0 {
            return;
        }
        let start = self.prev_boundary(self.caret);
        self.buffer.drain(start..self.caret);
        self.caret = start;
    }

    pub fn delete(&mut self) {
        if self.editing == TextEditing::AppendOnly || self.caret >= self.buffer.len() {
            return;
        }
        let end = self.next_boundary(self.caret);
        self.buffer.drain(self.caret..end);
    }

    pub fn move_caret(&mut self, direction: Direction) {
        if self.editing == TextEditing::AppendOnly {
            return;
        }
        match direction {
            Direction::Left if self.caret > 0 => self.caret = self.prev_boundary(self.caret),
            Direction::Right if self.caret < self.buffer.len() => {
                self.caret = self.next_boundary(self.caret)
            }
            _ => {}
        }
    }

    pub fn home(&mut self) {
        if self.editing == TextEditing::CaretAware {
            self.caret = 0;
        }
    }

    pub fn end(&mut self) {
        self.caret = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.caret = 0;
    }

    /// Apply an editing key (`backspace`, `del`, `home`, `end`, `ctrl+u`).
    /// Returns false for keys that are not editing keys.
    pub fn edit_key(&mut self, key: &str) -> bool {
        match key {
            "backspace" | "ctrl+h" => self.backspace(),
            "del" => self.delete(),
            "home" | "ctrl+a" => self.home(),
            "end" | "ctrl+e" => self.end(),
            "ctrl+u" => self.clear(),
            _ => return false,
        }
        true
    }

    fn prev_boundary(&self, from: usize) -> usize {
        let mut pos = from - 1;
        while pos > 0 && !self.buffer.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    fn next_boundary(&self, from: usize) -> usize {
        let mut pos = from + 1;
        while pos < self.buffer.len() && !self.buffer.is_char_boundary(pos) {
            pos += 1;
        }
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Binding;

    fn keys() -> KeyRegistry {
        let mut keys = KeyRegistry::new();
        keys.register(Binding::new("search", Action::Confirm, &["enter"], "apply"));
        keys.register(Binding::new("search", Action::Cancel, &["esc"], "cancel"));
        keys.register(Binding::new("transactions", Action::Down, &["j", "down"], "down"));
        keys.register(Binding::new("transactions", Action::Left, &["h", "left"], "left"));
        keys.register(Binding::global(Action::Down, &["down"], "down"));
        keys.register(Binding::global(Action::Left, &["left"], "left"));
        keys.register(Binding::global(Action::Right, &["right"], "right"));
        keys.register(Binding::global(Action::Quit, &["q"], "quit"));
        keys
    }

    fn behaviors() -> TextInputTable {
        let mut table = TextInputTable::new();
        table.insert("search", TextInputBehavior::caret_aware());
        table.insert("filter_name", TextInputBehavior::append_only());
        table
    }

    #[test]
    fn list_scope_navigates() {
        let (keys, table) = (keys(), behaviors());
        assert_eq!(classify("j", "transactions", &keys, &table), KeyInput::Navigate(Direction::Down));
        assert_eq!(classify("h", "transactions", &keys, &table), KeyInput::Navigate(Direction::Left));
        assert_eq!(classify("q", "transactions", &keys, &table), KeyInput::Action(Action::Quit));
        assert_eq!(classify("z", "transactions", &keys, &table), KeyInput::Unbound);
    }

    #[test]
    fn text_scope_types_letters_over_bindings() {
        let (keys, table) = (keys(), behaviors());
        assert_eq!(classify("q", "search", &keys, &table), KeyInput::Text('q'));
        assert_eq!(classify("space", "search", &keys, &table), KeyInput::Text(' '));
        assert_eq!(classify("enter", "search", &keys, &table), KeyInput::Action(Action::Confirm));
    }

    #[test]
    fn horizontal_moves_depend_on_editing_mode() {
        let (keys, table) = (keys(), behaviors());
        assert_eq!(classify("left", "search", &keys, &table), KeyInput::Caret(Direction::Left));
        assert_eq!(classify("left", "filter_name", &keys, &table), KeyInput::Unbound);
        assert_eq!(classify("down", "filter_name", &keys, &table), KeyInput::Navigate(Direction::Down));
    }

    #[test]
    fn letters_type_without_suppression_only_when_unbound() {
        let keys = keys();
        let mut table = TextInputTable::new();
        table.insert(
            "transactions",
            TextInputBehavior {
                editing: TextEditing::CaretAware,
                suppress_letter_keys: false,
            },
        );
        assert_eq!(classify("j", "transactions", &keys, &table), KeyInput::Navigate(Direction::Down));
        assert_eq!(classify("x", "transactions", &keys, &table), KeyInput::Text('x'));
    }

    #[test]
    fn caret_editing_is_utf8_safe() {
        let mut field = TextField::with_text(TextEditing::CaretAware, "café");
        field.move_caret(Direction::Left);
        assert_eq!(field.caret_column(), 3);
        field.insert('!');
        assert_eq!(field.text(), "caf!é");
        field.end();
        field.backspace();
        assert_eq!(field.text(), "caf!");
        field.home();
        field.delete();
        assert_eq!(field.text(), "af!");
    }

    #[test]
    fn append_only_ignores_caret_moves() {
        let mut field = TextField::new(TextEditing::AppendOnly);
        field.insert('a');
        field.insert('b');
        field.move_caret(Direction::Left);
        field.home();
        field.insert('c');
        assert_eq!(field.text(), "abc");
        assert!(field.edit_key("backspace"));
        assert_eq!(field.text(), "ab");
        assert!(!field.edit_key("x"));
    }
}
