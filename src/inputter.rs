use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor behind the search box. The cursor counts characters,
/// not bytes.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.home(),
            (KeyCode::End, _) => self.end(),
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert(c),
            (code, modifiers) => {
                trace!("Ignoring input key {code:?} {modifiers:?}");
                self.get()
            }
        }
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.cursor_pos = s.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    /// Starts a new editing session on the current text.
    pub fn resume(&mut self) {
        self.canceled = false;
        self.finished = false;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.cursor_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.cursor_pos = self.current_input.chars().count();
        self.get()
    }

    fn insert(&mut self, chr: char) -> InputResult {
        let at = self.byte_pos();
        self.current_input.insert(at, chr);
        self.cursor_pos += 1;
        self.get()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut Inputter, s: &str) -> InputResult {
        let mut last = input.get();
        for c in s.chars() {
            last = input.read(key(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn edits_at_the_cursor() {
        let mut input = Inputter::default();
        type_str(&mut input, "héat");
        input.read(key(KeyCode::Left));
        input.read(key(KeyCode::Left));
        let result = input.read(key(KeyCode::Backspace));
        assert_eq!(result.input, "hat");
        assert_eq!(result.cursor_pos, 1);

        let result = type_str(&mut input, "e");
        assert_eq!(result.input, "heat");

        input.read(key(KeyCode::Home));
        let result = input.read(key(KeyCode::Delete));
        assert_eq!(result.input, "eat");
        assert!(!result.finished);
    }

    #[test]
    fn enter_finishes_and_escape_cancels() {
        let mut input = Inputter::default();
        type_str(&mut input, "ran");
        let done = input.read(key(KeyCode::Enter));
        assert!(done.finished && !done.canceled);
        assert_eq!(done.input, "ran");

        input.resume();
        let canceled = input.read(key(KeyCode::Esc));
        assert!(canceled.finished && canceled.canceled);
        assert_eq!(canceled.input, "");
    }

    #[test]
    fn control_chords_are_ignored() {
        let mut input = Inputter::default();
        input.set("abc");
        let result = input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(result.input, "abc");
        assert_eq!(result.cursor_pos, 3);
    }
}
