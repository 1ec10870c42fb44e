use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::trace;

use crate::domain::Message;
use crate::model::Model;

/// Maps terminal events to messages for the model.
#[derive(Debug, Default)]
pub struct Controller;

impl Controller {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_event(&self, model: &Model, event: Event) -> Option<Message> {
        match event {
            // Crossterm also reports release and repeat events on Windows.
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Tab, _) => Some(Message::NextView),
            (KeyCode::BackTab, _) => Some(Message::PrevView),
            (KeyCode::Char(d @ '1'..='9'), _) => {
                d.to_digit(10).map(|n| Message::SelectView(n as usize - 1))
            }
            (KeyCode::Char('b'), _) => Some(Message::ToggleSidebar),
            (KeyCode::Char('t'), _) => Some(Message::CycleTheme),
            (KeyCode::Up | KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down | KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::Home | KeyCode::Char('g'), _) => Some(Message::MoveBeginning),
            (KeyCode::End | KeyCode::Char('G'), _) => Some(Message::MoveEnd),
            (KeyCode::Left | KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right | KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::Char('s') | KeyCode::Enter, _) => Some(Message::SortSelected),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('c'), _) => Some(Message::CycleScope),
            (KeyCode::Char('y'), _) => Some(Message::CopyCell),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DashConfig;
    use crate::prefs::tests::MemoryPreferences;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn model() -> Model {
        Model::init(&DashConfig::default(), Box::new(MemoryPreferences::default()))
    }

    #[test]
    fn maps_navigation_keys() {
        let controller = Controller::new();
        let model = model();
        assert!(matches!(
            controller.handle_event(&model, press(KeyCode::Char('q'))),
            Some(Message::Quit)
        ));
        assert!(matches!(
            controller.handle_event(&model, press(KeyCode::Char('3'))),
            Some(Message::SelectView(2))
        ));
        assert!(matches!(
            controller.handle_event(&model, press(KeyCode::BackTab)),
            Some(Message::PrevView)
        ));
        assert!(matches!(
            controller.handle_event(&model, press(KeyCode::Char('j'))),
            Some(Message::MoveDown)
        ));
        assert!(controller.handle_event(&model, press(KeyCode::Char('0'))).is_none());
    }

    #[test]
    fn ignores_key_releases() {
        let controller = Controller::new();
        let mut key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(controller.handle_event(&model(), Event::Key(key)).is_none());
    }

    #[test]
    fn search_mode_forwards_raw_keys() {
        let controller = Controller::new();
        let mut model = model();
        model.update(Message::SelectView(1));
        model.update(Message::Search);
        assert!(matches!(
            controller.handle_event(&model, press(KeyCode::Char('q'))),
            Some(Message::RawKey(_))
        ));
    }

    #[test]
    fn resize_carries_dimensions() {
        let controller = Controller::new();
        assert!(matches!(
            controller.handle_event(&model(), Event::Resize(120, 40)),
            Some(Message::Resize(120, 40))
        ));
    }
}
