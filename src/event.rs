use crossterm::event::KeyEvent;

use crate::action::Action;

#[derive(Debug, Clone)]
pub enum Event {
    Render,
    Key(KeyEvent),
    Resize(u16, u16),
}

impl Event {
    /// The state machine input for this event, if it has one.
    pub fn into_action(self) -> Option<Action> {
        match self {
            Event::Render => None,
            Event::Key(key) => Some(Action::Key(key)),
            Event::Resize(width, height) => Some(Action::Resize { width, height }),
        }
    }
}
