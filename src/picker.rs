use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::ProfileConfig;

/// How the picker was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Picked {
    Profile(usize),
    Cancelled,
}

/// Startup screen for choosing one of several configured profiles.
#[derive(Debug, Clone, Default)]
pub struct ProfilePicker {
    pub entries: Vec<String>,
    pub cursor: usize,
}

impl ProfilePicker {
    pub fn new(profiles: &[ProfileConfig]) -> Self {
        Self {
            entries: profiles
                .iter()
                .map(|p| format!("{} ({})", p.name, p.workspace))
                .collect(),
            cursor: 0,
        }
    }

    /// Apply one key press. Returns the outcome once the picker is done.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Picked> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Picked::Cancelled);
        }

        let last = self.entries.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(Picked::Cancelled),
            KeyCode::Char('j') | KeyCode::Down => self.cursor = (self.cursor + 1).min(last),
            KeyCode::Char('k') | KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('g') | KeyCode::Home => self.cursor = 0,
            KeyCode::Char('G') | KeyCode::End => self.cursor = last,
            KeyCode::Enter if !self.entries.is_empty() => {
                return Some(Picked::Profile(self.cursor));
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn profile(name: &str, workspace: &str) -> ProfileConfig {
        ProfileConfig {
            name: name.to_string(),
            workspace: workspace.to_string(),
            ..ProfileConfig::default()
        }
    }

    fn picker() -> ProfilePicker {
        ProfilePicker::new(&[
            profile("work", "acme"),
            profile("home", "me"),
            profile("ci", "acme-ci"),
        ])
    }

    #[test]
    fn entries_show_name_and_workspace() {
        assert_eq!(picker().entries[1], "home (me)");
    }

    #[test]
    fn cursor_stays_within_entries() {
        let mut picker = picker();
        assert_eq!(picker.handle_key(key(KeyCode::Char('k'))), None);
        assert_eq!(picker.cursor, 0);

        for _ in 0..5 {
            picker.handle_key(key(KeyCode::Down));
        }
        assert_eq!(picker.cursor, 2);

        picker.handle_key(key(KeyCode::Up));
        assert_eq!(picker.cursor, 1);

        picker.handle_key(key(KeyCode::Char('g')));
        assert_eq!(picker.cursor, 0);
        picker.handle_key(key(KeyCode::Char('G')));
        assert_eq!(picker.cursor, 2);
    }

    #[test]
    fn enter_selects_hovered_profile() {
        let mut picker = picker();
        picker.handle_key(key(KeyCode::Char('j')));
        assert_eq!(
            picker.handle_key(key(KeyCode::Enter)),
            Some(Picked::Profile(1))
        );
    }

    #[test]
    fn quit_keys_cancel() {
        let mut picker = picker();
        assert_eq!(
            picker.handle_key(key(KeyCode::Char('q'))),
            Some(Picked::Cancelled)
        );
        assert_eq!(picker.handle_key(key(KeyCode::Esc)), Some(Picked::Cancelled));
        assert_eq!(
            picker.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Picked::Cancelled)
        );
    }

    #[test]
    fn enter_on_empty_picker_does_nothing() {
        let mut picker = ProfilePicker::default();
        assert_eq!(picker.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(picker.handle_key(key(KeyCode::Char('j'))), None);
        assert_eq!(picker.cursor, 0);
    }
}
