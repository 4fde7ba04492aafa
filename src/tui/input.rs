use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

/// Lines scrolled per mouse wheel notch.
pub const WHEEL_STEP: usize = 3;

/// What the base application does with an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollHome,
    ScrollEnd,
    ClearLog,
    None,
}

pub fn map_event(event: &Event) -> Action {
    match event {
        Event::Key(key) => map_key(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Action::ScrollUp(WHEEL_STEP),
            MouseEventKind::ScrollDown => Action::ScrollDown(WHEEL_STEP),
            _ => Action::None,
        },
        _ => Action::None,
    }
}

pub fn map_key(key: &KeyEvent) -> Action {
    // Only the initial press counts; repeat and release would double actions.
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Action::Quit,
            KeyCode::Home => Action::ScrollHome,
            KeyCode::End => Action::ScrollEnd,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::ScrollUp(1),
        KeyCode::Down | KeyCode::Char('j') => Action::ScrollDown(1),
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home | KeyCode::Char('g') => Action::ScrollHome,
        KeyCode::End | KeyCode::Char('G') => Action::ScrollEnd,
        KeyCode::Char('c') => Action::ClearLog,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(map_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)), Action::Quit);
        assert_eq!(
            map_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            map_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)),
            Action::ClearLog
        );
        assert_eq!(
            map_key(&press(KeyCode::Char('k'), KeyModifiers::NONE)),
            Action::ScrollUp(1)
        );
        assert_eq!(map_key(&press(KeyCode::End, KeyModifiers::NONE)), Action::ScrollEnd);
        assert_eq!(map_key(&press(KeyCode::Char('x'), KeyModifiers::NONE)), Action::None);
    }

    #[test]
    fn test_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(&release), Action::None);
    }

    #[test]
    fn test_mouse_wheel() {
        let wheel = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(map_event(&wheel), Action::ScrollUp(WHEEL_STEP));
        assert_eq!(map_event(&Event::FocusGained), Action::None);
    }
}
