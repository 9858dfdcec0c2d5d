use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Operator action decoded from a raw keypress.
///
/// The event stream occupies stdin, so keys arrive on the controlling
/// terminal; crossterm's unix backend already reads `/dev/tty` when stdin
/// is not a tty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Key we don't care about.
    None,
    /// Ctrl+C — first press warns, second within the window aborts.
    Interrupt,
    /// Move the queue selection to the next upcoming iteration.
    NextSlot,
    /// Move the queue selection to the previous upcoming iteration.
    PrevSlot,
    /// Cycle the selected slot's run mode.
    CycleMode,
    /// Cycle the selected slot's model.
    CycleModel,
    /// Toggle the selected slot's wait command on or off.
    ToggleWait,
    /// Toggle the selected slot's TUI flag.
    ToggleTui,
    /// Add five seconds to the selected slot's delay.
    DelayUp,
    /// Remove five seconds from the selected slot's delay.
    DelayDown,
}

/// Map a terminal key event to an [`InputAction`].
pub fn decode_key(event: &KeyEvent) -> InputAction {
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            InputAction::Interrupt
        }
        KeyCode::Tab | KeyCode::Right | KeyCode::Down => InputAction::NextSlot,
        KeyCode::BackTab | KeyCode::Left | KeyCode::Up => InputAction::PrevSlot,
        KeyCode::Char('m') => InputAction::CycleMode,
        KeyCode::Char('o') => InputAction::CycleModel,
        KeyCode::Char('w') => InputAction::ToggleWait,
        KeyCode::Char('t') => InputAction::ToggleTui,
        KeyCode::Char('+') | KeyCode::Char('=') => InputAction::DelayUp,
        KeyCode::Char('-') => InputAction::DelayDown,
        _ => InputAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_c_is_interrupt() {
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(decode_key(&event), InputAction::Interrupt);
    }

    #[test]
    fn plain_c_is_not_interrupt() {
        assert_eq!(decode_key(&key(KeyCode::Char('c'))), InputAction::None);
    }

    #[test]
    fn navigation_keys() {
        assert_eq!(decode_key(&key(KeyCode::Tab)), InputAction::NextSlot);
        assert_eq!(decode_key(&key(KeyCode::Right)), InputAction::NextSlot);
        assert_eq!(decode_key(&key(KeyCode::Left)), InputAction::PrevSlot);
    }

    #[test]
    fn edit_keys() {
        assert_eq!(decode_key(&key(KeyCode::Char('m'))), InputAction::CycleMode);
        assert_eq!(decode_key(&key(KeyCode::Char('o'))), InputAction::CycleModel);
        assert_eq!(decode_key(&key(KeyCode::Char('w'))), InputAction::ToggleWait);
        assert_eq!(decode_key(&key(KeyCode::Char('+'))), InputAction::DelayUp);
        assert_eq!(decode_key(&key(KeyCode::Char('-'))), InputAction::DelayDown);
    }

    #[test]
    fn unmapped_key_is_none() {
        assert_eq!(decode_key(&key(KeyCode::Esc)), InputAction::None);
        assert_eq!(decode_key(&key(KeyCode::Char('q'))), InputAction::None);
    }
}
