use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::games::{Action, GameMode};

/// Grid position the player is pointing at in the grid games
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

impl Cursor {
    /// Moves one cell for an arrow key, staying inside a `size` x `size` grid
    pub fn shift(&mut self, code: KeyCode, size: usize) -> bool {
        let last = size.saturating_sub(1);
        let (x, y) = match code {
            KeyCode::Left => (self.x.saturating_sub(1), self.y),
            KeyCode::Right => ((self.x + 1).min(last), self.y),
            KeyCode::Up => (self.x, self.y.saturating_sub(1)),
            KeyCode::Down => (self.x, (self.y + 1).min(last)),
            _ => return false,
        };
        self.x = x;
        self.y = y;
        true
    }

    pub fn clamp(&mut self, size: usize) {
        let last = size.saturating_sub(1);
        self.x = self.x.min(last);
        self.y = self.y.min(last);
    }

    pub fn center(size: usize) -> Self {
        Self {
            x: size / 2,
            y: size / 2,
        }
    }
}

pub fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}

fn digit_pick(c: char) -> Option<Action> {
    match c.to_digit(10) {
        Some(d) if d > 0 => Some(Action::Pick(d as usize - 1)),
        _ => None,
    }
}

/// Translates a key press into a game action. Arrow keys only move the
/// cursor, so they never produce an action.
pub fn action_for(
    mode: GameMode,
    key: &KeyEvent,
    cursor: &mut Cursor,
    grid: Option<usize>,
) -> Option<Action> {
    if let Some(size) = grid {
        cursor.clamp(size);
        if cursor.shift(key.code, size) {
            return None;
        }
    }

    match (mode, key.code) {
        (GameMode::Classic | GameMode::PaletteRecall, KeyCode::Char(c)) => digit_pick(c),
        (GameMode::ReverseSequence, KeyCode::Char(c)) => digit_pick(c),
        (GameMode::ReverseSequence, KeyCode::Backspace) => Some(Action::ClearInput),

        (GameMode::QuickReflex, KeyCode::Char(' ') | KeyCode::Enter) => Some(Action::Tap),

        (GameMode::TrailTracker | GameMode::FreezeFrame, KeyCode::Char(' ')) => {
            grid.map(|_| Action::Cell {
                x: cursor.x,
                y: cursor.y,
            })
        }
        (GameMode::TrailTracker | GameMode::FreezeFrame, KeyCode::Backspace) => {
            Some(Action::ClearInput)
        }
        (GameMode::FreezeFrame, KeyCode::Enter) => Some(Action::Submit),

        (GameMode::SpeedTypist, KeyCode::Char(c)) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Key(c))
        }
        (GameMode::SpeedTypist, KeyCode::Backspace) => Some(Action::Backspace),
        (GameMode::SpeedTypist, KeyCode::Enter) => Some(Action::Submit),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digits_pick_from_one() {
        let mut cursor = Cursor::default();
        let pick = |c| action_for(GameMode::Classic, &key(KeyCode::Char(c)), &mut Cursor::default(), None);
        assert_eq!(pick('1'), Some(Action::Pick(0)));
        assert_eq!(pick('8'), Some(Action::Pick(7)));
        assert_eq!(pick('0'), None);
        assert_eq!(pick('x'), None);
        assert_eq!(
            action_for(GameMode::PaletteRecall, &key(KeyCode::Char('4')), &mut cursor, None),
            Some(Action::Pick(3))
        );
    }

    #[test]
    fn reverse_sequence_backspace_clears() {
        assert_eq!(
            action_for(
                GameMode::ReverseSequence,
                &key(KeyCode::Backspace),
                &mut Cursor::default(),
                None
            ),
            Some(Action::ClearInput)
        );
    }

    #[test]
    fn space_taps_in_quick_reflex() {
        let mut cursor = Cursor::default();
        assert_eq!(
            action_for(GameMode::QuickReflex, &key(KeyCode::Char(' ')), &mut cursor, None),
            Some(Action::Tap)
        );
        assert_eq!(
            action_for(GameMode::QuickReflex, &key(KeyCode::Char('a')), &mut cursor, None),
            None
        );
    }

    #[test]
    fn arrows_move_the_cursor_within_the_grid() {
        let mut cursor = Cursor::default();
        for code in [KeyCode::Right, KeyCode::Right, KeyCode::Right, KeyCode::Down] {
            assert_eq!(
                action_for(GameMode::FreezeFrame, &key(code), &mut cursor, Some(3)),
                None
            );
        }
        assert_eq!(cursor, Cursor { x: 2, y: 1 });
        assert_eq!(
            action_for(GameMode::FreezeFrame, &key(KeyCode::Char(' ')), &mut cursor, Some(3)),
            Some(Action::Cell { x: 2, y: 1 })
        );
        cursor.shift(KeyCode::Up, 3);
        cursor.shift(KeyCode::Up, 3);
        assert_eq!(cursor.y, 0);
    }

    #[test]
    fn cursor_is_clamped_when_the_grid_shrinks() {
        let mut cursor = Cursor { x: 7, y: 7 };
        let action = action_for(GameMode::TrailTracker, &key(KeyCode::Char(' ')), &mut cursor, Some(5));
        assert_eq!(action, Some(Action::Cell { x: 4, y: 4 }));
    }

    #[test]
    fn typist_takes_characters() {
        let mut cursor = Cursor::default();
        let typed = |code, cursor: &mut Cursor| action_for(GameMode::SpeedTypist, &key(code), cursor, None);
        assert_eq!(typed(KeyCode::Char('q'), &mut cursor), Some(Action::Key('q')));
        assert_eq!(typed(KeyCode::Backspace, &mut cursor), Some(Action::Backspace));
        assert_eq!(typed(KeyCode::Enter, &mut cursor), Some(Action::Submit));
        let ctrl = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(action_for(GameMode::SpeedTypist, &ctrl, &mut cursor, None), None);
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit(&key(KeyCode::Esc)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&key(KeyCode::Char('c'))));
    }
}
