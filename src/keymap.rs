//! Logical keyboard surface
//!
//! Maps host-independent key presses to viewer and index-page actions, and
//! moves the index-grid selection using the rendered column count.

use anyhow::{Result, bail};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    Space,
    Enter,
    Delete,
    Char(char),
}

/// A key press with the modifier the surface cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyInput {
    pub const fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    pub const fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

impl FromStr for KeyInput {
    type Err = anyhow::Error;

    /// Parses names like `right`, `q`, `+`, `ctrl+s`
    fn from_str(raw: &str) -> Result<Self> {
        if raw == " " {
            return Ok(Self::plain(Key::Space));
        }
        let s = raw.trim();
        let lower = s.to_lowercase();
        let (ctrl, name) = match lower.strip_prefix("ctrl+") {
            Some(rest) if !rest.is_empty() => (true, rest),
            _ => (false, lower.as_str()),
        };

        let key = match name {
            "left" => Key::Left,
            "right" => Key::Right,
            "up" => Key::Up,
            "down" => Key::Down,
            "esc" | "escape" => Key::Escape,
            "space" => Key::Space,
            "enter" | "return" => Key::Enter,
            "del" | "delete" => Key::Delete,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => bail!("Unknown key: {s}"),
                }
            }
        };
        Ok(Self { key, ctrl })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Prev,
    Next,
    ToggleHFlip,
    ToggleShuffle,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Leave,
    ContextMenu,
}

/// Entries of the viewer's context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CopyImage,
    CopyPath,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    AddCard,
    Save,
    DeleteSelected,
    OpenSelected,
    Move(Direction),
}

pub fn viewer_action(input: KeyInput) -> Option<ViewerAction> {
    if input.ctrl {
        return None;
    }
    let action = match input.key {
        Key::Left => ViewerAction::Prev,
        Key::Right => ViewerAction::Next,
        Key::Escape => ViewerAction::Leave,
        Key::Space => ViewerAction::ContextMenu,
        Key::Char(c) => match c.to_ascii_lowercase() {
            'h' => ViewerAction::ToggleHFlip,
            'r' => ViewerAction::ToggleShuffle,
            'q' => ViewerAction::Leave,
            '+' | '=' => ViewerAction::ZoomIn,
            '-' => ViewerAction::ZoomOut,
            '0' => ViewerAction::ZoomReset,
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

/// Keys while the context menu is open; `None` falls through to the viewer
pub fn menu_action(input: KeyInput) -> Option<MenuAction> {
    if input.ctrl {
        return None;
    }
    match input.key {
        Key::Char(c) if c.eq_ignore_ascii_case(&'c') => Some(MenuAction::CopyImage),
        Key::Char(c) if c.eq_ignore_ascii_case(&'p') => Some(MenuAction::CopyPath),
        Key::Escape | Key::Space => Some(MenuAction::Close),
        _ => None,
    }
}

pub fn index_action(input: KeyInput) -> Option<IndexAction> {
    match (input.key, input.ctrl) {
        (Key::Char(c), true) if c.eq_ignore_ascii_case(&'n') => Some(IndexAction::AddCard),
        (Key::Char(c), true) if c.eq_ignore_ascii_case(&'s') => Some(IndexAction::Save),
        (Key::Delete, false) => Some(IndexAction::DeleteSelected),
        (Key::Enter, false) => Some(IndexAction::OpenSelected),
        (Key::Up, false) => Some(IndexAction::Move(Direction::Up)),
        (Key::Down, false) => Some(IndexAction::Move(Direction::Down)),
        (Key::Left, false) => Some(IndexAction::Move(Direction::Left)),
        (Key::Right, false) => Some(IndexAction::Move(Direction::Right)),
        _ => None,
    }
}

/// New grid selection after an arrow press.
///
/// With nothing selected the first press selects card 0. Moves that would
/// leave the grid keep the current selection.
pub fn move_selection(
    current: Option<usize>,
    direction: Direction,
    columns: usize,
    count: usize,
) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let Some(current) = current.filter(|&c| c < count) else {
        return Some(0);
    };
    let columns = columns.max(1);

    let next = match direction {
        Direction::Left => current.checked_sub(1),
        Direction::Right => Some(current + 1),
        Direction::Up => current.checked_sub(columns),
        Direction::Down => Some(current + columns),
    };
    Some(next.filter(|&n| n < count).unwrap_or(current))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> KeyInput {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(key("Right"), KeyInput::plain(Key::Right));
        assert_eq!(key("ctrl+s"), KeyInput::ctrl(Key::Char('s')));
        assert_eq!(key("+"), KeyInput::plain(Key::Char('+')));
        assert_eq!(key("esc"), KeyInput::plain(Key::Escape));
        assert_eq!(key(" "), KeyInput::plain(Key::Space));
        assert!("nonsense".parse::<KeyInput>().is_err());
    }

    #[test]
    fn test_menu_keys() {
        assert_eq!(menu_action(key("c")), Some(MenuAction::CopyImage));
        assert_eq!(menu_action(key("P")), Some(MenuAction::CopyPath));
        assert_eq!(menu_action(key("escape")), Some(MenuAction::Close));
        assert_eq!(menu_action(key("space")), Some(MenuAction::Close));
        assert_eq!(menu_action(key("right")), None);
        assert_eq!(menu_action(key("ctrl+c")), None);
    }

    #[test]
    fn test_viewer_keys() {
        assert_eq!(viewer_action(key("left")), Some(ViewerAction::Prev));
        assert_eq!(viewer_action(key("right")), Some(ViewerAction::Next));
        assert_eq!(viewer_action(key("H")), Some(ViewerAction::ToggleHFlip));
        assert_eq!(viewer_action(key("r")), Some(ViewerAction::ToggleShuffle));
        assert_eq!(viewer_action(key("+")), Some(ViewerAction::ZoomIn));
        assert_eq!(viewer_action(key("-")), Some(ViewerAction::ZoomOut));
        assert_eq!(viewer_action(key("0")), Some(ViewerAction::ZoomReset));
        assert_eq!(viewer_action(key("q")), Some(ViewerAction::Leave));
        assert_eq!(viewer_action(key("escape")), Some(ViewerAction::Leave));
        assert_eq!(viewer_action(key("space")), Some(ViewerAction::ContextMenu));
        assert_eq!(viewer_action(key("ctrl+h")), None);
        assert_eq!(viewer_action(key("x")), None);
    }

    #[test]
    fn test_index_keys() {
        assert_eq!(index_action(key("ctrl+n")), Some(IndexAction::AddCard));
        assert_eq!(index_action(key("ctrl+S")), Some(IndexAction::Save));
        assert_eq!(index_action(key("delete")), Some(IndexAction::DeleteSelected));
        assert_eq!(index_action(key("up")), Some(IndexAction::Move(Direction::Up)));
        assert_eq!(index_action(key("s")), None);
    }

    #[test]
    fn test_first_press_selects_first_card() {
        assert_eq!(move_selection(None, Direction::Down, 4, 10), Some(0));
        assert_eq!(move_selection(None, Direction::Left, 4, 0), None);
    }

    #[test]
    fn test_grid_movement_uses_columns() {
        // 4 columns, 10 cards:
        // 0 1 2 3
        // 4 5 6 7
        // 8 9
        assert_eq!(move_selection(Some(1), Direction::Down, 4, 10), Some(5));
        assert_eq!(move_selection(Some(5), Direction::Down, 4, 10), Some(9));
        assert_eq!(move_selection(Some(6), Direction::Down, 4, 10), Some(6));
        assert_eq!(move_selection(Some(2), Direction::Up, 4, 10), Some(2));
        assert_eq!(move_selection(Some(9), Direction::Up, 4, 10), Some(5));
        assert_eq!(move_selection(Some(0), Direction::Left, 4, 10), Some(0));
        assert_eq!(move_selection(Some(3), Direction::Right, 4, 10), Some(4));
        assert_eq!(move_selection(Some(9), Direction::Right, 4, 10), Some(9));
    }

    #[test]
    fn test_stale_selection_restarts() {
        assert_eq!(move_selection(Some(12), Direction::Right, 3, 5), Some(0));
        assert_eq!(move_selection(Some(2), Direction::Down, 0, 5), Some(3));
    }
}
