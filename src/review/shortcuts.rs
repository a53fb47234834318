//! レビュー画面のキーボードショートカット

use crate::keyboard::{Key, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Approve,
    Edit,
    Skip,
    Flag,
}

impl Shortcut {
    /// 大文字小文字は区別しない。テキスト入力中のキーは対象外。
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        if event.is_text_entry() {
            return None;
        }
        match event.key {
            Key::Char(c) => match c.to_ascii_lowercase() {
                'a' => Some(Shortcut::Approve),
                'e' => Some(Shortcut::Edit),
                's' => Some(Shortcut::Skip),
                'f' => Some(Shortcut::Flag),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn key_hint(&self) -> char {
        match self {
            Shortcut::Approve => 'A',
            Shortcut::Edit => 'E',
            Shortcut::Skip => 'S',
            Shortcut::Flag => 'F',
        }
    }
}
