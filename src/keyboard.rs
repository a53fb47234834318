//! キー入力とキーボードリスナーの購読
//!
//! リスナーは `Subscription` を保持している間だけ登録され、
//! drop で必ず解除される。

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
    Escape,
    Enter,
    Other,
}

/// キー入力を受けた要素の種類
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyTarget {
    #[default]
    Document,
    /// input / textarea / select / contenteditable
    TextEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub target: KeyTarget,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            target: KeyTarget::Document,
        }
    }

    pub fn char(c: char) -> Self {
        Self {
            shift: c.is_uppercase(),
            ..Self::new(Key::Char(c))
        }
    }

    pub fn tab() -> Self {
        Self::new(Key::Tab)
    }

    pub fn shift_tab() -> Self {
        Self {
            shift: true,
            ..Self::new(Key::Tab)
        }
    }

    pub fn escape() -> Self {
        Self::new(Key::Escape)
    }

    /// テキスト入力中に発生したキー
    pub fn in_text_entry(mut self) -> Self {
        self.target = KeyTarget::TextEntry;
        self
    }

    pub fn is_text_entry(&self) -> bool {
        self.target == KeyTarget::TextEntry
    }
}

/// キーボードリスナーの登録先
///
/// 登録の生存期間だけを管理する。キーの配送はしない（呼び出し側が
/// 購読中のコントローラーへ直接渡す）。
#[derive(Debug, Clone, Default)]
pub struct KeyboardHub {
    inner: Arc<Mutex<HubState>>,
}

#[derive(Debug, Default)]
struct HubState {
    next_id: u64,
    listeners: BTreeSet<u64>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, owner: &'static str) -> Subscription {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.next_id += 1;
        let id = state.next_id;
        state.listeners.insert(id);
        tracing::debug!(owner, id, "keyboard listener attached");
        Subscription {
            hub: Arc::clone(&self.inner),
            id,
            owner,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .listeners
            .len()
    }
}

/// drop で登録解除
#[derive(Debug)]
pub struct Subscription {
    hub: Arc<Mutex<HubState>>,
    id: u64,
    owner: &'static str,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut state = self.hub.lock().unwrap_or_else(|e| e.into_inner());
        state.listeners.remove(&self.id);
        tracing::debug!(owner = self.owner, id = self.id, "keyboard listener detached");
    }
}
