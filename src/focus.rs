//! フォーカストラップ
//!
//! ダイアログを開くときに `FocusRing::trap` でスコープを取得する。
//! - 初期フォーカスは指定要素（なければ先頭のフォーカス可能要素）
//! - Tab / Shift+Tab はダイアログ内を循環
//! - Escape は呼び出し元へ通知（閉じるかどうかは呼び出し元が決める）
//! - `FocusScope` が drop されると、戻り先（なければ開く前の要素）へフォーカスを戻す

use crate::keyboard::{Key, KeyEvent};
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// フォーカス可能な要素の識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusId(Cow<'static, str>);

impl FocusId {
    pub const fn from_static(name: &'static str) -> Self {
        FocusId(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        FocusId(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// トラップの定義
#[derive(Debug, Clone, Default)]
pub struct TrapSpec {
    /// ダイアログ内のフォーカス可能要素（表示順）
    pub focusables: Vec<FocusId>,
    pub initial: Option<FocusId>,
    pub return_to: Option<FocusId>,
}

/// トラップ中のキー処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrapResponse {
    /// トラップなし、または対象外のキー
    Ignored,
    /// Tab をダイアログ内で処理した
    Moved(Option<FocusId>),
    Escape,
}

#[derive(Debug)]
struct Frame {
    id: u64,
    previous: Option<FocusId>,
    return_to: Option<FocusId>,
    focusables: Vec<FocusId>,
}

#[derive(Debug, Default)]
struct FocusState {
    active: Option<FocusId>,
    frames: Vec<Frame>,
    next_frame: u64,
}

impl FocusState {
    fn release(&mut self, frame_id: u64) {
        let Some(pos) = self.frames.iter().position(|f| f.id == frame_id) else {
            return;
        };
        // 内側のトラップもまとめて解放
        let released: Vec<Frame> = self.frames.drain(pos..).collect();
        if let Some(frame) = released.into_iter().next() {
            self.active = frame.return_to.or(frame.previous);
        }
    }

    fn cycle(&mut self, backwards: bool) -> TrapResponse {
        let Some(frame) = self.frames.last() else {
            return TrapResponse::Ignored;
        };
        if frame.focusables.is_empty() {
            return TrapResponse::Moved(self.active.clone());
        }

        let len = frame.focusables.len();
        let current = self
            .active
            .as_ref()
            .and_then(|a| frame.focusables.iter().position(|f| f == a));

        let next = match (current, backwards) {
            (None, false) => 0,
            (None, true) => len - 1,
            (Some(i), false) => (i + 1) % len,
            (Some(i), true) => (i + len - 1) % len,
        };
        self.active = Some(frame.focusables[next].clone());
        TrapResponse::Moved(self.active.clone())
    }
}

/// 共有フォーカス状態
#[derive(Debug, Clone, Default)]
pub struct FocusRing {
    inner: Arc<Mutex<FocusState>>,
}

impl FocusRing {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FocusState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn active(&self) -> Option<FocusId> {
        self.state().active.clone()
    }

    pub fn focus(&self, id: FocusId) {
        self.state().active = Some(id);
    }

    pub fn blur(&self) {
        self.state().active = None;
    }

    /// 現在のトラップの深さ
    pub fn depth(&self) -> usize {
        self.state().frames.len()
    }

    pub fn trap(&self, spec: TrapSpec) -> FocusScope {
        let mut state = self.state();
        state.next_frame += 1;
        let id = state.next_frame;

        let previous = state.active.clone();
        let initial = spec
            .initial
            .clone()
            .or_else(|| spec.focusables.first().cloned());
        if let Some(target) = initial {
            state.active = Some(target);
        }

        state.frames.push(Frame {
            id,
            previous,
            return_to: spec.return_to,
            focusables: spec.focusables,
        });

        FocusScope {
            ring: self.clone(),
            frame_id: id,
        }
    }

    /// 最前面のトラップにキーを渡す
    pub fn handle_key(&self, event: &KeyEvent) -> TrapResponse {
        let mut state = self.state();
        if state.frames.is_empty() {
            return TrapResponse::Ignored;
        }
        match event.key {
            Key::Escape => TrapResponse::Escape,
            Key::Tab => state.cycle(event.shift),
            _ => TrapResponse::Ignored,
        }
    }
}

/// トラップの保持期間。drop でフォーカスを戻す。
#[derive(Debug)]
pub struct FocusScope {
    ring: FocusRing,
    frame_id: u64,
}

impl FocusScope {
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }
}

impl Drop for FocusScope {
    fn drop(&mut self) {
        self.ring.state().release(self.frame_id);
    }
}
