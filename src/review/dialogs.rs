//! スキップフィードバック / フラグ ダイアログ
//!
//! どちらも開いている間はフォーカストラップを保持し、閉じる（drop）と
//! 開く直前にフォーカスしていた要素へ戻る。

use crate::focus::{FocusId, FocusRing, FocusScope, TrapSpec};
use review_desk_common::FlagReason;

pub const SKIP_BUTTON: FocusId = FocusId::from_static("skip-button");
pub const FLAG_BUTTON: FocusId = FocusId::from_static("flag-button");

pub const SKIP_CLOSE: FocusId = FocusId::from_static("skip-close");
pub const SKIP_FEEDBACK: FocusId = FocusId::from_static("skip-feedback");
pub const SKIP_SUBMIT: FocusId = FocusId::from_static("skip-submit");
pub const SKIP_CANCEL: FocusId = FocusId::from_static("skip-cancel");

pub const FLAG_CLOSE: FocusId = FocusId::from_static("flag-close");
pub const FLAG_REASON: FocusId = FocusId::from_static("flag-reason");
pub const FLAG_NOTE: FocusId = FocusId::from_static("flag-note");
pub const FLAG_SUBMIT: FocusId = FocusId::from_static("flag-submit");
pub const FLAG_CANCEL: FocusId = FocusId::from_static("flag-cancel");

#[derive(Debug)]
pub struct SkipDialog {
    pub feedback: String,
    _scope: FocusScope,
}

impl SkipDialog {
    pub fn open(focus: &FocusRing) -> Self {
        let scope = focus.trap(TrapSpec {
            focusables: vec![SKIP_CLOSE, SKIP_FEEDBACK, SKIP_SUBMIT, SKIP_CANCEL],
            initial: Some(SKIP_FEEDBACK),
            return_to: None,
        });
        Self {
            feedback: String::new(),
            _scope: scope,
        }
    }
}

/// フラグ入力（理由は unclear から始まる）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagDraft {
    pub reason: FlagReason,
    pub note: String,
}

#[derive(Debug)]
pub struct FlagDialog {
    pub draft: FlagDraft,
    _scope: FocusScope,
}

impl FlagDialog {
    pub fn open(focus: &FocusRing) -> Self {
        let scope = focus.trap(TrapSpec {
            focusables: vec![FLAG_CLOSE, FLAG_REASON, FLAG_NOTE, FLAG_SUBMIT, FLAG_CANCEL],
            initial: Some(FLAG_REASON),
            return_to: None,
        });
        Self {
            draft: FlagDraft::default(),
            _scope: scope,
        }
    }
}

#[derive(Debug)]
pub enum Overlay {
    SkipFeedback(SkipDialog),
    Flag(FlagDialog),
}

impl Overlay {
    pub fn is_skip_feedback(&self) -> bool {
        matches!(self, Overlay::SkipFeedback(_))
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Overlay::Flag(_))
    }
}
