//! レビューセッション
//!
//! - controller: 状態遷移（通信なし）
//! - runtime: コマンドの実行
//! - dialogs: スキップフィードバック / フラグ
//! - shortcuts: A / E / S / F

mod controller;
pub mod dialogs;
mod runtime;
mod shortcuts;
mod state;

pub use controller::ReviewController;
pub use dialogs::{FlagDraft, Overlay};
pub use runtime::{ReviewSession, RuntimeOptions};
pub use shortcuts::Shortcut;
pub use state::{
    Command, IdleReason, Notice, PendingAction, Phase, ReviewError, Ticket, FLAGGED_MESSAGE,
    SKIPPED_CORRECT_MESSAGE, SKIPPED_MESSAGE,
};
