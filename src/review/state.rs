//! レビューセッションの状態・コマンド・エラー

use review_desk_common::{FlagRequest, ReviewSubmission};
use std::time::Duration;
use thiserror::Error;

/// アイテムが読み込まれていない理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    NotStarted,
    QueueExhausted,
    FetchFailed,
}

/// 送信中のアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Approve,
    Edit,
    Skip { data_correct: bool },
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle(IdleReason),
    Loading,
    Ready,
    Editing,
    Submitting(PendingAction),
    /// 送信成功後、次のアイテムを取りに行くまでの待ち
    Advancing,
}

/// ユーザーに表示するエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("{0}")]
    QueueExhausted(String),

    #[error("{0}")]
    FetchFailed(String),

    #[error("{0}")]
    SubmitFailed(String),
}

impl ReviewError {
    /// キューが空の場合は再試行しても意味がない
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ReviewError::QueueExhausted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(ReviewError),
}

/// サーバー応答を対応付けるための番号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub(crate) u64);

/// コントローラーが実行を依頼する副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchConfig,
    FetchNext {
        ticket: Ticket,
    },
    FetchSchema {
        dataset_type_id: String,
    },
    SubmitReview {
        ticket: Ticket,
        submission: ReviewSubmission,
    },
    FlagItem {
        ticket: Ticket,
        request: FlagRequest,
    },
    /// 結果は使わない
    RefreshIdentity,
    ScheduleAdvance {
        ticket: Ticket,
        after: Duration,
    },
}

pub fn approved_message(payout: f64) -> String {
    format!("Approved! Earned ${:.3}", payout)
}

pub fn edited_message(payout: f64) -> String {
    format!("Edited! Earned ${:.3}", payout)
}

pub const SKIPPED_CORRECT_MESSAGE: &str = "Marked as correct data";
pub const SKIPPED_MESSAGE: &str = "Skipped item";
pub const FLAGGED_MESSAGE: &str = "Item flagged successfully";
