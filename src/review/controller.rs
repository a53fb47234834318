//! レビューセッションのコントローラー
//!
//! 状態遷移だけを持ち、通信は `Command` として返す。結果はチケット付きで
//! `on_*` に戻す。古いチケットの結果と dispose 後の結果は捨てる。

use super::dialogs::{FlagDialog, FlagDraft, Overlay, SkipDialog};
use super::shortcuts::Shortcut;
use super::state::{
    approved_message, edited_message, Command, IdleReason, Notice, PendingAction, Phase,
    ReviewError, Ticket, FLAGGED_MESSAGE, SKIPPED_CORRECT_MESSAGE, SKIPPED_MESSAGE,
};
use crate::config::AdvanceDelays;
use crate::error::ApiError;
use crate::focus::{FocusRing, TrapResponse};
use crate::keyboard::{KeyEvent, KeyboardHub, Subscription};
use review_desk_common::{
    Content, DatasetTypeSchema, FlagReason, FlagRequest, NextItemResponse, ReviewOutcome,
    ReviewSubmission, SystemConfig, WorkItem,
};
use serde_json::Value;
use std::time::Duration;

const SHORTCUT_OWNER: &str = "review-shortcuts";

/// 取得エラーのうちキュー切れを示す文言
const NO_ITEMS_MARKER: &str = "No items";

pub struct ReviewController {
    phase: Phase,
    item: Option<WorkItem>,
    schema: Option<DatasetTypeSchema>,
    draft: Option<Content>,
    overlay: Option<Overlay>,
    skip_data_correct: bool,
    notice: Option<Notice>,
    config: SystemConfig,
    delays: AdvanceDelays,
    next_ticket: u64,
    in_flight: Option<Ticket>,
    pending_advance: Option<Ticket>,
    disposed: bool,
    keyboard: KeyboardHub,
    focus: FocusRing,
    /// Ready かつダイアログなしの間だけ保持
    shortcuts: Option<Subscription>,
}

impl ReviewController {
    pub fn new(delays: AdvanceDelays, keyboard: KeyboardHub, focus: FocusRing) -> Self {
        Self {
            phase: Phase::Idle(IdleReason::NotStarted),
            item: None,
            schema: None,
            draft: None,
            overlay: None,
            skip_data_correct: false,
            notice: None,
            config: SystemConfig::default(),
            delays,
            next_ticket: 0,
            in_flight: None,
            pending_advance: None,
            disposed: false,
            keyboard,
            focus,
            shortcuts: None,
        }
    }

    // ---- 参照 ----

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn item(&self) -> Option<&WorkItem> {
        self.item.as_ref()
    }

    pub fn schema(&self) -> Option<&DatasetTypeSchema> {
        self.schema.as_ref()
    }

    /// 編集中の内容
    pub fn draft(&self) -> Option<&Content> {
        self.draft.as_ref()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn skip_feedback(&self) -> Option<&str> {
        match &self.overlay {
            Some(Overlay::SkipFeedback(dialog)) => Some(dialog.feedback.as_str()),
            _ => None,
        }
    }

    pub fn flag_draft(&self) -> Option<&FlagDraft> {
        match &self.overlay {
            Some(Overlay::Flag(dialog)) => Some(&dialog.draft),
            _ => None,
        }
    }

    pub fn skip_data_correct(&self) -> bool {
        self.skip_data_correct
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// 承認・編集・スキップ・フラグのボタンが押せるか
    pub fn actions_enabled(&self) -> bool {
        self.can_act()
    }

    pub fn shortcuts_active(&self) -> bool {
        self.shortcuts.is_some()
    }

    // ---- 内部 ----

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn can_act(&self) -> bool {
        !self.disposed
            && self.phase == Phase::Ready
            && self.overlay.is_none()
            && self.item.is_some()
    }

    fn dialog_editable(&self) -> bool {
        !self.disposed && self.phase == Phase::Ready
    }

    fn accepts(&self, ticket: Ticket) -> bool {
        !self.disposed && self.in_flight == Some(ticket)
    }

    /// ショートカットの購読を現在の状態に合わせる
    fn settle(&mut self) {
        let bind = self.can_act();
        if bind && self.shortcuts.is_none() {
            self.shortcuts = Some(self.keyboard.subscribe(SHORTCUT_OWNER));
        } else if !bind {
            self.shortcuts = None;
        }
    }

    fn current_item_id(&self) -> Option<String> {
        self.item.as_ref().map(|item| item.id.clone())
    }

    fn begin_fetch(&mut self) -> Vec<Command> {
        let ticket = self.issue_ticket();
        self.in_flight = Some(ticket);
        self.pending_advance = None;
        self.phase = Phase::Loading;
        self.notice = None;
        self.draft = None;
        self.overlay = None;
        self.settle();
        vec![Command::FetchNext { ticket }]
    }

    fn begin_submit(&mut self, action: PendingAction, submission: ReviewSubmission) -> Vec<Command> {
        let ticket = self.issue_ticket();
        self.in_flight = Some(ticket);
        self.phase = Phase::Submitting(action);
        self.notice = None;
        self.settle();
        tracing::info!(
            item_id = %submission.item_id,
            action = submission.action.as_str(),
            "submitting review"
        );
        vec![Command::SubmitReview { ticket, submission }]
    }

    fn advance(&mut self, message: String, after: Duration) -> Vec<Command> {
        self.notice = Some(Notice::Success(message));
        self.phase = Phase::Advancing;
        let ticket = self.issue_ticket();
        self.pending_advance = Some(ticket);
        self.settle();
        vec![
            Command::RefreshIdentity,
            Command::ScheduleAdvance { ticket, after },
        ]
    }

    // ---- 取得 ----

    /// システム設定を取りに行く（失敗時は既定値のまま）
    pub fn start(&mut self) -> Vec<Command> {
        if self.disposed {
            return Vec::new();
        }
        vec![Command::FetchConfig]
    }

    pub fn on_config(&mut self, result: Result<SystemConfig, ApiError>) -> Vec<Command> {
        if self.disposed {
            return Vec::new();
        }
        match result {
            Ok(config) => {
                tracing::debug!(
                    threshold = config.skip_prompt_threshold(),
                    "system config loaded"
                );
                self.config = config;
            }
            Err(err) => tracing::warn!(error = %err, "failed to load system config, using defaults"),
        }
        Vec::new()
    }

    pub fn fetch_next(&mut self) -> Vec<Command> {
        if self.disposed {
            return Vec::new();
        }
        let allowed = match self.phase {
            Phase::Idle(_) | Phase::Advancing => true,
            Phase::Ready => self.overlay.is_none(),
            Phase::Loading | Phase::Editing | Phase::Submitting(_) => false,
        };
        if !allowed {
            return Vec::new();
        }
        self.begin_fetch()
    }

    pub fn on_next_item(
        &mut self,
        ticket: Ticket,
        result: Result<NextItemResponse, ApiError>,
    ) -> Vec<Command> {
        if !self.accepts(ticket) || self.phase != Phase::Loading {
            tracing::debug!(?ticket, "stale next-item result dropped");
            return Vec::new();
        }
        self.in_flight = None;

        let mut commands = Vec::new();
        match result {
            Ok(NextItemResponse::Item(item)) => {
                let type_id = item.dataset_type_id.clone();
                let cached = self.schema.as_ref().is_some_and(|s| s.id == type_id);
                if !type_id.is_empty() && !cached {
                    self.schema = None;
                    commands.push(Command::FetchSchema {
                        dataset_type_id: type_id,
                    });
                }
                tracing::info!(item_id = %item.id, "item loaded");
                self.item = Some(item);
                self.skip_data_correct = false;
                self.phase = Phase::Ready;
            }
            Ok(NextItemResponse::Empty { message }) => {
                tracing::info!(%message, "review queue is empty");
                self.item = None;
                self.phase = Phase::Idle(IdleReason::QueueExhausted);
                self.notice = Some(Notice::Error(ReviewError::QueueExhausted(message)));
            }
            // 404 {"detail": "No items available"} もキュー切れ
            Err(err) if err.message.contains(NO_ITEMS_MARKER) => {
                tracing::info!(status = ?err.status, message = %err.message, "review queue is empty");
                self.item = None;
                self.phase = Phase::Idle(IdleReason::QueueExhausted);
                self.notice = Some(Notice::Error(ReviewError::QueueExhausted(err.message)));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch next item");
                self.item = None;
                self.phase = Phase::Idle(IdleReason::FetchFailed);
                self.notice = Some(Notice::Error(ReviewError::FetchFailed(err.message)));
            }
        }
        self.settle();
        commands
    }

    /// 表示中アイテムの種別と一致する場合のみ反映
    pub fn on_schema(
        &mut self,
        dataset_type_id: &str,
        result: Result<DatasetTypeSchema, ApiError>,
    ) -> Vec<Command> {
        if self.disposed {
            return Vec::new();
        }
        let current = self
            .item
            .as_ref()
            .is_some_and(|item| item.dataset_type_id == dataset_type_id);
        match result {
            Ok(schema) if current => self.schema = Some(schema),
            Ok(_) => tracing::debug!(dataset_type_id, "schema for previous item dropped"),
            Err(err) => tracing::warn!(error = %err, dataset_type_id, "failed to load dataset schema"),
        }
        Vec::new()
    }

    // ---- 承認・編集 ----

    pub fn approve(&mut self) -> Vec<Command> {
        if !self.can_act() {
            return Vec::new();
        }
        let Some(item_id) = self.current_item_id() else {
            return Vec::new();
        };
        self.begin_submit(PendingAction::Approve, ReviewSubmission::approve(item_id))
    }

    /// 現在の内容をコピーして編集を開始
    pub fn edit(&mut self) -> Vec<Command> {
        if !self.can_act() {
            return Vec::new();
        }
        self.draft = self.item.as_ref().map(|item| item.content.clone());
        self.phase = Phase::Editing;
        self.settle();
        Vec::new()
    }

    pub fn set_field(&mut self, key: &str, value: Value) -> bool {
        if self.disposed || self.phase != Phase::Editing {
            return false;
        }
        match self.draft.as_mut() {
            Some(draft) => {
                draft.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn save_edit(&mut self) -> Vec<Command> {
        if self.disposed || self.phase != Phase::Editing {
            return Vec::new();
        }
        let (Some(item_id), Some(draft)) = (self.current_item_id(), self.draft.clone()) else {
            return Vec::new();
        };
        self.begin_submit(PendingAction::Edit, ReviewSubmission::edit(item_id, draft))
    }

    pub fn cancel_edit(&mut self) -> Vec<Command> {
        if self.disposed || self.phase != Phase::Editing {
            return Vec::new();
        }
        self.draft = None;
        self.phase = Phase::Ready;
        self.settle();
        Vec::new()
    }

    // ---- スキップ ----

    /// 「データは正しい」チェックボックス
    pub fn set_skip_data_correct(&mut self, checked: bool) -> bool {
        if !self.can_act() {
            return false;
        }
        self.skip_data_correct = checked;
        true
    }

    /// スキップボタン。未チェックのスキップが閾値に達していればフィードバックを求める。
    pub fn skip_click(&mut self) -> Vec<Command> {
        if !self.can_act() {
            return Vec::new();
        }
        let unchecked = self.item.as_ref().map_or(0, WorkItem::unchecked_skips);
        if self
            .config
            .requires_skip_feedback(unchecked, self.skip_data_correct)
        {
            tracing::debug!(unchecked, "asking for skip feedback");
            self.overlay = Some(Overlay::SkipFeedback(SkipDialog::open(&self.focus)));
            self.settle();
            return Vec::new();
        }
        self.skip()
    }

    /// フィードバックなしでスキップを送信
    pub fn skip(&mut self) -> Vec<Command> {
        if !self.can_act() {
            return Vec::new();
        }
        let Some(item_id) = self.current_item_id() else {
            return Vec::new();
        };
        let data_correct = self.skip_data_correct;
        self.begin_submit(
            PendingAction::Skip { data_correct },
            ReviewSubmission::skip(item_id, data_correct, None),
        )
    }

    pub fn set_skip_feedback(&mut self, text: &str) -> bool {
        if !self.dialog_editable() {
            return false;
        }
        match self.overlay.as_mut() {
            Some(Overlay::SkipFeedback(dialog)) => {
                dialog.feedback = text.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn submit_skip_feedback(&mut self) -> Vec<Command> {
        if !self.dialog_editable() {
            return Vec::new();
        }
        let feedback = match &self.overlay {
            Some(Overlay::SkipFeedback(dialog)) => dialog.feedback.clone(),
            _ => return Vec::new(),
        };
        let Some(item_id) = self.current_item_id() else {
            return Vec::new();
        };
        let data_correct = self.skip_data_correct;
        self.begin_submit(
            PendingAction::Skip { data_correct },
            ReviewSubmission::skip(item_id, data_correct, Some(feedback)),
        )
    }

    /// 送信中は閉じられない
    pub fn cancel_skip_feedback(&mut self) -> Vec<Command> {
        if !self.dialog_editable() {
            return Vec::new();
        }
        if self.overlay.as_ref().is_some_and(Overlay::is_skip_feedback) {
            self.overlay = None;
            self.settle();
        }
        Vec::new()
    }

    // ---- フラグ ----

    pub fn open_flag(&mut self) -> Vec<Command> {
        if !self.can_act() {
            return Vec::new();
        }
        self.overlay = Some(Overlay::Flag(FlagDialog::open(&self.focus)));
        self.settle();
        Vec::new()
    }

    fn flag_dialog_mut(&mut self) -> Option<&mut FlagDraft> {
        if !self.dialog_editable() {
            return None;
        }
        match self.overlay.as_mut() {
            Some(Overlay::Flag(dialog)) => Some(&mut dialog.draft),
            _ => None,
        }
    }

    pub fn set_flag_reason(&mut self, reason: FlagReason) -> bool {
        match self.flag_dialog_mut() {
            Some(draft) => {
                draft.reason = reason;
                true
            }
            None => false,
        }
    }

    pub fn set_flag_note(&mut self, note: &str) -> bool {
        match self.flag_dialog_mut() {
            Some(draft) => {
                draft.note = note.to_string();
                true
            }
            None => false,
        }
    }

    pub fn submit_flag(&mut self) -> Vec<Command> {
        if !self.dialog_editable() {
            return Vec::new();
        }
        let Some(item_id) = self.current_item_id() else {
            return Vec::new();
        };
        let request = match &self.overlay {
            Some(Overlay::Flag(dialog)) => {
                FlagRequest::new(item_id, dialog.draft.reason, &dialog.draft.note)
            }
            _ => return Vec::new(),
        };

        let ticket = self.issue_ticket();
        self.in_flight = Some(ticket);
        self.phase = Phase::Submitting(PendingAction::Flag);
        self.notice = None;
        self.settle();
        tracing::info!(item_id = %request.item_id, reason = %request.reason, "flagging item");
        vec![Command::FlagItem { ticket, request }]
    }

    pub fn cancel_flag(&mut self) -> Vec<Command> {
        if !self.dialog_editable() {
            return Vec::new();
        }
        if self.overlay.as_ref().is_some_and(Overlay::is_flag) {
            self.overlay = None;
            self.settle();
        }
        Vec::new()
    }

    // ---- 送信結果 ----

    pub fn on_submit(&mut self, ticket: Ticket, result: Result<ReviewOutcome, ApiError>) -> Vec<Command> {
        if !self.accepts(ticket) {
            tracing::debug!(?ticket, "stale submit result dropped");
            return Vec::new();
        }
        let action = match self.phase {
            Phase::Submitting(action) if action != PendingAction::Flag => action,
            _ => return Vec::new(),
        };
        self.in_flight = None;

        match result {
            Ok(outcome) => {
                let (message, after) = match action {
                    PendingAction::Edit => {
                        self.draft = None;
                        (edited_message(outcome.payout_amount), self.delays.approve)
                    }
                    PendingAction::Skip { data_correct, .. } => {
                        let message = if data_correct {
                            SKIPPED_CORRECT_MESSAGE
                        } else {
                            SKIPPED_MESSAGE
                        };
                        (message.to_string(), self.delays.skip)
                    }
                    PendingAction::Approve | PendingAction::Flag => {
                        (approved_message(outcome.payout_amount), self.delays.approve)
                    }
                };
                self.overlay = None;
                self.skip_data_correct = false;
                self.advance(message, after)
            }
            Err(err) => {
                tracing::warn!(error = %err, status = ?err.status, "review submission failed");
                self.phase = if action == PendingAction::Edit {
                    Phase::Editing
                } else {
                    Phase::Ready
                };
                self.notice = Some(Notice::Error(ReviewError::SubmitFailed(err.message)));
                self.settle();
                Vec::new()
            }
        }
    }

    pub fn on_flag(&mut self, ticket: Ticket, result: Result<(), ApiError>) -> Vec<Command> {
        if !self.accepts(ticket) || self.phase != Phase::Submitting(PendingAction::Flag) {
            tracing::debug!(?ticket, "stale flag result dropped");
            return Vec::new();
        }
        self.in_flight = None;

        match result {
            Ok(()) => {
                self.overlay = None;
                self.advance(FLAGGED_MESSAGE.to_string(), self.delays.flag)
            }
            Err(err) => {
                tracing::warn!(error = %err, status = ?err.status, "flag submission failed");
                self.phase = Phase::Ready;
                self.notice = Some(Notice::Error(ReviewError::SubmitFailed(err.message)));
                self.settle();
                Vec::new()
            }
        }
    }

    /// 待ち時間経過後に次のアイテムを取得
    pub fn on_advance_due(&mut self, ticket: Ticket) -> Vec<Command> {
        if self.disposed
            || self.pending_advance != Some(ticket)
            || self.phase != Phase::Advancing
        {
            return Vec::new();
        }
        self.begin_fetch()
    }

    // ---- キーボード ----

    pub fn handle_key(&mut self, event: &KeyEvent) -> Vec<Command> {
        if self.disposed {
            return Vec::new();
        }

        if let Some(overlay) = &self.overlay {
            let is_flag = overlay.is_flag();
            return match self.focus.handle_key(event) {
                TrapResponse::Escape if is_flag => self.cancel_flag(),
                TrapResponse::Escape => self.cancel_skip_feedback(),
                TrapResponse::Moved(_) | TrapResponse::Ignored => Vec::new(),
            };
        }

        if self.shortcuts.is_none() {
            return Vec::new();
        }
        match Shortcut::from_event(event) {
            Some(Shortcut::Approve) => self.approve(),
            Some(Shortcut::Edit) => self.edit(),
            Some(Shortcut::Skip) => self.skip_click(),
            Some(Shortcut::Flag) => self.open_flag(),
            None => Vec::new(),
        }
    }

    /// 画面を離れた。以降の結果はすべて無視する。
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        tracing::debug!("review controller disposed");
        self.disposed = true;
        self.in_flight = None;
        self.pending_advance = None;
        self.overlay = None;
        self.settle();
    }
}
