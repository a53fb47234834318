//! コントローラーのコマンドを実際に実行する非同期ランナー
//!
//! 各リクエストにはタイムアウトを掛ける。ユーザー情報の再取得は待たずに
//! バックグラウンドで流す。

use super::controller::ReviewController;
use super::state::Command;
use crate::api::Gateway;
use crate::config::AdvanceDelays;
use crate::error::{ApiError, Result};
use crate::focus::FocusRing;
use crate::keyboard::KeyboardHub;
use crate::session::SessionStore;
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub delays: AdvanceDelays,
    pub request_timeout: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            delays: AdvanceDelays::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

type Observer = Box<dyn FnMut(&ReviewController) + Send>;

pub struct ReviewSession<G: Gateway + 'static> {
    controller: ReviewController,
    observer: Option<Observer>,
    session: SessionStore<G>,
    request_timeout: Duration,
    keyboard: KeyboardHub,
    focus: FocusRing,
}

impl<G: Gateway + 'static> ReviewSession<G> {
    pub fn new(session: SessionStore<G>, options: RuntimeOptions) -> Self {
        let keyboard = KeyboardHub::new();
        let focus = FocusRing::new();
        Self {
            controller: ReviewController::new(options.delays, keyboard.clone(), focus.clone()),
            observer: None,
            session,
            request_timeout: options.request_timeout,
            keyboard,
            focus,
        }
    }

    pub fn controller(&self) -> &ReviewController {
        &self.controller
    }

    pub fn session(&self) -> &SessionStore<G> {
        &self.session
    }

    pub fn keyboard(&self) -> &KeyboardHub {
        &self.keyboard
    }

    pub fn focus(&self) -> &FocusRing {
        &self.focus
    }

    /// 状態が変わるたびに呼ばれる（表示の更新用）
    pub fn observe(&mut self, observer: impl FnMut(&ReviewController) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.controller);
        }
    }

    /// 設定を読み込む（アイテム取得はしない）
    pub async fn start(&mut self) {
        let commands = self.controller.start();
        self.run(commands).await;
    }

    /// コントローラーを操作し、返ってきたコマンドを完了まで実行する
    pub async fn dispatch<F>(&mut self, op: F)
    where
        F: FnOnce(&mut ReviewController) -> Vec<Command>,
    {
        let commands = op(&mut self.controller);
        self.notify();
        self.run(commands).await;
    }

    /// 値を返すだけの操作（入力欄の更新など）
    pub fn update<T>(&mut self, op: impl FnOnce(&mut ReviewController) -> T) -> T {
        let out = op(&mut self.controller);
        self.notify();
        out
    }

    pub fn dispose(&mut self) {
        self.controller.dispose();
        self.notify();
    }

    pub async fn run(&mut self, commands: Vec<Command>) {
        let mut queue: VecDeque<Command> = commands.into();

        while let Some(command) = queue.pop_front() {
            let api = self.session.api().clone();
            let follow_up = match command {
                Command::FetchConfig => {
                    let result = timed(self.request_timeout, api.system_config()).await;
                    self.controller.on_config(result)
                }
                Command::FetchNext { ticket } => {
                    let languages = self.session.review_languages();
                    let result = timed(self.request_timeout, api.next_item(&languages)).await;
                    self.controller.on_next_item(ticket, result)
                }
                Command::FetchSchema { dataset_type_id } => {
                    let result = timed(self.request_timeout, api.dataset_type_schema(&dataset_type_id)).await;
                    self.controller.on_schema(&dataset_type_id, result)
                }
                Command::SubmitReview { ticket, submission } => {
                    let result = timed(self.request_timeout, api.submit_review(&submission)).await;
                    self.controller.on_submit(ticket, result)
                }
                Command::FlagItem { ticket, request } => {
                    let result = timed(self.request_timeout, api.flag_item(&request)).await;
                    self.controller.on_flag(ticket, result)
                }
                Command::RefreshIdentity => {
                    let session = self.session.clone();
                    tokio::spawn(async move {
                        session.refresh_user().await;
                    });
                    Vec::new()
                }
                Command::ScheduleAdvance { ticket, after } => {
                    tokio::time::sleep(after).await;
                    self.controller.on_advance_due(ticket)
                }
            };
            self.notify();
            queue.extend(follow_up);
        }
    }
}

async fn timed<T, Fut>(limit: Duration, fut: Fut) -> std::result::Result<T, ApiError>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.into_api_error()),
        Err(_) => Err(ApiError::timeout(limit)),
    }
}
