//! ログインセッション（現在のユーザー・読み込み中フラグ・一度だけ表示する通知）

use crate::api::{Gateway, ReviewApi};
use crate::error::Result;
use review_desk_common::{RegisterRequest, ReviewerStats, UserProfile};
use std::sync::{Arc, Mutex, MutexGuard};

pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please log in again.";

#[derive(Debug, Clone, Default)]
struct SessionState {
    user: Option<UserProfile>,
    loading: bool,
    notice: Option<String>,
}

/// 複製しても同じセッションを指す
pub struct SessionStore<G> {
    api: Arc<ReviewApi<G>>,
    state: Arc<Mutex<SessionState>>,
}

impl<G> Clone for SessionStore<G> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
        }
    }
}

impl<G: Gateway> SessionStore<G> {
    pub fn new(api: Arc<ReviewApi<G>>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SessionState {
                loading: true,
                ..Default::default()
            })),
        }
    }

    pub fn api(&self) -> &Arc<ReviewApi<G>> {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 保存済みトークンからユーザーを復元
    pub async fn restore(&self) -> Option<UserProfile> {
        if !self.api.has_token() {
            self.state().loading = false;
            return None;
        }

        match self.api.me().await {
            Ok(profile) => {
                let mut state = self.state();
                state.user = Some(profile.clone());
                state.loading = false;
                Some(profile)
            }
            Err(err) if err.status() == Some(401) => {
                tracing::info!("stored token rejected, logging out");
                self.logout(SESSION_EXPIRED_NOTICE);
                self.state().loading = false;
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch profile");
                if let Err(e) = self.api.logout() {
                    tracing::warn!(error = %e, "failed to clear token");
                }
                let mut state = self.state();
                state.user = None;
                state.loading = false;
                None
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        self.api.login(username, password).await?;
        let profile = self.api.me().await?;
        let mut state = self.state();
        state.notice = None;
        state.user = Some(profile.clone());
        state.loading = false;
        Ok(profile)
    }

    /// 登録後、同じ資格情報でログインする
    pub async fn register(&self, data: &RegisterRequest) -> Result<UserProfile> {
        self.api.register(data).await?;
        self.login(&data.username, &data.password).await
    }

    pub fn logout(&self, message: &str) {
        if let Err(e) = self.api.logout() {
            tracing::warn!(error = %e, "failed to clear token");
        }
        let mut state = self.state();
        state.notice = if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        };
        state.user = None;
    }

    /// 残高・レビュー数を再取得（失敗しても現在のユーザーを保持）
    pub async fn refresh_user(&self) {
        match self.api.me().await {
            Ok(profile) => self.state().user = Some(profile),
            Err(err) => tracing::warn!(error = %err, "failed to refresh user"),
        }
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// 通知は一度だけ返す
    pub fn take_notice(&self) -> Option<String> {
        self.state().notice.take()
    }

    pub fn review_languages(&self) -> Vec<String> {
        self.state()
            .user
            .as_ref()
            .map(UserProfile::review_languages)
            .unwrap_or_else(|| vec!["en".to_string()])
    }

    pub fn stats(&self) -> Option<ReviewerStats> {
        self.state().user.as_ref().map(ReviewerStats::from_profile)
    }
}
