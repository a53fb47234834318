use std::time::Duration;
use thiserror::Error;

/// ゲートウェイが返す正規化済みエラー
///
/// `status` はHTTPレスポンスを受け取れた場合のみ入る。
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

pub const DEFAULT_FAILURE_DETAIL: &str = "Request failed";

impl ApiError {
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        Self {
            status: Some(status),
            message: detail
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_DETAIL.to_string()),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::transport(format!("request timed out after {}s", after.as_secs_f64()))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum ReviewDeskError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ログインしていません。`review-desk login` でログインしてください")]
    NotAuthenticated,

    #[error("API呼び出しエラー: {0}")]
    Api(#[from] ApiError),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("トリアージエラー: {0}")]
    Triage(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] review_desk_common::Error),
}

impl ReviewDeskError {
    /// HTTPステータス（APIエラーのみ）
    pub fn status(&self) -> Option<u16> {
        match self {
            ReviewDeskError::Api(e) => e.status,
            _ => None,
        }
    }

    /// コントローラーに渡すためにゲートウェイのエラー型へ寄せる
    pub fn into_api_error(self) -> ApiError {
        match self {
            ReviewDeskError::Api(e) => e,
            other => ApiError::transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewDeskError>;
