//! REST APIクライアント
//!
//! - Gateway: 1リクエストを送る唯一の入口（認証ヘッダ・JSON・エラー正規化）
//! - HttpGateway: reqwestによる実装
//! - ReviewApi: 各エンドポイントの型付きラッパー

mod endpoints;
mod http;

pub use endpoints::{skip_prompt_update, ReviewApi};
pub use http::HttpGateway;

use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// ゲートウェイに渡す1リクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// `Authorization: Bearer` に載せるトークン
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// 1リクエストを送ってJSONを返す
///
/// 204 No Content は `Ok(None)`。2xx以外と通信失敗は `ApiError` に正規化する。
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        (**self).send(request).await
    }
}

/// エラーボディの `detail` を取り出す
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
