//! reqwestによるGateway実装

use super::{extract_detail, ApiRequest, Gateway, Method};
use crate::error::{ApiError, ReviewDeskError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// HTTP経由でサーバーに接続するゲートウェイ
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGateway {
    /// * `base_url` - 例: `https://review.example.org/api`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReviewDeskError::Config(format!("HTTPクライアント初期化失敗: {}", e)))?;
        Ok(Self::with_client(client, base_url, timeout))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_transport(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::timeout(self.timeout)
        } else {
            ApiError::transport(err.to_string())
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send(&self, request: ApiRequest) -> std::result::Result<Option<Value>, ApiError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        tracing::debug!(method = request.method.as_str(), path = %request.path, "API request");

        let response = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), extract_detail(&body));
            tracing::debug!(status = status.as_u16(), message = %err.message, "API error");
            return Err(err);
        }

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await.map_err(|e| self.map_transport(e))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError {
                status: Some(status.as_u16()),
                message: format!("invalid JSON response: {}", e),
            })
    }
}
