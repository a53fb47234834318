//! 型付きエンドポイント
//!
//! トークンの付与・保存はここで行い、送信そのものは Gateway に任せる。

use super::{ApiRequest, Gateway};
use crate::error::{ReviewDeskError, Result};
use crate::token_store::TokenStore;
use review_desk_common::{
    AuthResponse, ChangePasswordRequest, DatasetTypeSchema, FlagRequest, FlaggedFilters,
    FlaggedPage, LoginRequest, NextItemResponse, PayoutRequest, RegisterRequest, ReviewOutcome,
    ReviewSubmission, SystemConfig, UserProfile,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ReviewApi<G> {
    gateway: G,
    tokens: Arc<dyn TokenStore>,
}

impl<G: Gateway> ReviewApi<G> {
    pub fn new(gateway: G, tokens: Arc<dyn TokenStore>) -> Self {
        Self { gateway, tokens }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn has_token(&self) -> bool {
        self.tokens.load().is_some()
    }

    /// 認証付きで送信してJSONを型に変換
    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let request = request.bearer(self.tokens.load());
        self.call_raw(request).await
    }

    async fn call_raw<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let path = request.path.clone();
        let value = self.gateway.send(request).await?.unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| ReviewDeskError::ApiParse(format!("{}: {}", path, e)))
    }

    // ---- auth ----

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let body = serde_json::to_value(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let auth: AuthResponse = self.call_raw(ApiRequest::post("/auth/login").json(body)).await?;
        self.tokens.save(&auth.access_token)?;
        Ok(auth)
    }

    pub async fn register(&self, data: &RegisterRequest) -> Result<AuthResponse> {
        let body = serde_json::to_value(data)?;
        let auth: AuthResponse = self
            .call_raw(ApiRequest::post("/auth/register").json(body))
            .await?;
        self.tokens.save(&auth.access_token)?;
        Ok(auth)
    }

    pub fn logout(&self) -> Result<()> {
        self.tokens.clear()
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.call(ApiRequest::get("/auth/me")).await
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<Value> {
        let body = serde_json::to_value(ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        })?;
        self.call(ApiRequest::post("/auth/change-password").json(body))
            .await
    }

    // ---- reviewer ----

    pub async fn next_item(&self, languages: &[String]) -> Result<NextItemResponse> {
        let langs = if languages.is_empty() {
            "en".to_string()
        } else {
            languages.join(",")
        };
        let value: Value = self
            .call(ApiRequest::get("/datasets/next").query("langs", langs))
            .await?;
        Ok(NextItemResponse::from_value(value)?)
    }

    pub async fn dataset_type_schema(&self, dataset_type_id: &str) -> Result<DatasetTypeSchema> {
        self.call(ApiRequest::get(format!("/datasets/type/{}", dataset_type_id)))
            .await
    }

    pub async fn dataset_stats(&self, languages: Option<&[String]>) -> Result<Value> {
        let mut request = ApiRequest::get("/datasets/stats");
        if let Some(langs) = languages {
            request = request.query("langs", langs.join(","));
        }
        self.call(request).await
    }

    pub async fn submit_review(&self, submission: &ReviewSubmission) -> Result<ReviewOutcome> {
        let body = serde_json::to_value(submission)?;
        self.call(ApiRequest::post("/review/submit").json(body)).await
    }

    pub async fn flag_item(&self, flag: &FlagRequest) -> Result<()> {
        let body = serde_json::to_value(flag)?;
        let _: Value = self.call(ApiRequest::post("/review/flag").json(body)).await?;
        Ok(())
    }

    pub async fn review_stats(&self) -> Result<Value> {
        self.call(ApiRequest::get("/review/stats")).await
    }

    pub async fn my_reviews(&self) -> Result<Vec<Value>> {
        self.call(ApiRequest::get("/review/my-reviews")).await
    }

    pub async fn request_payout(&self, payout: &PayoutRequest) -> Result<Value> {
        let body = serde_json::to_value(payout)?;
        self.call(ApiRequest::post("/users/request-payout").json(body))
            .await
    }

    // ---- operator ----

    pub async fn system_config(&self) -> Result<SystemConfig> {
        self.call(ApiRequest::get("/operator/system-config")).await
    }

    pub async fn update_system_config(&self, changes: &Value) -> Result<Value> {
        self.call(ApiRequest::put("/operator/system-config").json(changes.clone()))
            .await
    }

    pub async fn flagged_items(&self, filters: &FlaggedFilters) -> Result<FlaggedPage> {
        let mut request = ApiRequest::get("/operator/analytics/flagged-items");
        request.query = filters.to_query();
        self.call(request).await
    }
}

/// `update_system_config` 用の差分
pub fn skip_prompt_update(max_unchecked_skips: u32) -> Value {
    json!({ "max_unchecked_skips_before_prompt": max_unchecked_skips })
}
