//! テスト用の台本付きゲートウェイ

#![allow(dead_code)]

use async_trait::async_trait;
use review_desk::api::{ApiRequest, Gateway, Method, ReviewApi};
use review_desk::error::ApiError;
use review_desk::session::SessionStore;
use review_desk::token_store::{MemoryTokenStore, TokenStore};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    NoContent,
    Fail(ApiError),
    /// 指定時間待ってから返す
    Delayed(Duration, Box<Reply>),
    /// 応答しない
    Hang,
}

#[derive(Default)]
struct Script {
    queued: HashMap<(Method, String), VecDeque<Reply>>,
    sticky: HashMap<(Method, String), Reply>,
    requests: Vec<ApiRequest>,
}

#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 1回だけ返す応答（順番に消費）
    pub fn push(&self, method: Method, path: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// キューが空のときに毎回返す応答
    pub fn always(&self, method: Method, path: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .sticky
            .insert((method, path.to_string()), reply);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn next_reply(&self, request: &ApiRequest) -> Reply {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        let key = (request.method, request.path.clone());
        if let Some(reply) = script.queued.get_mut(&key).and_then(VecDeque::pop_front) {
            return reply;
        }
        script.sticky.get(&key).cloned().unwrap_or_else(|| {
            Reply::Fail(ApiError::from_status(
                500,
                Some(format!("unscripted {} {}", request.method.as_str(), request.path)),
            ))
        })
    }
}

async fn resolve(reply: Reply) -> Result<Option<Value>, ApiError> {
    let mut reply = reply;
    loop {
        match reply {
            Reply::Json(v) => return Ok(Some(v)),
            Reply::NoContent => return Ok(None),
            Reply::Fail(e) => return Err(e),
            Reply::Delayed(after, inner) => {
                tokio::time::sleep(after).await;
                reply = *inner;
            }
            Reply::Hang => {
                std::future::pending::<()>().await;
                return Ok(None);
            }
        }
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let reply = self.next_reply(&request);
        resolve(reply).await
    }
}

pub const NEXT: &str = "/datasets/next";
pub const SUBMIT: &str = "/review/submit";
pub const FLAG: &str = "/review/flag";
pub const ME: &str = "/auth/me";
pub const SYSTEM_CONFIG: &str = "/operator/system-config";

pub fn profile(balance: f64, reviews_done: u64) -> Value {
    json!({
        "username": "asha",
        "email": "asha@example.com",
        "roles": ["reviewer"],
        "languages": ["en", "hi"],
        "is_active": true,
        "payout_balance": balance,
        "reviews_done": reviews_done
    })
}

pub fn work_item(id: &str, unchecked_skips: u32) -> Value {
    json!({
        "_id": id,
        "dataset_type_id": "",
        "language": "en",
        "modality": "text",
        "content": {"text": "hello"},
        "review_state": {"review_count": 0, "unchecked_skips": unchecked_skips}
    })
}

pub fn session_with(
    gateway: &Arc<ScriptedGateway>,
    token: Option<&str>,
) -> SessionStore<Arc<ScriptedGateway>> {
    let tokens: Arc<dyn TokenStore> = match token {
        Some(t) => Arc::new(MemoryTokenStore::with_token(t)),
        None => Arc::new(MemoryTokenStore::default()),
    };
    SessionStore::new(Arc::new(ReviewApi::new(Arc::clone(gateway), tokens)))
}

pub fn session(gateway: &Arc<ScriptedGateway>) -> SessionStore<Arc<ScriptedGateway>> {
    session_with(gateway, Some("tok"))
}
