//! パニック境界
//!
//! 画面（非同期タスク）の中で起きたパニックを捕まえてログに残し、
//! リセットするか確認してから作り直す。

use crate::error::{ReviewDeskError, Result};
use std::any::Any;
use std::future::Future;

pub const RECOVERY_MESSAGE: &str = "Something went wrong. Please reset the view and try again.";

/// パニックのペイロードから表示用メッセージを取り出す
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// `make` で作ったタスクを実行し、パニックしたら `reset` に問い合わせる。
///
/// `reset` が true を返す限り作り直す。false ならエラーで終了する。
pub async fn run_with_boundary<F, Fut, R>(mut make: F, mut reset: R) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
    R: FnMut(&str) -> bool,
{
    loop {
        let handle = tokio::spawn(make());
        match handle.await {
            Ok(result) => return result,
            Err(err) if err.is_panic() => {
                let message = panic_message(err.into_panic().as_ref());
                tracing::error!(panic = %message, "view crashed");
                if !reset(&message) {
                    return Err(ReviewDeskError::Prompt(RECOVERY_MESSAGE.to_string()));
                }
                tracing::info!("view reset");
            }
            Err(err) => {
                tracing::warn!(error = %err, "view task cancelled");
                return Ok(());
            }
        }
    }
}
