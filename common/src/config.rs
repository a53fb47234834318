//! サーバー側のシステム設定（レビュアーが参照する部分）

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_UNCHECKED_SKIPS: u32 = 2;
pub const DEFAULT_GOLD_SKIP_CORRECT_THRESHOLD: u32 = 5;

/// `/operator/system-config` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub max_unchecked_skips_before_prompt: u32,
    pub gold_skip_correct_threshold: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_rate_default: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_threshold_default: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_timeout_sec: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_unchecked_skips_before_prompt: DEFAULT_MAX_UNCHECKED_SKIPS,
            gold_skip_correct_threshold: DEFAULT_GOLD_SKIP_CORRECT_THRESHOLD,
            payout_rate_default: None,
            skip_threshold_default: None,
            lock_timeout_sec: None,
        }
    }
}

impl SystemConfig {
    /// 0 は未設定扱い
    pub fn skip_prompt_threshold(&self) -> u32 {
        if self.max_unchecked_skips_before_prompt == 0 {
            DEFAULT_MAX_UNCHECKED_SKIPS
        } else {
            self.max_unchecked_skips_before_prompt
        }
    }

    /// スキップ時にフィードバックを求めるか
    pub fn requires_skip_feedback(&self, unchecked_skips: u32, data_correct: bool) -> bool {
        !data_correct && unchecked_skips >= self.skip_prompt_threshold()
    }
}
