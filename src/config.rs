use crate::error::{ReviewDeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BASE_URL_ENV: &str = "REVIEW_DESK_BASE_URL";

/// クライアント設定（~/.config/review-desk/config.json）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// 1リクエストあたりのタイムアウト
    pub request_timeout_seconds: u64,
    /// 承認・編集後に次のアイテムへ進むまでの待ち時間
    pub approve_advance_ms: u64,
    pub skip_advance_ms: u64,
    pub flag_advance_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// 送信成功から次のアイテム取得までの待ち時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceDelays {
    pub approve: Duration,
    pub skip: Duration,
    pub flag: Duration,
}

impl Default for AdvanceDelays {
    fn default() -> Self {
        Self {
            approve: Duration::from_millis(1500),
            skip: Duration::from_millis(1000),
            flag: Duration::from_millis(1500),
        }
    }
}

impl Config {
    /// ファイルの設定だけを読む（環境変数・引数の上書きは含まない）
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Self = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default_config()
        };
        config.validate()?;
        Ok(config)
    }

    /// 環境変数、次にコマンドライン指定の順で接続先を上書きする。
    ///
    /// 上書き後の値は保存しない。
    pub fn with_overrides(mut self, env_url: Option<&str>, cli_url: Option<&str>) -> Result<Self> {
        for url in [env_url, cli_url].into_iter().flatten() {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = url.trim_end_matches('/').to_string();
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 設定ディレクトリ（トークン・トリアージ記録もここに置く）
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReviewDeskError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("review-desk"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn default_config() -> Self {
        let delays = AdvanceDelays::default();
        Self {
            base_url: "http://localhost:8000/api".into(),
            request_timeout_seconds: 10,
            approve_advance_ms: delays.approve.as_millis() as u64,
            skip_advance_ms: delays.skip.as_millis() as u64,
            flag_advance_ms: delays.flag.as_millis() as u64,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ReviewDeskError::Config(format!(
                "base_url は http:// または https:// で始まる必要があります: {}",
                self.base_url
            )));
        }
        if self.request_timeout_seconds == 0 {
            return Err(ReviewDeskError::Config(
                "request_timeout_seconds は1以上にしてください".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn advance_delays(&self) -> AdvanceDelays {
        AdvanceDelays {
            approve: Duration::from_millis(self.approve_advance_ms),
            skip: Duration::from_millis(self.skip_advance_ms),
            flag: Duration::from_millis(self.flag_advance_ms),
        }
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        self.base_url = url.trim_end_matches('/').to_string();
        self.validate()?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_delays() {
        let config = Config::default();
        let delays = config.advance_delays();
        assert_eq!(delays, AdvanceDelays::default());
        assert_eq!(delays.approve, Duration::from_millis(1500));
        assert_eq!(delays.skip, Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"base_url": "https://review.example.org/api"}"#).unwrap();
        assert_eq!(config.request_timeout_seconds, 10);
        assert_eq!(config.skip_advance_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = Config {
            base_url: "review.example.org".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReviewDeskError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            request_timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_apply_in_order() {
        let config = Config::default()
            .with_overrides(Some("https://env.example.org/api/"), None)
            .unwrap();
        assert_eq!(config.base_url, "https://env.example.org/api");

        let config = Config::default()
            .with_overrides(Some("https://env.example.org/api"), Some("https://cli.example.org"))
            .unwrap();
        assert_eq!(config.base_url, "https://cli.example.org");

        let config = Config::default().with_overrides(Some("  "), None).unwrap();
        assert_eq!(config.base_url, Config::default().base_url);
        assert!(Config::default().with_overrides(None, Some("ftp://x")).is_err());
    }

    /// 上書きした接続先はファイルに書き戻さない
    #[test]
    fn test_save_keeps_file_base_url() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "https://file.example.org/api"}"#).unwrap();

        let mut file_config = Config::load_from(&path).unwrap();
        let effective = file_config
            .clone()
            .with_overrides(Some("https://env.example.org"), Some("https://cli.example.org"))
            .unwrap();
        assert_eq!(effective.base_url, "https://cli.example.org");

        file_config.request_timeout_seconds = 30;
        file_config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.base_url, "https://file.example.org/api");
        assert_eq!(reloaded.request_timeout_seconds, 30);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.base_url, Config::default().base_url);
    }
}
