//! フラグ付きアイテムのトリアージ（オペレーター向け）
//!
//! 対応結果はサーバーに保存しない。`ResolutionStore` の実装として
//! メモリ版と JSON ファイル版を持つ。

use crate::error::{ReviewDeskError, Result};
use review_desk_common::FlaggedItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const RESOLUTION_FILE_NAME: &str = "flag-resolutions.json";

pub const EMPTY_NOTE_PLACEHOLDER: &str = "No additional note provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageAction {
    Resolve,
    Dismiss,
    ReReview,
}

impl TriageAction {
    /// resolve / dismiss はメモ必須
    pub fn requires_note(&self) -> bool {
        matches!(self, TriageAction::Resolve | TriageAction::Dismiss)
    }

    pub fn status(&self) -> TriageStatus {
        match self {
            TriageAction::Resolve => TriageStatus::Resolved,
            TriageAction::Dismiss => TriageStatus::Dismissed,
            TriageAction::ReReview => TriageStatus::ReReview,
        }
    }
}

impl FromStr for TriageAction {
    type Err = ReviewDeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "resolve" | "resolved" => Ok(TriageAction::Resolve),
            "dismiss" | "dismissed" => Ok(TriageAction::Dismiss),
            "re-review" | "rereview" | "re_review" => Ok(TriageAction::ReReview),
            _ => Err(ReviewDeskError::Triage(format!(
                "不明なアクション: {}（resolve / dismiss / re-review）",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriageStatus {
    #[default]
    Pending,
    Resolved,
    Dismissed,
    ReReview,
}

impl TriageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageStatus::Pending => "pending",
            TriageStatus::Resolved => "resolved",
            TriageStatus::Dismissed => "dismissed",
            TriageStatus::ReReview => "re-review",
        }
    }
}

impl std::fmt::Display for TriageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub status: TriageStatus,
    pub note: String,
    /// RFC 3339
    pub updated_at: String,
}

/// 対応結果の保存先
pub trait ResolutionStore {
    fn get(&self, item_id: &str) -> Option<Resolution>;
    fn put(&mut self, item_id: &str, resolution: Resolution) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryResolutionStore {
    entries: HashMap<String, Resolution>,
}

impl MemoryResolutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResolutionStore for MemoryResolutionStore {
    fn get(&self, item_id: &str) -> Option<Resolution> {
        self.entries.get(item_id).cloned()
    }

    fn put(&mut self, item_id: &str, resolution: Resolution) -> Result<()> {
        self.entries.insert(item_id.to_string(), resolution);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResolutionFileData {
    /// バージョン（互換性チェック用）
    version: u32,
    entries: HashMap<String, Resolution>,
}

impl Default for ResolutionFileData {
    fn default() -> Self {
        Self {
            version: FileResolutionStore::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// `flag-resolutions.json` に保存する。書き込みは put のたび。
#[derive(Debug)]
pub struct FileResolutionStore {
    path: PathBuf,
    data: ResolutionFileData,
}

impl FileResolutionStore {
    const CURRENT_VERSION: u32 = 1;

    /// 読み込めない・バージョン違いのファイルは空として扱う
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(RESOLUTION_FILE_NAME);
        let data = Self::read(&path).unwrap_or_default();
        Self { path, data }
    }

    fn read(path: &Path) -> Option<ResolutionFileData> {
        let file = File::open(path).ok()?;
        match serde_json::from_reader::<_, ResolutionFileData>(BufReader::new(file)) {
            Ok(data) if data.version == Self::CURRENT_VERSION => Some(data),
            Ok(data) => {
                tracing::warn!(version = data.version, "resolution file version mismatch, starting fresh");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to read resolution file");
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.data)?;
        Ok(())
    }
}

impl ResolutionStore for FileResolutionStore {
    fn get(&self, item_id: &str) -> Option<Resolution> {
        self.data.entries.get(item_id).cloned()
    }

    fn put(&mut self, item_id: &str, resolution: Resolution) -> Result<()> {
        self.data.entries.insert(item_id.to_string(), resolution);
        self.save()
    }
}

/// 対応を記録する
pub fn triage(
    store: &mut dyn ResolutionStore,
    item_id: &str,
    action: TriageAction,
    note: &str,
) -> Result<Resolution> {
    let note = note.trim();
    if action.requires_note() && note.is_empty() {
        return Err(ReviewDeskError::Triage(
            "Please add a short note before saving.".to_string(),
        ));
    }

    let resolution = Resolution {
        status: action.status(),
        note: if note.is_empty() {
            EMPTY_NOTE_PLACEHOLDER.to_string()
        } else {
            note.to_string()
        },
        updated_at: chrono::Utc::now().to_rfc3339(),
    };
    store.put(item_id, resolution.clone())?;
    tracing::info!(item_id, status = %resolution.status, "flag triaged");
    Ok(resolution)
}

/// 画面に出す確認メッセージ
pub fn triage_message(item_id: &str, status: TriageStatus) -> String {
    match status {
        TriageStatus::ReReview => format!("Sent item {} for re-review", item_id),
        other => format!("Updated flag as {}", other),
    }
}

pub fn status_of(store: &dyn ResolutionStore, item_id: &str) -> TriageStatus {
    store
        .get(item_id)
        .map(|r| r.status)
        .unwrap_or(TriageStatus::Pending)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub resolved: usize,
    pub dismissed: usize,
    pub re_review: usize,
}

pub fn status_counts(items: &[FlaggedItem], store: &dyn ResolutionStore) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for item in items {
        match status_of(store, &item.id) {
            TriageStatus::Pending => counts.pending += 1,
            TriageStatus::Resolved => counts.resolved += 1,
            TriageStatus::Dismissed => counts.dismissed += 1,
            TriageStatus::ReReview => counts.re_review += 1,
        }
    }
    counts
}
