//! フラグ付きアイテム一覧（オペレーター向け）

use crate::review::FlagReason;
use crate::types::{Content, Modality, ReviewState};
use serde::{Deserialize, Serialize};

/// レビュアーが付けたフラグ1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagRecord {
    pub reviewer_id: String,
    pub reason: FlagReason,
    pub note: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlaggedItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub dataset_type_id: String,
    #[serde(default)]
    pub dataset_type_name: String,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub flags: Vec<FlagRecord>,
    #[serde(default)]
    pub review_state: ReviewState,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub flagged_at: Option<String>,
}

/// ページング付き一覧
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlaggedPage {
    pub items: Vec<FlaggedItem>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

/// 一覧の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlaggedFilters {
    pub dataset_type_id: Option<String>,
    pub language: Option<String>,
    pub reason: Option<FlagReason>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FlaggedFilters {
    /// 指定された条件だけをクエリにする
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(id) = self.dataset_type_id.as_ref().filter(|s| !s.is_empty()) {
            query.push(("dataset_type_id".to_string(), id.clone()));
        }
        if let Some(lang) = self.language.as_ref().filter(|s| !s.is_empty()) {
            query.push(("language".to_string(), lang.clone()));
        }
        if let Some(reason) = self.reason {
            query.push(("reason".to_string(), reason.as_str().to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flagged_page_deserialize() {
        let page: FlaggedPage = serde_json::from_value(json!({
            "items": [{
                "_id": "i9",
                "dataset_type_name": "News",
                "modality": "image",
                "language": "ta",
                "flags": [
                    {"reviewer_id": "r1", "reason": "corrupt", "note": "blank scan", "timestamp": "2026-01-02T10:00:00"}
                ],
                "review_state": {"review_count": 1}
            }],
            "total": 1,
            "limit": 20,
            "offset": 0,
            "has_more": false
        }))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        assert_eq!(item.modality, Modality::Image);
        assert_eq!(item.flags[0].reason, FlagReason::Corrupt);
        assert_eq!(item.flags[0].note.as_deref(), Some("blank scan"));
    }

    #[test]
    fn test_filters_to_query() {
        let filters = FlaggedFilters {
            dataset_type_id: Some(String::new()),
            language: Some("hi".into()),
            reason: Some(FlagReason::Offensive),
            limit: Some(0),
            offset: Some(0),
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("language".to_string(), "hi".to_string()),
                ("reason".to_string(), "offensive".to_string()),
                ("offset".to_string(), "0".to_string()),
            ]
        );
        assert!(FlaggedFilters::default().to_query().is_empty());
    }
}
