//! レビュー送信・フラグ送信のペイロード

use crate::error::{Error, Result};
use crate::types::Content;
use serde::{Deserialize, Serialize};

/// レビューアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Edit,
    Skip,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Edit => "edit",
            ReviewAction::Skip => "skip",
        }
    }
}

/// `POST /review/submit` のボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub item_id: String,
    pub action: ReviewAction,
    pub changes: Option<Content>,
    pub skip_data_correct: bool,
    pub skip_feedback: Option<String>,
}

impl ReviewSubmission {
    pub fn approve(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            action: ReviewAction::Approve,
            changes: None,
            skip_data_correct: false,
            skip_feedback: None,
        }
    }

    pub fn edit(item_id: impl Into<String>, changes: Content) -> Self {
        Self {
            item_id: item_id.into(),
            action: ReviewAction::Edit,
            changes: Some(changes),
            skip_data_correct: false,
            skip_feedback: None,
        }
    }

    /// 空のフィードバックは null として送る
    pub fn skip(item_id: impl Into<String>, data_correct: bool, feedback: Option<String>) -> Self {
        Self {
            item_id: item_id.into(),
            action: ReviewAction::Skip,
            changes: None,
            skip_data_correct: data_correct,
            skip_feedback: feedback.filter(|f| !f.trim().is_empty()),
        }
    }
}

/// `POST /review/submit` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewOutcome {
    pub payout_amount: f64,
}

/// フラグ理由
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagReason {
    #[default]
    Unclear,
    Corrupt,
    Offensive,
    Other,
}

impl FlagReason {
    pub const ALL: [FlagReason; 4] = [
        FlagReason::Unclear,
        FlagReason::Corrupt,
        FlagReason::Offensive,
        FlagReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::Unclear => "unclear",
            FlagReason::Corrupt => "corrupt",
            FlagReason::Offensive => "offensive",
            FlagReason::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FlagReason::Unclear => "Unclear / ambiguous content",
            FlagReason::Corrupt => "Corrupt or broken data",
            FlagReason::Offensive => "Offensive content",
            FlagReason::Other => "Other",
        }
    }
}

impl std::str::FromStr for FlagReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unclear" => Ok(FlagReason::Unclear),
            "corrupt" => Ok(FlagReason::Corrupt),
            "offensive" => Ok(FlagReason::Offensive),
            "other" => Ok(FlagReason::Other),
            _ => Err(Error::Parse(format!(
                "Unknown flag reason: {}. Use unclear, corrupt, offensive, or other",
                s
            ))),
        }
    }
}

impl std::fmt::Display for FlagReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `POST /review/flag` のボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagRequest {
    pub item_id: String,
    pub reason: FlagReason,
    pub note: Option<String>,
}

impl FlagRequest {
    /// 空白だけのメモは null、それ以外は入力のまま送る
    pub fn new(item_id: impl Into<String>, reason: FlagReason, note: &str) -> Self {
        Self {
            item_id: item_id.into(),
            reason,
            note: Some(note)
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_wire_format() {
        let body = serde_json::to_value(ReviewSubmission::approve("x1")).unwrap();
        assert_eq!(
            body,
            json!({
                "item_id": "x1",
                "action": "approve",
                "changes": null,
                "skip_data_correct": false,
                "skip_feedback": null
            })
        );
    }

    #[test]
    fn test_skip_blank_feedback_is_null() {
        let s = ReviewSubmission::skip("x1", false, Some("   ".to_string()));
        assert_eq!(s.skip_feedback, None);
        let s = ReviewSubmission::skip("x1", true, Some(" typo in line 2".to_string()));
        assert_eq!(s.skip_feedback.as_deref(), Some(" typo in line 2"));
        assert!(s.skip_data_correct);
    }

    #[test]
    fn test_edit_carries_changes() {
        let mut changes = Content::new();
        changes.insert("text".into(), json!("hello world"));
        let body = serde_json::to_value(ReviewSubmission::edit("x1", changes)).unwrap();
        assert_eq!(body["action"], "edit");
        assert_eq!(body["changes"]["text"], "hello world");
    }

    #[test]
    fn test_outcome_defaults_payout() {
        let outcome: ReviewOutcome = serde_json::from_value(json!({"message": "ok"})).unwrap();
        assert_eq!(outcome.payout_amount, 0.0);
    }

    #[test]
    fn test_flag_reason_parse() {
        assert_eq!("Corrupt".parse::<FlagReason>().unwrap(), FlagReason::Corrupt);
        assert!("spam".parse::<FlagReason>().is_err());
        assert_eq!(FlagReason::default(), FlagReason::Unclear);
    }

    #[test]
    fn test_flag_request_note() {
        let req = FlagRequest::new("x1", FlagReason::Other, "");
        assert_eq!(req.note, None);
        let req = FlagRequest::new("x1", FlagReason::Other, "  \n ");
        assert_eq!(req.note, None);
        let body = serde_json::to_value(FlagRequest::new("x1", FlagReason::Offensive, " slur ")).unwrap();
        assert_eq!(body, json!({"item_id": "x1", "reason": "offensive", "note": " slur "}));
    }
}
