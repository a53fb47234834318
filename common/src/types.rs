//! レビュー対象アイテムの型定義
//!
//! CLIと将来のフロントエンドで共有される型:
//! - WorkItem: レビューキューから取り出した1件
//! - ReviewState: サーバー側で管理されるレビュー進捗
//! - DatasetTypeSchema: フィールドのラベル・ウィジェット定義

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// フィールドキー → 値のマップ
pub type Content = Map<String, Value>;

/// アイテムが確定するまでに必要なレビュー数（進捗表示用）
pub const REVIEWS_TO_FINALIZE: u32 = 3;

/// データセットのモダリティ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[default]
    Text,
    Ocr,
    Voice,
    Conversation,
    Image,
    Video,
    Custom,
}

impl Modality {
    /// 未知の値は Custom 扱い
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "text" => Modality::Text,
            "ocr" => Modality::Ocr,
            "voice" => Modality::Voice,
            "conversation" => Modality::Conversation,
            "image" => Modality::Image,
            "video" => Modality::Video,
            _ => Modality::Custom,
        }
    }

    /// 一覧表示用の短いバッジ
    pub fn badge(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Ocr => "OCR",
            Modality::Voice => "VOICE",
            Modality::Conversation => "CHAT",
            Modality::Image => "IMG",
            Modality::Video => "VIDEO",
            Modality::Custom => "CUSTOM",
        }
    }
}

impl<'de> Deserialize<'de> for Modality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Modality::from_name(&s)).unwrap_or_default())
    }
}

/// アイテムのステータス
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    InReview,
    Finalized,
}

/// サーバー側のレビュー進捗
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewState {
    pub status: ReviewStatus,
    pub review_count: u32,
    pub skip_count: u32,
    /// 「データは正しい」付きスキップ数
    pub correct_skips: u32,
    /// チェックなしスキップ数
    pub unchecked_skips: u32,
    pub finalized: bool,
}

/// レビューキューのアイテム
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    #[serde(default)]
    pub item_number: Option<i64>,

    #[serde(default)]
    pub dataset_type_id: String,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub modality: Modality,

    #[serde(default)]
    pub content: Content,

    #[serde(default)]
    pub review_state: ReviewState,

    #[serde(default)]
    pub is_gold: bool,

    #[serde(default)]
    pub flagged: bool,
}

impl WorkItem {
    pub fn unchecked_skips(&self) -> u32 {
        self.review_state.unchecked_skips
    }

    /// 確定までの進捗（%）
    pub fn review_progress(&self) -> f64 {
        let pct = self.review_state.review_count as f64 / REVIEWS_TO_FINALIZE as f64 * 100.0;
        pct.min(100.0)
    }
}

/// `/datasets/next` のレスポンス
#[derive(Debug, Clone, PartialEq)]
pub enum NextItemResponse {
    Item(WorkItem),
    /// キューが空（`{"message": "..."}`）
    Empty { message: String },
}

impl NextItemResponse {
    /// `message` を持つペイロードは「アイテムなし」の合図として扱う
    pub fn from_value(value: Value) -> Result<Self> {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            if !message.is_empty() {
                return Ok(NextItemResponse::Empty {
                    message: message.to_string(),
                });
            }
        }

        if !value.is_object() {
            return Err(Error::Parse(format!("next item is not an object: {}", value)));
        }

        let item: WorkItem = serde_json::from_value(value)?;
        Ok(NextItemResponse::Item(item))
    }
}

/// レビュー画面のウィジェット種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewWidget {
    TextInput,
    #[default]
    Textarea,
    AudioPlayer,
    ImageViewer,
    OcrEditor,
    VideoPlayer,
}

impl ReviewWidget {
    pub fn from_name(name: &str) -> Self {
        match name {
            "text_input" => ReviewWidget::TextInput,
            "audio_player" => ReviewWidget::AudioPlayer,
            "image_viewer" => ReviewWidget::ImageViewer,
            "ocr_editor" => ReviewWidget::OcrEditor,
            "video_player" => ReviewWidget::VideoPlayer,
            _ => ReviewWidget::Textarea,
        }
    }

    /// メディア系ウィジェットはURLを編集する
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            ReviewWidget::AudioPlayer | ReviewWidget::ImageViewer | ReviewWidget::VideoPlayer
        )
    }
}

/// データセット種別の1フィールド
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
    pub options: Option<Vec<String>>,
    pub placeholder: Option<String>,
    pub review_widget: Option<String>,
}

impl FieldSchema {
    pub fn widget(&self) -> ReviewWidget {
        self.review_widget
            .as_deref()
            .map(ReviewWidget::from_name)
            .unwrap_or_default()
    }
}

/// `/datasets/type/:id` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetTypeSchema {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub payout_rate: f64,
    #[serde(default)]
    pub review_guidelines: Option<String>,
}

impl DatasetTypeSchema {
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// ラベル未定義ならキーをそのまま返す
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        match self.field(key) {
            Some(f) if !f.label.is_empty() => f.label.as_str(),
            _ => key,
        }
    }
}

/// 編集入力を元の値の型に合わせて変換
///
/// 数値フィールドは数値として解釈できた場合のみ数値で返す。
pub fn coerce_edit_value(original: Option<&Value>, input: &str) -> Value {
    if let Some(Value::Number(_)) = original {
        if let Ok(n) = input.trim().parse::<f64>() {
            if let Some(num) = serde_json::Number::from_f64(n) {
                return Value::Number(num);
            }
        }
    }
    Value::String(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_work_item_deserialize() {
        let value = json!({
            "_id": "x1",
            "dataset_type_id": "news",
            "language": "hi",
            "modality": "ocr",
            "content": {"text": "hello"},
            "review_state": {"review_count": 2, "unchecked_skips": 1}
        });
        let item: WorkItem = serde_json::from_value(value).expect("デシリアライズ失敗");
        assert_eq!(item.id, "x1");
        assert_eq!(item.modality, Modality::Ocr);
        assert_eq!(item.content["text"], "hello");
        assert_eq!(item.unchecked_skips(), 1);
        assert_eq!(item.review_state.skip_count, 0);
        assert!(!item.review_state.finalized);
    }

    #[test]
    fn test_work_item_accepts_plain_id() {
        let item: WorkItem = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(item.id, "abc");
        assert_eq!(item.modality, Modality::Text);
    }

    #[test]
    fn test_unknown_modality_is_custom() {
        let item: WorkItem =
            serde_json::from_value(json!({"_id": "a", "modality": "hologram"})).unwrap();
        assert_eq!(item.modality, Modality::Custom);
        assert_eq!(item.modality.badge(), "CUSTOM");
    }

    #[test]
    fn test_modality_badges() {
        assert_eq!(Modality::Conversation.badge(), "CHAT");
        assert_eq!(Modality::Image.badge(), "IMG");
        assert_eq!(Modality::from_name(" Voice "), Modality::Voice);
    }

    #[test]
    fn test_next_item_empty_signal() {
        let resp = NextItemResponse::from_value(json!({"message": "No items available"})).unwrap();
        assert_eq!(
            resp,
            NextItemResponse::Empty {
                message: "No items available".to_string()
            }
        );
    }

    #[test]
    fn test_next_item_payload() {
        let resp = NextItemResponse::from_value(json!({"_id": "x1", "content": {"text": "hello"}}))
            .unwrap();
        match resp {
            NextItemResponse::Item(item) => assert_eq!(item.id, "x1"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_next_item_rejects_garbage() {
        assert!(NextItemResponse::from_value(json!([1, 2, 3])).is_err());
        assert!(NextItemResponse::from_value(json!({"content": {}})).is_err());
    }

    #[test]
    fn test_review_progress_capped() {
        let mut item = WorkItem::default();
        item.review_state.review_count = 1;
        assert!((item.review_progress() - 33.333).abs() < 0.01);
        item.review_state.review_count = 5;
        assert_eq!(item.review_progress(), 100.0);
    }

    #[test]
    fn test_schema_labels_and_widgets() {
        let schema: DatasetTypeSchema = serde_json::from_value(json!({
            "_id": "news",
            "name": "News",
            "modality": "text",
            "fields": [
                {"key": "headline", "type": "text", "label": "Headline", "review_widget": "text_input"},
                {"key": "audio", "type": "text", "label": "", "review_widget": "audio_player"}
            ]
        }))
        .unwrap();
        assert_eq!(schema.label_for("headline"), "Headline");
        assert_eq!(schema.label_for("audio"), "audio");
        assert_eq!(schema.label_for("missing"), "missing");
        assert_eq!(schema.field("headline").unwrap().widget(), ReviewWidget::TextInput);
        assert!(schema.field("audio").unwrap().widget().is_media());
    }

    #[test]
    fn test_coerce_edit_value() {
        let number = json!(1.5);
        assert_eq!(coerce_edit_value(Some(&number), "2.25"), json!(2.25));
        assert_eq!(coerce_edit_value(Some(&number), "abc"), json!("abc"));
        assert_eq!(coerce_edit_value(Some(&json!("x")), "42"), json!("42"));
        assert_eq!(coerce_edit_value(None, "new"), json!("new"));
    }
}
