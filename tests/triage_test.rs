//! フラグ対応の保存テスト

use review_desk::error::ReviewDeskError;
use review_desk::triage::{
    self, FileResolutionStore, MemoryResolutionStore, ResolutionStore, TriageAction, TriageStatus,
    EMPTY_NOTE_PLACEHOLDER,
};
use review_desk_common::FlaggedItem;
use tempfile::tempdir;

fn flagged(id: &str) -> FlaggedItem {
    FlaggedItem {
        id: id.to_string(),
        ..Default::default()
    }
}

/// 保存した対応は再読み込み後も残る
#[test]
fn test_file_store_persists_across_loads() {
    let dir = tempdir().expect("Failed to create temp dir");

    let mut store = FileResolutionStore::load(dir.path());
    assert!(store.is_empty());
    triage::triage(&mut store, "item-1", TriageAction::Resolve, "fixed the label").unwrap();
    triage::triage(&mut store, "item-2", TriageAction::ReReview, "").unwrap();
    assert!(store.path().exists());

    let reloaded = FileResolutionStore::load(dir.path());
    assert_eq!(reloaded.len(), 2);

    let first = reloaded.get("item-1").unwrap();
    assert_eq!(first.status, TriageStatus::Resolved);
    assert_eq!(first.note, "fixed the label");
    assert!(!first.updated_at.is_empty());

    let second = reloaded.get("item-2").unwrap();
    assert_eq!(second.status, TriageStatus::ReReview);
    assert_eq!(second.note, EMPTY_NOTE_PLACEHOLDER);
}

/// 壊れたファイルは空として読み込む
#[test]
fn test_file_store_ignores_corrupt_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("flag-resolutions.json"), "{ not json").unwrap();

    let store = FileResolutionStore::load(dir.path());
    assert!(store.is_empty());
    assert_eq!(triage::status_of(&store, "item-1"), TriageStatus::Pending);
}

/// バージョン違いのファイルも空として扱う
#[test]
fn test_file_store_ignores_other_version() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(
        dir.path().join("flag-resolutions.json"),
        r#"{"version": 99, "entries": {"item-1": {"status": "resolved", "note": "x", "updated_at": "2024-01-01T00:00:00Z"}}}"#,
    )
    .unwrap();

    let store = FileResolutionStore::load(dir.path());
    assert!(store.is_empty());
}

/// 上書きすると最新の対応だけが残る
#[test]
fn test_triage_overwrites_previous_resolution() {
    let mut store = MemoryResolutionStore::new();
    triage::triage(&mut store, "item-1", TriageAction::Dismiss, "not an issue").unwrap();
    triage::triage(&mut store, "item-1", TriageAction::ReReview, "second look").unwrap();

    let resolution = store.get("item-1").unwrap();
    assert_eq!(resolution.status, TriageStatus::ReReview);
    assert_eq!(resolution.note, "second look");
}

/// メモ無しの却下は保存されない
#[test]
fn test_dismiss_without_note_is_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = FileResolutionStore::load(dir.path());

    let err = triage::triage(&mut store, "item-1", TriageAction::Dismiss, "   ").unwrap_err();
    assert!(matches!(err, ReviewDeskError::Triage(_)));
    assert!(err.to_string().contains("Please add a short note before saving."));
    assert!(store.is_empty());
    assert!(!store.path().exists());
}

#[test]
fn test_status_counts_over_page() {
    let mut store = MemoryResolutionStore::new();
    triage::triage(&mut store, "a", TriageAction::Resolve, "ok").unwrap();
    triage::triage(&mut store, "b", TriageAction::Dismiss, "dup").unwrap();
    triage::triage(&mut store, "c", TriageAction::ReReview, "").unwrap();
    // 一覧に無いアイテムは数えない
    triage::triage(&mut store, "zz", TriageAction::Resolve, "gone").unwrap();

    let items = vec![flagged("a"), flagged("b"), flagged("c"), flagged("d"), flagged("e")];
    let counts = triage::status_counts(&items, &store);

    assert_eq!(counts.pending, 2);
    assert_eq!(counts.resolved, 1);
    assert_eq!(counts.dismissed, 1);
    assert_eq!(counts.re_review, 1);
}

#[test]
fn test_triage_messages() {
    assert_eq!(
        triage::triage_message("abc", TriageStatus::ReReview),
        "Sent item abc for re-review"
    );
    assert_eq!(
        triage::triage_message("abc", TriageStatus::Resolved),
        format!("Updated flag as {}", TriageStatus::Resolved)
    );
}
