//! 対話式レビュー画面
//!
//! 1プロンプトにつき1キーを読み、コントローラーのイベントに変換する。
//! ダイアログと編集モードはプロンプトで入力する。

use crate::api::Gateway;
use crate::error::{ReviewDeskError, Result};
use crate::keyboard::KeyEvent;
use crate::review::{
    IdleReason, Notice, Overlay, Phase, ReviewController, ReviewSession, RuntimeOptions, Shortcut,
};
use crate::session::SessionStore;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use review_desk_common::{coerce_edit_value, DatasetTypeSchema, FlagReason, WorkItem};
use serde_json::Value;
use std::time::Duration;

/// レビュー画面での操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewInput {
    Shortcut(Shortcut),
    ToggleDataCorrect,
    Next,
    Help,
    Quit,
    Unknown,
}

impl ReviewInput {
    pub fn parse(input: &str) -> Self {
        let Some(first) = input.trim().chars().next() else {
            return ReviewInput::Unknown;
        };
        if let Some(shortcut) = Shortcut::from_event(&KeyEvent::char(first)) {
            return ReviewInput::Shortcut(shortcut);
        }
        match first.to_ascii_lowercase() {
            'c' => ReviewInput::ToggleDataCorrect,
            'n' => ReviewInput::Next,
            'h' | '?' => ReviewInput::Help,
            'q' => ReviewInput::Quit,
            _ => ReviewInput::Unknown,
        }
    }
}

fn prompt_error(e: dialoguer::Error) -> ReviewDeskError {
    ReviewDeskError::Prompt(e.to_string())
}

pub fn prompt_text(prompt: &str, initial: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)
}

fn prompt_choice(prompt: &str, items: &[&str], default: usize) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()
        .map_err(prompt_error)
}

/// JSON値を入力欄用の文字列にする
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// アイテム見出し
pub fn item_header(item: &WorkItem) -> String {
    let number = item
        .item_number
        .map(|n| format!("#{}", n))
        .unwrap_or_else(|| item.id.clone());
    let gold = if item.is_gold { " ★gold" } else { "" };
    format!(
        "[{}] {} ({}) | 進捗 {:.0}% | スキップ {} (未チェック {}){}",
        item.modality.badge(),
        number,
        if item.language.is_empty() { "-" } else { item.language.as_str() },
        item.review_progress(),
        item.review_state.skip_count,
        item.unchecked_skips(),
        gold
    )
}

fn field_label(schema: Option<&DatasetTypeSchema>, key: &str) -> String {
    schema
        .map(|s| s.label_for(key).to_string())
        .unwrap_or_else(|| key.to_string())
}

fn is_media_field(schema: Option<&DatasetTypeSchema>, key: &str) -> bool {
    schema
        .and_then(|s| s.field(key))
        .is_some_and(|f| f.widget().is_media())
}

fn print_help() {
    println!("操作: [a]承認 [e]編集 [s]スキップ [f]フラグ [c]データは正しい [n]次へ [q]終了");
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// スピナーと通知の表示
#[derive(Default)]
struct StatusLine {
    spinner: Option<ProgressBar>,
    last_notice: Option<Notice>,
}

impl StatusLine {
    fn update(&mut self, controller: &ReviewController) {
        let busy = match controller.phase() {
            Phase::Loading => Some("アイテムを取得中..."),
            Phase::Submitting(_) => Some("送信中..."),
            _ => None,
        };
        match (busy, self.spinner.as_ref()) {
            (Some(msg), None) => self.spinner = Some(spinner(msg)),
            (Some(msg), Some(pb)) => pb.set_message(msg),
            (None, Some(_)) => {
                if let Some(pb) = self.spinner.take() {
                    pb.finish_and_clear();
                }
            }
            (None, None) => {}
        }

        let notice = controller.notice().cloned();
        if notice != self.last_notice {
            match &notice {
                Some(Notice::Success(message)) => println!("✅ {}", message),
                Some(Notice::Error(err)) => println!("⚠ {}", err),
                None => {}
            }
            self.last_notice = notice;
        }
    }
}

fn print_item<G: Gateway + 'static>(review: &ReviewSession<G>) {
    let controller = review.controller();
    let Some(item) = controller.item() else {
        return;
    };
    let schema = controller.schema();

    println!("\n{}", item_header(item));
    if let Some(s) = schema {
        if !s.name.is_empty() {
            println!("  データセット: {}", s.name);
        }
        if let Some(guide) = s.review_guidelines.as_deref().filter(|g| !g.is_empty()) {
            println!("  ガイドライン: {}", guide);
        }
    }
    println!("---");
    for (key, value) in &item.content {
        let prefix = if is_media_field(schema, key) { "🔗 " } else { "" };
        println!("  {}: {}{}", field_label(schema, key), prefix, display_value(value));
    }
    println!("---");
    if let Some(stats) = review.session().stats() {
        let balance = review
            .session()
            .user()
            .map(|u| u.payout_balance)
            .unwrap_or_default();
        println!(
            "  本日 {} 件 / 合計 {} 件 / 連続 {} 日 / 残高 ${:.2}",
            stats.today_reviews, stats.total_reviews, stats.streak, balance
        );
    }
    let check = if controller.skip_data_correct() { "☑" } else { "☐" };
    println!("  {} データは正しい（スキップ時）", check);
}

async fn run_skip_dialog<G: Gateway + 'static>(review: &mut ReviewSession<G>) -> Result<()> {
    println!("\n⚠ スキップが続いています。スキップの理由を入力してください（空欄可）");
    let current = review
        .controller()
        .skip_feedback()
        .unwrap_or_default()
        .to_string();
    let feedback = prompt_text("フィードバック", &current)?;
    review.update(|c| c.set_skip_feedback(&feedback));

    match prompt_choice("スキップを送信しますか？", &["送信", "キャンセル"], 0)? {
        0 => review.dispatch(ReviewController::submit_skip_feedback).await,
        _ => review.dispatch(|c| c.handle_key(&KeyEvent::escape())).await,
    }
    Ok(())
}

async fn run_flag_dialog<G: Gateway + 'static>(review: &mut ReviewSession<G>) -> Result<()> {
    println!("\n🚩 アイテムをフラグ");
    let draft = review.controller().flag_draft().cloned().unwrap_or_default();

    let labels: Vec<&str> = FlagReason::ALL.iter().map(FlagReason::label).collect();
    let current = FlagReason::ALL
        .iter()
        .position(|r| *r == draft.reason)
        .unwrap_or(0);
    let reason = FlagReason::ALL[prompt_choice("理由", &labels, current)?];
    let note = prompt_text("メモ（任意）", &draft.note)?;
    review.update(|c| c.set_flag_reason(reason) && c.set_flag_note(&note));

    match prompt_choice("フラグを送信しますか？", &["送信", "キャンセル"], 0)? {
        0 => review.dispatch(ReviewController::submit_flag).await,
        _ => review.dispatch(|c| c.handle_key(&KeyEvent::escape())).await,
    }
    Ok(())
}

async fn run_edit_step<G: Gateway + 'static>(review: &mut ReviewSession<G>) -> Result<()> {
    let controller = review.controller();
    let (Some(draft), Some(item)) = (controller.draft().cloned(), controller.item().cloned()) else {
        return Ok(());
    };
    let schema = controller.schema().cloned();

    println!("\n✏ 編集中");
    for (key, value) in &draft {
        println!("  {}: {}", field_label(schema.as_ref(), key), display_value(value));
    }

    match prompt_choice("操作", &["フィールドを編集", "保存", "キャンセル"], 0)? {
        0 => {
            let keys: Vec<String> = draft.keys().cloned().collect();
            if keys.is_empty() {
                return Ok(());
            }
            let labels: Vec<String> = keys
                .iter()
                .map(|k| field_label(schema.as_ref(), k))
                .collect();
            let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let index = prompt_choice("フィールド", &label_refs, 0)?;
            let key = &keys[index];
            let current = draft.get(key).map(display_value).unwrap_or_default();
            let input = prompt_text(&labels[index], &current)?;
            let value = coerce_edit_value(item.content.get(key), &input);
            review.update(|c| c.set_field(key, value));
        }
        1 => review.dispatch(ReviewController::save_edit).await,
        _ => review.dispatch(ReviewController::cancel_edit).await,
    }
    Ok(())
}

/// レビューループ本体。`q` で終了する。
pub async fn run_review<G: Gateway + 'static>(
    store: SessionStore<G>,
    options: RuntimeOptions,
) -> Result<()> {
    let mut review = ReviewSession::new(store, options);
    let mut status = StatusLine::default();
    review.observe(move |c| status.update(c));

    println!("📝 review-desk - レビュー\n");
    print_help();
    review.start().await;
    review.dispatch(ReviewController::fetch_next).await;

    loop {
        let phase = review.controller().phase();
        match phase {
            Phase::Idle(reason) => {
                if reason == IdleReason::NotStarted {
                    println!("レビューを開始できます");
                }
                let input: String = Input::new()
                    .with_prompt("[n]次のアイテム [q]終了")
                    .allow_empty(true)
                    .interact_text()
                    .map_err(prompt_error)?;
                match ReviewInput::parse(&input) {
                    ReviewInput::Next => review.dispatch(ReviewController::fetch_next).await,
                    ReviewInput::Quit => break,
                    _ => {}
                }
            }
            Phase::Ready => {
                let overlay_is_flag = review.controller().overlay().map(Overlay::is_flag);
                match overlay_is_flag {
                    Some(false) => {
                        run_skip_dialog(&mut review).await?;
                        continue;
                    }
                    Some(true) => {
                        run_flag_dialog(&mut review).await?;
                        continue;
                    }
                    None => {}
                }

                print_item(&review);
                let input: String = Input::new()
                    .with_prompt("操作 (h:ヘルプ)")
                    .allow_empty(true)
                    .interact_text()
                    .map_err(prompt_error)?;
                match ReviewInput::parse(&input) {
                    ReviewInput::Shortcut(shortcut) => {
                        let event = KeyEvent::char(shortcut.key_hint());
                        review.dispatch(|c| c.handle_key(&event)).await;
                    }
                    ReviewInput::ToggleDataCorrect => {
                        review.update(|c| {
                            let checked = !c.skip_data_correct();
                            c.set_skip_data_correct(checked)
                        });
                    }
                    ReviewInput::Next => review.dispatch(ReviewController::fetch_next).await,
                    ReviewInput::Help | ReviewInput::Unknown => print_help(),
                    ReviewInput::Quit => break,
                }
            }
            Phase::Editing => run_edit_step(&mut review).await?,
            Phase::Loading | Phase::Submitting(_) | Phase::Advancing => {
                tracing::warn!(?phase, "unexpected phase between prompts");
                break;
            }
        }
    }

    review.dispose();
    println!("\n👋 レビューを終了しました");
    Ok(())
}

/// パニック境界から呼ぶ。リセットするか確認する。
pub fn confirm_reset(message: &str) -> bool {
    println!("\n💥 {}", crate::boundary::RECOVERY_MESSAGE);
    println!("  ({})", message);
    matches!(prompt_choice("画面をリセットしますか？", &["リセット", "終了"], 0), Ok(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_review_input() {
        assert_eq!(ReviewInput::parse("a"), ReviewInput::Shortcut(Shortcut::Approve));
        assert_eq!(ReviewInput::parse(" S "), ReviewInput::Shortcut(Shortcut::Skip));
        assert_eq!(ReviewInput::parse("c"), ReviewInput::ToggleDataCorrect);
        assert_eq!(ReviewInput::parse("N"), ReviewInput::Next);
        assert_eq!(ReviewInput::parse("q"), ReviewInput::Quit);
        assert_eq!(ReviewInput::parse("?"), ReviewInput::Help);
        assert_eq!(ReviewInput::parse(""), ReviewInput::Unknown);
        assert_eq!(ReviewInput::parse("z"), ReviewInput::Unknown);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("hello")), "hello");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!(["a"])), "[\"a\"]");
    }

    #[test]
    fn test_item_header() {
        let item: WorkItem = serde_json::from_value(json!({
            "_id": "x1",
            "item_number": 42,
            "language": "hi",
            "modality": "voice",
            "is_gold": true,
            "review_state": {"review_count": 3, "skip_count": 4, "unchecked_skips": 2}
        }))
        .unwrap();
        assert_eq!(
            item_header(&item),
            "[VOICE] #42 (hi) | 進捗 100% | スキップ 4 (未チェック 2) ★gold"
        );
    }
}
