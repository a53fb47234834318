use clap::{Parser, Subcommand};
use review_desk_common::FlagReason;

#[derive(Parser)]
#[command(name = "review-desk")]
#[command(about = "データラベリング・レビュー用クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// APIのベースURL（設定ファイルより優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ログイン
    Login {
        /// ユーザー名（省略時は入力を求める）
        #[arg(short, long)]
        username: Option<String>,
    },

    /// アカウント登録（登録後そのままログイン）
    Register {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// レビュー言語（カンマ区切り, 例: en,hi）
        #[arg(short, long, default_value = "en", value_delimiter = ',')]
        languages: Vec<String>,
    },

    /// ログアウト（保存済みトークンを削除）
    Logout,

    /// 現在のユーザーを表示
    Whoami,

    /// レビューを開始
    Review,

    /// レビュー統計を表示
    Stats,

    /// 支払いをリクエスト
    Payout {
        /// 金額（USD）
        #[arg(required = true)]
        amount: f64,
    },

    /// パスワード変更
    Password,

    /// ローカル設定の表示・変更
    Config {
        /// APIのベースURLを保存
        #[arg(long)]
        set_base_url: Option<String>,

        /// リクエストのタイムアウト（秒）
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },

    /// フラグ付きアイテムの一覧・トリアージ（オペレーター）
    Flags {
        /// データセット種別で絞り込み
        #[arg(long)]
        dataset_type: Option<String>,

        /// 言語で絞り込み
        #[arg(long)]
        language: Option<String>,

        /// フラグ理由で絞り込み (unclear/corrupt/offensive/other)
        #[arg(long)]
        reason: Option<FlagReason>,

        #[arg(long, default_value = "50")]
        limit: u64,

        #[arg(long, default_value = "0")]
        offset: u64,

        /// 対応を記録するアイテムID
        #[arg(long, requires = "action")]
        triage: Option<String>,

        /// 対応 (resolve/dismiss/re-review)
        #[arg(long)]
        action: Option<String>,

        /// 対応メモ
        #[arg(long, default_value = "")]
        note: String,
    },

    /// システム設定の表示・変更（オペレーター）
    SystemConfig {
        /// スキップフィードバックを求めるまでの未チェックスキップ数
        #[arg(long)]
        max_unchecked_skips: Option<u32>,
    },
}
