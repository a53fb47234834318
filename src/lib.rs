//! review-desk
//!
//! データラベリング用レビュークライアント。レビューキューからアイテムを取り出し、
//! 承認・編集・スキップ・フラグを送信する。

pub mod api;
pub mod boundary;
pub mod cli;
pub mod config;
pub mod error;
pub mod focus;
pub mod keyboard;
pub mod review;
pub mod session;
pub mod terminal;
pub mod token_store;
pub mod triage;
