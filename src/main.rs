use anyhow::Context;
use clap::Parser;
use dialoguer::{Input, Password};
use review_desk::api::{skip_prompt_update, HttpGateway, ReviewApi};
use review_desk::cli::{Cli, Commands};
use review_desk::config::{Config, BASE_URL_ENV};
use review_desk::error::ReviewDeskError;
use review_desk::review::RuntimeOptions;
use review_desk::session::SessionStore;
use review_desk::token_store::{FileTokenStore, TokenStore};
use review_desk::triage::{self, FileResolutionStore, TriageAction};
use review_desk::{boundary, terminal};
use review_desk_common::{FlaggedFilters, PayoutRequest, RegisterRequest, UserProfile};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Session = SessionStore<HttpGateway>;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "review_desk=debug"
    } else {
        "review_desk=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// 保存済みトークンからユーザーを復元（できなければ未ログイン）
async fn require_user(store: &Session) -> anyhow::Result<UserProfile> {
    let user = store.restore().await;
    if let Some(notice) = store.take_notice() {
        println!("⚠ {}", notice);
    }
    Ok(user.ok_or(ReviewDeskError::NotAuthenticated)?)
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    let value: String = Input::new().with_prompt(prompt).interact_text()?;
    Ok(value.trim().to_string())
}

fn print_profile(profile: &UserProfile, store: &Session) {
    println!("👤 {} <{}>", profile.username, profile.email);
    println!("  ロール: {}", profile.roles.join(", "));
    println!("  言語: {}", profile.review_languages().join(", "));
    println!("  残高: ${:.2}", profile.payout_balance);
    if let Some(stats) = store.stats() {
        println!(
            "  本日 {} 件 / 合計 {} 件 / 連続 {} 日",
            stats.today_reviews, stats.total_reviews, stats.streak
        );
    }
}

fn run_config(
    mut config: Config,
    set_base_url: Option<String>,
    set_timeout: Option<u64>,
    show: bool,
) -> anyhow::Result<()> {
    let mut changed = false;
    if let Some(url) = set_base_url {
        config.set_base_url(url)?;
        changed = true;
    }
    if let Some(seconds) = set_timeout {
        config.request_timeout_seconds = seconds;
        config.validate()?;
        config.save()?;
        changed = true;
    }
    if changed {
        println!("✔ 設定を保存: {}", Config::config_path()?.display());
    }
    if show || !changed {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = Config::load()?;

    // 保存するのはファイルの設定だけ
    if let Commands::Config {
        set_base_url,
        set_timeout,
        show,
    } = cli.command
    {
        return run_config(file_config, set_base_url, set_timeout, show);
    }

    let env_url = std::env::var(BASE_URL_ENV).ok();
    let config = file_config.with_overrides(env_url.as_deref(), cli.base_url.as_deref())?;

    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::in_dir(&Config::config_dir()?));
    let gateway = HttpGateway::new(&config.base_url, config.request_timeout())?;
    let store: Session = SessionStore::new(Arc::new(ReviewApi::new(gateway, tokens)));
    tracing::debug!(base_url = %config.base_url, "api client ready");

    match cli.command {
        Commands::Login { username } => {
            let username = match username {
                Some(u) => u,
                None => prompt_line("ユーザー名")?,
            };
            let password = Password::new().with_prompt("パスワード").interact()?;
            let profile = store.login(&username, &password).await?;
            println!("✔ ようこそ、{} さん", profile.username);
        }

        Commands::Register {
            username,
            email,
            languages,
        } => {
            let username = match username {
                Some(u) => u,
                None => prompt_line("ユーザー名")?,
            };
            let email = match email {
                Some(e) => e,
                None => prompt_line("メールアドレス")?,
            };
            let password = Password::new()
                .with_prompt("パスワード")
                .with_confirmation("パスワード（確認）", "パスワードが一致しません")
                .interact()?;
            let request = RegisterRequest {
                username,
                email,
                password,
                languages,
            };
            let profile = store.register(&request).await?;
            println!("✔ 登録しました。ようこそ、{} さん", profile.username);
        }

        Commands::Logout => {
            store.logout("");
            println!("✔ ログアウトしました");
        }

        Commands::Whoami => {
            let profile = require_user(&store).await?;
            print_profile(&profile, &store);
        }

        Commands::Review => {
            let profile = require_user(&store).await?;
            tracing::info!(user = %profile.username, "starting review session");
            let options = RuntimeOptions {
                delays: config.advance_delays(),
                request_timeout: config.request_timeout(),
            };
            boundary::run_with_boundary(
                || terminal::run_review(store.clone(), options),
                terminal::confirm_reset,
            )
            .await?;
        }

        Commands::Stats => {
            let profile = require_user(&store).await?;
            print_profile(&profile, &store);
            let stats = store.api().review_stats().await?;
            println!("\n📊 レビュー統計");
            println!("{}", serde_json::to_string_pretty(&stats)?);
            let reviews = store.api().my_reviews().await?;
            println!("  直近のレビュー: {} 件", reviews.len());
            let languages = store.review_languages();
            let queue = store.api().dataset_stats(Some(languages.as_slice())).await?;
            println!("\n📦 キュー状況 ({})", languages.join(", "));
            println!("{}", serde_json::to_string_pretty(&queue)?);
        }

        Commands::Payout { amount } => {
            require_user(&store).await?;
            let response = store
                .api()
                .request_payout(&PayoutRequest::bank_transfer(amount))
                .await
                .context("支払いリクエストに失敗しました")?;
            store.refresh_user().await;
            println!("✔ 支払いをリクエストしました (${:.2})", amount);
            if let Some(message) = response.get("message").and_then(|m| m.as_str()) {
                println!("  {}", message);
            }
            if let Some(user) = store.user() {
                println!("  残高: ${:.2}", user.payout_balance);
            }
        }

        Commands::Password => {
            require_user(&store).await?;
            let current = Password::new().with_prompt("現在のパスワード").interact()?;
            let new = Password::new()
                .with_prompt("新しいパスワード")
                .with_confirmation("新しいパスワード（確認）", "パスワードが一致しません")
                .interact()?;
            store.api().change_password(&current, &new).await?;
            println!("✔ パスワードを変更しました");
        }

        Commands::Flags {
            dataset_type,
            language,
            reason,
            limit,
            offset,
            triage: triage_item,
            action,
            note,
        } => {
            let profile = require_user(&store).await?;
            if !profile.has_role("operator") {
                tracing::warn!(user = %profile.username, "user does not have the operator role");
            }

            let mut resolutions = FileResolutionStore::load(&Config::config_dir()?);
            if let Some(item_id) = triage_item {
                let action: TriageAction = action.as_deref().unwrap_or_default().parse()?;
                let resolution = triage::triage(&mut resolutions, &item_id, action, &note)?;
                println!("✔ {}", triage::triage_message(&item_id, resolution.status));
            }

            let filters = FlaggedFilters {
                dataset_type_id: dataset_type,
                language,
                reason,
                limit: Some(limit),
                offset: Some(offset),
            };
            let page = store.api().flagged_items(&filters).await?;

            println!("🚩 フラグ付きアイテム: {} 件中 {} 件", page.total, page.items.len());
            println!("---");
            for item in &page.items {
                let latest = item
                    .flags
                    .last()
                    .map(|f| f.reason.label())
                    .unwrap_or("-");
                println!(
                    "[{}] {} {} ({}) フラグ {} 件 / {} / {}",
                    item.modality.badge(),
                    item.id,
                    item.dataset_type_name,
                    item.language.as_deref().unwrap_or("-"),
                    item.flags.len(),
                    latest,
                    triage::status_of(&resolutions, &item.id)
                );
                for flag in &item.flags {
                    if let Some(n) = flag.note.as_deref() {
                        println!("    - {}: {}", flag.reviewer_id, n);
                    }
                }
            }
            let counts = triage::status_counts(&page.items, &resolutions);
            println!("---");
            println!(
                "未対応 {} / 対応済み {} / 却下 {} / 再レビュー {}",
                counts.pending, counts.resolved, counts.dismissed, counts.re_review
            );
            if page.has_more {
                println!("  続きは --offset {} で表示", page.offset + page.limit);
            }
        }

        Commands::SystemConfig {
            max_unchecked_skips,
        } => {
            require_user(&store).await?;
            if let Some(n) = max_unchecked_skips {
                store
                    .api()
                    .update_system_config(&skip_prompt_update(n))
                    .await?;
                println!("✔ スキップフィードバックの閾値を {} に変更しました", n);
            }
            let system = store.api().system_config().await?;
            println!("{}", serde_json::to_string_pretty(&system)?);
            println!(
                "  有効な閾値: {}",
                system.skip_prompt_threshold()
            );
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
