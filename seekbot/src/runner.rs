//! REPL runner: builds the key pool, upstream client, and router, resolves
//! the bot handle, then converts each teloxide message to a core message and
//! spawns the router on it. Ctrl-C stops the REPL; in-flight completions get
//! a bounded grace period before the process exits.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use seekbot_core::{init_tracing, Bot, TelegramBot, TelegramMessageWrapper, ToCoreMessage};
use seekbot_upstream::{CompletionClient, KeyPool, OpenRouterClient};
use tracing::{error, info, warn};

use crate::config::{normalize_username, BotConfig};
use crate::history::HistoryStore;
use crate::rate_limit::RateLimiter;
use crate::router::Router;

/// How long shutdown waits for in-flight completions before abandoning them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Main entry: init logging, build components, resolve the bot handle, run
/// the REPL until Ctrl-C, then drain in-flight requests.
pub async fn run_bot(config: BotConfig) -> Result<()> {
    if let Some(parent) = Path::new(&config.log_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    init_tracing(&config.log_file)?;

    info!(
        model = %config.model,
        key_count = config.api_keys.len(),
        history_depth = config.history_depth,
        rate_limit_seconds = config.rate_limit_seconds,
        "Initializing bot"
    );

    let pool = Arc::new(KeyPool::new(config.api_keys.clone())?);
    let llm: Arc<dyn CompletionClient> = Arc::new(
        OpenRouterClient::new(pool, Duration::from_secs(config.api_timeout_secs))?
            .with_base_url(config.openrouter_base_url.clone())
            .with_model(config.model.clone()),
    );

    let teloxide_bot = teloxide::Bot::new(config.bot_token.clone());
    let bot_username = resolve_bot_username(&teloxide_bot, &config).await?;
    info!(username = %bot_username, "Bot handle resolved");

    let bot: Arc<dyn Bot> = Arc::new(TelegramBot::new(teloxide_bot.clone()));
    let history = Arc::new(HistoryStore::new(config.history_depth));
    let rate_limiter = Arc::new(RateLimiter::new(
        Duration::from_secs(config.rate_limit_seconds),
        config.max_concurrent_requests,
    ));
    let router = Arc::new(Router::new(
        bot_username,
        bot,
        llm,
        history,
        rate_limiter,
        &config,
    ));

    let in_flight = Arc::new(AtomicUsize::new(0));

    info!("Bot started successfully");

    let repl_router = router.clone();
    let repl_in_flight = in_flight.clone();
    teloxide::repl(
        teloxide_bot,
        move |_bot: teloxide::Bot, msg: teloxide::types::Message| {
            let router = repl_router.clone();
            let in_flight = repl_in_flight.clone();

            async move {
                // Ignore messages from other bots and sender-less updates.
                let from_bot = msg.from.as_ref().map(|u| u.is_bot).unwrap_or(true);
                if from_bot {
                    return Ok(());
                }

                let core_msg = TelegramMessageWrapper(&msg).to_core();
                if core_msg.content.is_empty() {
                    info!(
                        user_id = core_msg.user.id,
                        chat_id = core_msg.chat.id,
                        "Received non-text message, skipping"
                    );
                    return Ok(());
                }

                info!(
                    user_id = core_msg.user.id,
                    chat_id = core_msg.chat.id,
                    message_id = %core_msg.id,
                    "Received message"
                );

                // Run the router in a spawned task so the REPL returns
                // immediately and other users' events are never blocked.
                in_flight.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    if let Err(e) = router.handle(&core_msg).await {
                        error!(error = %e, user_id = core_msg.user.id, "Router failed");
                    }
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });

                Ok(())
            }
        },
    )
    .await;

    drain_in_flight(&in_flight).await;
    info!("Bot shutdown completed");
    Ok(())
}

/// Resolves the normalized bot handle: config override, else `get_me()`.
async fn resolve_bot_username(bot: &teloxide::Bot, config: &BotConfig) -> Result<String> {
    use teloxide::prelude::Requester;

    if let Some(username) = &config.bot_username {
        return Ok(username.clone());
    }
    let me = bot
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("get_me failed: {}", e))?;
    me.user
        .username
        .as_deref()
        .map(normalize_username)
        .ok_or_else(|| anyhow::anyhow!("Bot account has no username; set BOT_USERNAME"))
}

/// Waits up to [`SHUTDOWN_GRACE`] for spawned router tasks to finish.
async fn drain_in_flight(in_flight: &AtomicUsize) {
    let deadline = Instant::now() + SHUTDOWN_GRACE;
    loop {
        let remaining = in_flight.load(Ordering::SeqCst);
        if remaining == 0 {
            return;
        }
        if Instant::now() >= deadline {
            warn!(remaining, "Shutdown grace elapsed, abandoning in-flight requests");
            return;
        }
        info!(remaining, "Waiting for in-flight requests to complete");
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}
