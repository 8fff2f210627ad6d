use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use wsb_core::{
    channel::Channel,
    config::Config,
    dialog::{DialogRunner, TurnContext},
    domain::{ChatId, ConversationId},
    messaging::{port::MessagingPort, throttled::ThrottledMessenger},
    tracker::UpdateTracker,
    update::UpdateDialog,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub runner: Arc<DialogRunner>,
    pub chat_locks: Arc<ChatLocks>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, messenger: Arc<dyn MessagingPort>) -> Self {
        let tracker = Arc::new(UpdateTracker::new());
        let runner = DialogRunner::new(cfg.prompt_max_attempts)
            .with_dialog(Arc::new(UpdateDialog::new(tracker)));

        Self {
            cfg,
            messenger,
            runner: Arc::new(runner),
            chat_locks: Arc::new(ChatLocks::default()),
        }
    }

    /// Turn context for a Telegram chat; the chat is the conversation.
    pub fn turn_context(&self, chat_id: i64) -> TurnContext {
        TurnContext {
            channel: Channel::Telegram,
            conversation: ConversationId::from(ChatId(chat_id)),
            chat_id: ChatId(chat_id),
            messenger: self.messenger.clone(),
        }
    }
}

/// Serializes turns per chat so a conversation never runs two steps at once.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Forget the chat's lock once nobody holds or waits on it. Call after
    /// dropping the guard from [`ChatLocks::lock_chat`].
    pub async fn prune(&self, chat_id: i64) {
        let mut map = self.inner.lock().await;
        if map.get(&chat_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            map.remove(&chat_id);
        }
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "bot started"),
        Err(e) => warn!(error = %e, "could not fetch bot identity"),
    }
    if cfg.telegram_allowed_users.is_empty() {
        info!("no allow-list configured; every user may use the bot");
    } else {
        info!(count = cfg.telegram_allowed_users.len(), "allow-list configured");
    }

    // Throttle the raw messenger; the adapter still honors a single RetryAfter on its own.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> =
        Arc::new(ThrottledMessenger::new(raw_messenger, cfg.throttle));

    let state = Arc::new(AppState::new(cfg, messenger));

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
