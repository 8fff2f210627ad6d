//! Outbound pacing for the update demo.
//!
//! A "yes" turn produces an edit followed by a prompt send in the same chat,
//! and a user hammering "yes" can outrun Telegram's per-chat limit quickly.
//! [`ThrottledMessenger`] spaces those calls out before they reach the adapter.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Spacing between any two outbound calls, across all chats.
    pub global_min_interval: Duration,
    /// Spacing between sends/edits aimed at the same chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40),
            per_chat_min_interval: Duration::from_millis(1050),
        }
    }
}

/// Earliest instant the next call may go out, given the previous slot.
fn claim_slot(next_free: &mut Instant, interval: Duration) -> Duration {
    let now = Instant::now();
    let start = (*next_free).max(now);
    *next_free = start + interval;
    start - now
}

/// Paces the wrapped messenger.
///
/// Edits and sends are keyed by chat; callback answers carry no chat and only
/// take a global slot. Pacing is best-effort, so the adapter still has to cope
/// with an occasional flood-wait from Telegram.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global_next: Mutex<Instant>,
    chat_next: Mutex<HashMap<i64, Instant>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global_next: Mutex::new(Instant::now()),
            chat_next: Mutex::new(HashMap::new()),
        }
    }

    async fn pace(&self, chat: Option<ChatId>) {
        let global_wait = claim_slot(
            &mut *self.global_next.lock().await,
            self.cfg.global_min_interval,
        );
        let chat_wait = match chat {
            Some(chat) => {
                let mut map = self.chat_next.lock().await;
                let next_free = map.entry(chat.0).or_insert_with(Instant::now);
                claim_slot(next_free, self.cfg.per_chat_min_interval)
            }
            None => Duration::ZERO,
        };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.pace(Some(chat_id)).await;
        self.inner.send_text(chat_id, text).await
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.pace(Some(msg.chat_id)).await;
        self.inner.edit_text(msg, text).await
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.pace(Some(chat_id)).await;
        self.inner
            .send_inline_keyboard(chat_id, text, keyboard)
            .await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.pace(None).await;
        self.inner.answer_callback_query(callback_id, text).await
    }
}
