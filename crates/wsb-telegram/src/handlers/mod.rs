//! Telegram update handlers.
//!
//! Each handler checks authorization, takes the chat's turn lock and hands the
//! turn to the dialog runner.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use wsb_core::domain::UserId;
use wsb_core::security::is_authorized;

use crate::router::AppState;

mod callback;
mod commands;
mod turn;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        let _ = bot
            .send_message(
                msg.chat.id,
                "Unauthorized. Contact the bot owner for access.",
            )
            .await;
        return Ok(());
    }

    let Some(text) = msg.text().map(|s| s.to_string()) else {
        let _ = bot
            .send_message(msg.chat.id, "Only text messages are understood here.")
            .await;
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let guard = state.chat_locks.lock_chat(chat_id).await;

    let result = if text.starts_with('/') {
        commands::handle_command(bot, chat_id, &text, state.clone()).await
    } else {
        turn::continue_dialog(&bot, &state, chat_id, &text).await
    };

    drop(guard);
    state.chat_locks.prune(chat_id).await;
    result
}
