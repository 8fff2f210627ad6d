use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use wsb_core::update::UPDATE_DIALOG_ID;

use crate::router::AppState;

use super::turn::{on_turn_error, USAGE};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub(crate) async fn handle_command(
    bot: Bot,
    chat_id: i64,
    text: &str,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let (cmd, _args) = parse_command(text);
    let tg_chat = teloxide::types::ChatId(chat_id);

    match cmd.as_str() {
        "start" | "help" => {
            bot.send_message(tg_chat, USAGE).await?;
        }
        "update" => {
            let ctx = state.turn_context(chat_id);
            if let Err(e) = state.runner.begin(&ctx, UPDATE_DIALOG_ID).await {
                on_turn_error(&bot, &state, chat_id, &e).await;
            }
        }
        "cancel" => {
            let ctx = state.turn_context(chat_id);
            let reply = if state.runner.cancel(&ctx.conversation).await {
                info!(chat_id, "dialog cancelled");
                "Cancelled."
            } else {
                "Nothing to cancel."
            };
            bot.send_message(tg_chat, reply).await?;
        }
        _ => {
            bot.send_message(tg_chat, format!("Unknown command /{cmd}.\n\n{USAGE}"))
                .await?;
        }
    }

    Ok(())
}
