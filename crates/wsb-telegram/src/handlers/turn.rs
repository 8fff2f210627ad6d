use std::sync::Arc;

use teloxide::prelude::*;
use tracing::error;

use wsb_core::{dialog::DialogTurnStatus, errors::Error};

use crate::router::AppState;

pub(crate) const USAGE: &str = "This bot demonstrates editing a message it already sent.\n\n\
/update - send a message, then update it as often as you like\n\
/cancel - stop the running demo\n\
/help - show this message";

pub(crate) const NO_DIALOG_HINT: &str = "Nothing is running. Send /update to start the demo.";

/// Feed user input (typed text or button data) to the chat's active dialog.
pub(crate) async fn continue_dialog(
    bot: &Bot,
    state: &Arc<AppState>,
    chat_id: i64,
    input: &str,
) -> ResponseResult<()> {
    let ctx = state.turn_context(chat_id);
    match state.runner.continue_turn(&ctx, input).await {
        Ok(DialogTurnStatus::Empty) => {
            let _ = bot
                .send_message(teloxide::types::ChatId(chat_id), NO_DIALOG_HINT)
                .await;
        }
        Ok(_) => {}
        Err(e) => on_turn_error(bot, state, chat_id, &e).await,
    }
    Ok(())
}

/// Turn-level failure handling: log, drop the chat's dialog, tell the user.
pub(crate) async fn on_turn_error(bot: &Bot, state: &Arc<AppState>, chat_id: i64, err: &Error) {
    error!(chat_id, error = %err, "turn failed");

    let ctx = state.turn_context(chat_id);
    state.runner.cancel(&ctx.conversation).await;

    let _ = bot
        .send_message(
            teloxide::types::ChatId(chat_id),
            format!("❌ The bot encountered an error: {}", truncate(&err.to_string(), 200)),
        )
        .await;
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
