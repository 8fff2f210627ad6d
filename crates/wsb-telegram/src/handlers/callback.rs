use std::sync::Arc;

use teloxide::prelude::*;

use wsb_core::prompt::CHOICE_CALLBACK_PREFIX;
use wsb_core::{
    dialog::DialogTurnStatus,
    domain::{MessageId, UserId},
    security::is_authorized,
};

use crate::router::AppState;

use super::turn::{on_turn_error, NO_DIALOG_HINT};

const STALE_PROMPT: &str = "This prompt has expired";

/// Button presses on a choice prompt carry `choice:{index}`.
fn is_choice_data(data: &str) -> bool {
    data.strip_prefix(CHOICE_CALLBACK_PREFIX)
        .is_some_and(|rest| rest.starts_with(':'))
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let pressed_on = q.message.as_ref().map(|m| (m.chat.id.0, MessageId(m.id.0)));
    let data = q.data.clone().unwrap_or_default();

    if !is_authorized(Some(UserId(q.from.id.0 as i64)), &state.cfg.telegram_allowed_users) {
        let _ = state
            .messenger
            .answer_callback_query(&cb_id, Some("Unauthorized"))
            .await;
        return Ok(());
    }

    let (Some((chat_id, message_id)), true) = (pressed_on, is_choice_data(&data)) else {
        // Nothing to resume; still answer so the client stops its spinner.
        let _ = state.messenger.answer_callback_query(&cb_id, None).await;
        return Ok(());
    };

    let guard = state.chat_locks.lock_chat(chat_id).await;
    let ctx = state.turn_context(chat_id);
    let outcome = state.runner.continue_button(&ctx, message_id, &data).await;

    let notice = match &outcome {
        Ok(DialogTurnStatus::Stale) => Some(STALE_PROMPT),
        Ok(DialogTurnStatus::Empty) => Some(NO_DIALOG_HINT),
        _ => None,
    };
    let _ = state.messenger.answer_callback_query(&cb_id, notice).await;

    if let Err(e) = outcome {
        on_turn_error(&bot, &state, chat_id, &e).await;
    }
    drop(guard);
    state.chat_locks.prune(chat_id).await;
    Ok(())
}
