use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    dialog::{Dialog, DialogTurnStatus, NextAction, TurnContext},
    domain::{ConversationId, MessageId, MessageRef},
    errors::Error,
    prompt::{recognize, send_prompt, ChoicePromptOptions, FoundChoice},
    Result,
};

#[derive(Clone, Debug)]
struct DialogState {
    dialog_id: String,
    step: usize,
    prompt: ChoicePromptOptions,
    /// The message that currently shows the prompt; only its buttons count.
    prompt_message: MessageRef,
    attempts: u32,
}

/// Where a conversation stands from the runner's point of view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingChoice { dialog_id: String, step: usize },
}

/// Drives registered dialogs, one active dialog per conversation.
pub struct DialogRunner {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
    states: Mutex<HashMap<ConversationId, DialogState>>,
    max_prompt_attempts: u32,
}

impl DialogRunner {
    pub fn new(max_prompt_attempts: u32) -> Self {
        Self {
            dialogs: HashMap::new(),
            states: Mutex::new(HashMap::new()),
            max_prompt_attempts: max_prompt_attempts.max(1),
        }
    }

    pub fn with_dialog(mut self, dialog: Arc<dyn Dialog>) -> Self {
        self.dialogs.insert(dialog.id().to_string(), dialog);
        self
    }

    fn dialog(&self, id: &str) -> Result<Arc<dyn Dialog>> {
        self.dialogs
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Dialog(format!("unknown dialog: {id}")))
    }

    /// Start `dialog_id` for the turn's conversation, replacing whatever was active.
    pub async fn begin(&self, ctx: &TurnContext, dialog_id: &str) -> Result<DialogTurnStatus> {
        let dialog = self.dialog(dialog_id)?;
        if self.cancel(&ctx.conversation).await {
            debug!(conversation = %ctx.conversation, "replacing active dialog");
        }
        info!(conversation = %ctx.conversation, channel = %ctx.channel, dialog = dialog_id, "begin dialog");
        self.drive(ctx, dialog, 0, None).await
    }

    /// Feed a user reply to the conversation's active prompt.
    pub async fn continue_turn(&self, ctx: &TurnContext, input: &str) -> Result<DialogTurnStatus> {
        self.resume(ctx, None, input).await
    }

    /// Feed a button press. Buttons on any message other than the one showing
    /// the active prompt are `Stale` and leave the dialog where it is.
    pub async fn continue_button(
        &self,
        ctx: &TurnContext,
        message_id: MessageId,
        data: &str,
    ) -> Result<DialogTurnStatus> {
        self.resume(ctx, Some(message_id), data).await
    }

    async fn resume(
        &self,
        ctx: &TurnContext,
        pressed_on: Option<MessageId>,
        input: &str,
    ) -> Result<DialogTurnStatus> {
        let Some(state) = self.states.lock().await.get(&ctx.conversation).cloned() else {
            return Ok(DialogTurnStatus::Empty);
        };
        if let Some(message_id) = pressed_on {
            if message_id != state.prompt_message.message_id {
                debug!(conversation = %ctx.conversation, message_id = message_id.0, "button on an old prompt");
                return Ok(DialogTurnStatus::Stale);
            }
        }
        let dialog = self.dialog(&state.dialog_id)?;

        if let Some(found) = recognize(input, &state.prompt.choices) {
            debug!(conversation = %ctx.conversation, choice = %found.value, "choice recognized");
            self.states.lock().await.remove(&ctx.conversation);
            return self.drive(ctx, dialog, state.step + 1, Some(found)).await;
        }

        let attempts = state.attempts + 1;
        if attempts >= self.max_prompt_attempts {
            info!(conversation = %ctx.conversation, attempts, "prompt attempts exhausted");
            self.states.lock().await.remove(&ctx.conversation);
            return self.drive(ctx, dialog, state.step + 1, None).await;
        }

        let sent = send_prompt(
            &ctx.messenger,
            ctx.chat_id,
            state.prompt.retry_text(),
            &state.prompt.choices,
            state.prompt.style,
        )
        .await?;

        if let Some(st) = self.states.lock().await.get_mut(&ctx.conversation) {
            st.attempts = attempts;
            st.prompt_message = sent;
        }
        Ok(DialogTurnStatus::Waiting)
    }

    /// Drop the conversation's active dialog. Returns whether one was active.
    pub async fn cancel(&self, conversation: &ConversationId) -> bool {
        self.states.lock().await.remove(conversation).is_some()
    }

    pub async fn flow_state(&self, conversation: &ConversationId) -> FlowState {
        match self.states.lock().await.get(conversation) {
            Some(st) => FlowState::AwaitingChoice {
                dialog_id: st.dialog_id.clone(),
                step: st.step,
            },
            None => FlowState::Idle,
        }
    }

    async fn drive(
        &self,
        ctx: &TurnContext,
        dialog: Arc<dyn Dialog>,
        mut index: usize,
        mut result: Option<FoundChoice>,
    ) -> Result<DialogTurnStatus> {
        loop {
            debug!(conversation = %ctx.conversation, dialog = dialog.id(), step = index, "run step");
            match dialog.step(index, ctx, result.take()).await? {
                NextAction::Prompt(prompt) => {
                    let sent = send_prompt(
                        &ctx.messenger,
                        ctx.chat_id,
                        &prompt.prompt,
                        &prompt.choices,
                        prompt.style,
                    )
                    .await?;

                    self.states.lock().await.insert(
                        ctx.conversation.clone(),
                        DialogState {
                            dialog_id: dialog.id().to_string(),
                            step: index,
                            prompt,
                            prompt_message: sent,
                            attempts: 0,
                        },
                    );
                    return Ok(DialogTurnStatus::Waiting);
                }
                NextAction::ReplaceDialog => {
                    // Restarting from the first step without waiting on the user would never end.
                    if index == 0 {
                        return Err(Error::Dialog(format!(
                            "dialog {} replaced itself from its first step",
                            dialog.id()
                        )));
                    }
                    debug!(conversation = %ctx.conversation, dialog = dialog.id(), "replace dialog");
                    index = 0;
                }
                NextAction::Complete => {
                    info!(conversation = %ctx.conversation, dialog = dialog.id(), "dialog complete");
                    self.states.lock().await.remove(&ctx.conversation);
                    return Ok(DialogTurnStatus::Complete);
                }
            }
        }
    }
}
