//! Minimal dialog host: a step-based dialog interface and the runner that
//! drives it across turns.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    channel::Channel,
    domain::{ChatId, ConversationId, MessageRef},
    messaging::port::MessagingPort,
    prompt::{ChoicePromptOptions, FoundChoice},
    Result,
};

pub mod runner;

pub use runner::{DialogRunner, FlowState};

/// Everything a dialog step may look at or act through during one turn.
#[derive(Clone)]
pub struct TurnContext {
    pub channel: Channel,
    pub conversation: ConversationId,
    pub chat_id: ChatId,
    pub messenger: Arc<dyn MessagingPort>,
}

impl TurnContext {
    pub async fn send_text(&self, text: &str) -> Result<MessageRef> {
        self.messenger.send_text(self.chat_id, text).await
    }

    pub async fn edit_text(&self, message: MessageRef, text: &str) -> Result<()> {
        self.messenger.edit_text(message, text).await
    }
}

/// What a step wants the runner to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextAction {
    /// Show a choice prompt and wait; the reply is handed to the next step.
    Prompt(ChoicePromptOptions),
    /// Restart the same dialog from its first step.
    ReplaceDialog,
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogTurnStatus {
    /// No dialog was active for the conversation.
    Empty,
    Waiting,
    Complete,
    /// A button from a prompt that is no longer the active one; nothing ran.
    Stale,
}

/// A dialog made of ordered steps.
///
/// `step(0, ..)` runs when the dialog begins. Each later step receives the
/// choice recognized from the previous step's prompt, or `None` when the prompt
/// gave up.
#[async_trait]
pub trait Dialog: Send + Sync {
    fn id(&self) -> &str;

    async fn step(
        &self,
        index: usize,
        ctx: &TurnContext,
        result: Option<FoundChoice>,
    ) -> Result<NextAction>;
}
