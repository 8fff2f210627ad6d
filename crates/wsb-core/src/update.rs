//! The update dialog: sends a message, then edits it in place on every loop.
//!
//! Step 0 sends (or edits) the tracked message and asks whether to go again.
//! Step 1 either restarts the dialog or clears the tracker and completes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    channel::Channel,
    dialog::{Dialog, NextAction, TurnContext},
    errors::Error,
    prompt::{to_choices, ChoicePromptOptions, FoundChoice, ListStyle},
    tracker::{TrackedMessage, UpdateTracker},
    Result,
};

pub const UPDATE_DIALOG_ID: &str = "update";

pub const ORIGINAL_TEXT: &str = "Here is the original activity";
pub const PROMPT_TEXT: &str = "Do you want to update the activity again?";
pub const RETRY_TEXT: &str = "Please select a valid option";

const CONTINUE_TOKEN: &str = "yes";
const STOP_TOKEN: &str = "no";

const STEP_HANDLE_UPDATE: usize = 0;
const STEP_FINAL: usize = 1;

/// Channels whose messages can be edited after sending. Compared by id so a
/// hand-built `Channel::Other("slack")` agrees with `Channel::Slack`.
pub fn is_update_supported(channel: &Channel) -> bool {
    matches!(channel.as_str(), "msteams" | "slack" | "telegram")
}

pub fn updated_text(edit_count: u32) -> String {
    format!("This message has been updated {edit_count} time(s).")
}

pub fn unsupported_text(channel: &Channel) -> String {
    format!("Update is not supported in the {channel} channel.")
}

/// The user's answer to "update again?".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateChoice {
    Continue,
    Stop,
}

impl UpdateChoice {
    /// Only exactly `"yes"` continues; anything else, including no answer, stops.
    pub fn decode(value: Option<&str>) -> Self {
        match value {
            Some(CONTINUE_TOKEN) => UpdateChoice::Continue,
            _ => UpdateChoice::Stop,
        }
    }
}

pub struct UpdateDialog {
    tracker: Arc<UpdateTracker>,
}

impl UpdateDialog {
    pub fn new(tracker: Arc<UpdateTracker>) -> Self {
        Self { tracker }
    }

    fn prompt() -> ChoicePromptOptions {
        ChoicePromptOptions {
            prompt: PROMPT_TEXT.to_string(),
            retry_prompt: Some(RETRY_TEXT.to_string()),
            choices: to_choices(&[CONTINUE_TOKEN, STOP_TOKEN]),
            style: ListStyle::List,
        }
    }

    /// Send the original message or edit the tracked one, then ask to go again.
    pub async fn handle_update(&self, ctx: &TurnContext) -> Result<NextAction> {
        if !is_update_supported(&ctx.channel) {
            debug!(channel = %ctx.channel, "message editing not supported");
            ctx.send_text(&unsupported_text(&ctx.channel)).await?;
            return Ok(NextAction::Prompt(Self::prompt()));
        }

        match self.tracker.get(&ctx.conversation).await {
            Some(tracked) => {
                let text = updated_text(tracked.edit_count);
                ctx.edit_text(tracked.message.message, &text).await?;
                let count = self
                    .tracker
                    .record_edit(&ctx.conversation, &tracked, text)
                    .await;
                debug!(conversation = %ctx.conversation, edit_count = count, "edited tracked message");
            }
            None => {
                let message = ctx.send_text(ORIGINAL_TEXT).await?;
                let inserted = self
                    .tracker
                    .insert_if_absent(
                        ctx.conversation.clone(),
                        TrackedMessage {
                            message,
                            text: ORIGINAL_TEXT.to_string(),
                        },
                    )
                    .await;
                debug!(conversation = %ctx.conversation, inserted, "sent original message");
            }
        }

        Ok(NextAction::Prompt(Self::prompt()))
    }

    /// Loop on "yes"; on anything else forget every tracked conversation and finish.
    pub async fn final_step(&self, choice: Option<&FoundChoice>) -> Result<NextAction> {
        match UpdateChoice::decode(choice.map(|c| c.value.as_str())) {
            UpdateChoice::Continue => Ok(NextAction::ReplaceDialog),
            UpdateChoice::Stop => {
                // Clears all conversations, not just the current one.
                self.tracker.clear_all().await;
                info!("update dialog finished; tracker cleared");
                Ok(NextAction::Complete)
            }
        }
    }
}

#[async_trait]
impl Dialog for UpdateDialog {
    fn id(&self) -> &str {
        UPDATE_DIALOG_ID
    }

    async fn step(
        &self,
        index: usize,
        ctx: &TurnContext,
        result: Option<FoundChoice>,
    ) -> Result<NextAction> {
        match index {
            STEP_HANDLE_UPDATE => self.handle_update(ctx).await,
            STEP_FINAL => self.final_step(result.as_ref()).await,
            other => Err(Error::Dialog(format!(
                "update dialog has no step {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatId, ConversationId, MessageId, MessageRef},
        messaging::{
            port::MessagingPort,
            types::{InlineKeyboard, MessagingCapabilities},
        },
    };
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Send(String),
        Edit(MessageId, String),
    }

    #[derive(Default)]
    struct FakeMessenger {
        calls: Mutex<Vec<Call>>,
        fail_edits: bool,
        /// Clears this tracker while an edit is in flight, like another chat declining.
        clear_on_edit: Option<Arc<UpdateTracker>>,
    }

    impl FakeMessenger {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_inline_keyboards: false,
            }
        }

        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Send(text.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(100 + calls.len() as i32),
            })
        }

        async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
            if self.fail_edits {
                return Err(Error::External("message to edit not found".to_string()));
            }
            if let Some(tracker) = &self.clear_on_edit {
                tracker.clear_all().await;
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Edit(msg.message_id, text.to_string()));
            Ok(())
        }

        async fn send_inline_keyboard(
            &self,
            chat_id: ChatId,
            text: &str,
            _keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            self.send_text(chat_id, text).await
        }

        async fn answer_callback_query(
            &self,
            _callback_id: &str,
            _text: Option<&str>,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn ctx_on(channel: Channel, conversation: &str, messenger: Arc<FakeMessenger>) -> TurnContext {
        TurnContext {
            channel,
            conversation: ConversationId::new(conversation),
            chat_id: ChatId(7),
            messenger,
        }
    }

    fn found(value: &str) -> FoundChoice {
        FoundChoice {
            value: value.to_string(),
            index: 0,
        }
    }

    #[test]
    fn only_teams_slack_and_telegram_support_updates() {
        assert!(is_update_supported(&Channel::Msteams));
        assert!(is_update_supported(&Channel::Slack));
        assert!(is_update_supported(&Channel::Telegram));

        for other in [
            Channel::Emulator,
            Channel::Webchat,
            Channel::Directline,
            Channel::Facebook,
            Channel::Email,
            Channel::Sms,
            Channel::Console,
            Channel::Test,
            Channel::Other("teams".to_string()),
        ] {
            assert!(!is_update_supported(&other), "{other} should not support updates");
        }
    }

    #[test]
    fn supported_check_goes_by_channel_id() {
        assert!(is_update_supported(&Channel::Other("telegram".to_string())));
        assert!(is_update_supported(&Channel::Other("msteams".to_string())));
        assert!(!is_update_supported(&Channel::Other("Telegram".to_string())));
    }

    #[test]
    fn only_exact_yes_continues() {
        assert_eq!(UpdateChoice::decode(Some("yes")), UpdateChoice::Continue);
        assert_eq!(UpdateChoice::decode(Some("no")), UpdateChoice::Stop);
        assert_eq!(UpdateChoice::decode(Some("")), UpdateChoice::Stop);
        assert_eq!(UpdateChoice::decode(Some("Yes")), UpdateChoice::Stop);
        assert_eq!(UpdateChoice::decode(Some("yes ")), UpdateChoice::Stop);
        assert_eq!(UpdateChoice::decode(None), UpdateChoice::Stop);
    }

    #[tokio::test]
    async fn first_run_sends_original_and_tracks_it() {
        let tracker = Arc::new(UpdateTracker::new());
        let dialog = UpdateDialog::new(tracker.clone());
        let messenger = Arc::new(FakeMessenger::default());
        let ctx = ctx_on(Channel::Telegram, "c1", messenger.clone());

        let next = dialog.handle_update(&ctx).await.unwrap();

        assert_eq!(messenger.calls(), vec![Call::Send(ORIGINAL_TEXT.to_string())]);
        let rec = tracker.get(&ctx.conversation).await.unwrap();
        assert_eq!(rec.edit_count, 1);
        assert_eq!(rec.message.text, ORIGINAL_TEXT);
        assert_eq!(rec.message.message.message_id, MessageId(101));

        match next {
            NextAction::Prompt(p) => {
                assert_eq!(p.prompt, PROMPT_TEXT);
                assert_eq!(p.retry_prompt.as_deref(), Some(RETRY_TEXT));
                assert_eq!(p.style, ListStyle::List);
                let values: Vec<&str> = p.choices.iter().map(|c| c.value.as_str()).collect();
                assert_eq!(values, vec!["yes", "no"]);
            }
            other => panic!("expected prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn later_runs_edit_with_increasing_counts() {
        let tracker = Arc::new(UpdateTracker::new());
        let dialog = UpdateDialog::new(tracker.clone());
        let messenger = Arc::new(FakeMessenger::default());
        let ctx = ctx_on(Channel::Slack, "c1", messenger.clone());

        dialog.handle_update(&ctx).await.unwrap();
        dialog.handle_update(&ctx).await.unwrap();
        assert_eq!(tracker.get(&ctx.conversation).await.unwrap().edit_count, 2);
        dialog.handle_update(&ctx).await.unwrap();

        assert_eq!(
            messenger.calls(),
            vec![
                Call::Send(ORIGINAL_TEXT.to_string()),
                Call::Edit(
                    MessageId(101),
                    "This message has been updated 1 time(s).".to_string()
                ),
                Call::Edit(
                    MessageId(101),
                    "This message has been updated 2 time(s).".to_string()
                ),
            ]
        );
        let rec = tracker.get(&ctx.conversation).await.unwrap();
        assert_eq!(rec.edit_count, 3);
        assert_eq!(rec.message.text, "This message has been updated 2 time(s).");
    }

    #[tokio::test]
    async fn unsupported_channel_only_sends_notice() {
        let tracker = Arc::new(UpdateTracker::new());
        let dialog = UpdateDialog::new(tracker.clone());
        let messenger = Arc::new(FakeMessenger::default());
        let ctx = ctx_on(Channel::Webchat, "c1", messenger.clone());

        let next = dialog.handle_update(&ctx).await.unwrap();
        dialog.handle_update(&ctx).await.unwrap();

        assert!(matches!(next, NextAction::Prompt(_)));
        let notice = Call::Send("Update is not supported in the webchat channel.".to_string());
        assert_eq!(messenger.calls(), vec![notice.clone(), notice]);
        assert!(tracker.is_empty().await);
    }

    #[tokio::test]
    async fn failed_edit_leaves_tracker_untouched() {
        let tracker = Arc::new(UpdateTracker::new());
        let dialog = UpdateDialog::new(tracker.clone());
        let ok = Arc::new(FakeMessenger::default());
        dialog
            .handle_update(&ctx_on(Channel::Telegram, "c1", ok))
            .await
            .unwrap();

        let failing = Arc::new(FakeMessenger {
            fail_edits: true,
            ..Default::default()
        });
        let ctx = ctx_on(Channel::Telegram, "c1", failing);
        let err = dialog.handle_update(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::External(_)));

        let rec = tracker.get(&ctx.conversation).await.unwrap();
        assert_eq!(rec.edit_count, 1);
        assert_eq!(rec.message.text, ORIGINAL_TEXT);
    }

    #[tokio::test]
    async fn edit_survives_a_concurrent_clear() {
        let tracker = Arc::new(UpdateTracker::new());
        let dialog = UpdateDialog::new(tracker.clone());
        let messenger = Arc::new(FakeMessenger {
            clear_on_edit: Some(tracker.clone()),
            ..Default::default()
        });
        let ctx = ctx_on(Channel::Telegram, "c1", messenger.clone());

        dialog.handle_update(&ctx).await.unwrap();
        let next = dialog.handle_update(&ctx).await.unwrap();

        assert!(matches!(next, NextAction::Prompt(_)));
        assert_eq!(
            messenger.calls(),
            vec![
                Call::Send(ORIGINAL_TEXT.to_string()),
                Call::Edit(
                    MessageId(101),
                    "This message has been updated 1 time(s).".to_string()
                ),
            ]
        );
        let rec = tracker.get(&ctx.conversation).await.unwrap();
        assert_eq!(rec.edit_count, 2);
        assert_eq!(rec.message.message.message_id, MessageId(101));
        assert_eq!(rec.message.text, "This message has been updated 1 time(s).");
    }

    #[tokio::test]
    async fn yes_loops_without_clearing() {
        let tracker = Arc::new(UpdateTracker::new());
        let dialog = UpdateDialog::new(tracker.clone());
        let messenger = Arc::new(FakeMessenger::default());
        dialog
            .handle_update(&ctx_on(Channel::Msteams, "c1", messenger))
            .await
            .unwrap();

        let next = dialog.final_step(Some(&found("yes"))).await.unwrap();
        assert_eq!(next, NextAction::ReplaceDialog);
        assert_eq!(tracker.len().await, 1);
    }

    #[tokio::test]
    async fn anything_but_yes_clears_every_conversation() {
        for choice in [Some(found("no")), Some(found("")), None] {
            let tracker = Arc::new(UpdateTracker::new());
            let dialog = UpdateDialog::new(tracker.clone());
            let messenger = Arc::new(FakeMessenger::default());
            dialog
                .handle_update(&ctx_on(Channel::Telegram, "c1", messenger.clone()))
                .await
                .unwrap();
            dialog
                .handle_update(&ctx_on(Channel::Slack, "c2", messenger))
                .await
                .unwrap();
            assert_eq!(tracker.len().await, 2);

            let next = dialog.final_step(choice.as_ref()).await.unwrap();
            assert_eq!(next, NextAction::Complete);
            assert!(tracker.is_empty().await);
        }
    }

    #[tokio::test]
    async fn unknown_step_is_an_error() {
        let dialog = UpdateDialog::new(Arc::new(UpdateTracker::new()));
        let messenger = Arc::new(FakeMessenger::default());
        let ctx = ctx_on(Channel::Telegram, "c1", messenger);
        let err = dialog.step(2, &ctx, None).await.unwrap_err();
        assert!(matches!(err, Error::Dialog(_)));
    }
}
