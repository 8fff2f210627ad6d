//! Per-conversation record of the message the update dialog keeps editing.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ConversationId, MessageRef};

/// The last message the update dialog sent in a conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedMessage {
    pub message: MessageRef,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedUpdate {
    pub message: TrackedMessage,
    /// 1 after the original send, +1 per successful edit.
    pub edit_count: u32,
}

/// Shared store of tracked updates, one record per conversation at most.
///
/// Owned by whoever builds the dialog and injected as `Arc<UpdateTracker>`.
#[derive(Debug, Default)]
pub struct UpdateTracker {
    inner: Mutex<HashMap<ConversationId, TrackedUpdate>>,
}

impl UpdateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, conversation: &ConversationId) -> Option<TrackedUpdate> {
        self.inner.lock().await.get(conversation).cloned()
    }

    /// Insert a fresh record with `edit_count = 1`. Returns `false` (and changes
    /// nothing) when the conversation is already tracked.
    pub async fn insert_if_absent(
        &self,
        conversation: ConversationId,
        message: TrackedMessage,
    ) -> bool {
        let mut map = self.inner.lock().await;
        if map.contains_key(&conversation) {
            return false;
        }
        map.insert(
            conversation,
            TrackedUpdate {
                message,
                edit_count: 1,
            },
        );
        true
    }

    /// Store the edited text and bump the count, returning the new count.
    ///
    /// `seen` is the record the edit was based on. If the conversation was
    /// cleared while the edit was in flight it is written back from `seen`, so
    /// an edit that reached the chat is always reflected here.
    pub async fn record_edit(
        &self,
        conversation: &ConversationId,
        seen: &TrackedUpdate,
        text: String,
    ) -> u32 {
        let mut map = self.inner.lock().await;
        let entry = map
            .entry(conversation.clone())
            .or_insert_with(|| seen.clone());
        entry.message.text = text;
        entry.edit_count += 1;
        entry.edit_count
    }

    /// Drop every tracked conversation.
    pub async fn clear_all(&self) {
        self.inner.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
