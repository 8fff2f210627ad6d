//! Single-choice prompt: rendering and recognition.
//!
//! The dialog runner owns retry bookkeeping; this module only turns choices
//! into something a messenger can show and maps a reply back to a choice.

use std::sync::Arc;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

/// Callback data prefix for choice buttons: `choice:{index}`.
pub const CHOICE_CALLBACK_PREFIX: &str = "choice";

const BUTTON_LABEL_MAX_LEN: usize = 30;
const INLINE_MAX_CHOICES: usize = 3;
const INLINE_MAX_TITLE_LEN: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub synonyms: Vec<String>,
}

impl Choice {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }
}

pub fn to_choices(values: &[&str]) -> Vec<Choice> {
    values.iter().map(|v| Choice::new(*v)).collect()
}

/// How the options are presented to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListStyle {
    /// Prompt text only.
    None,
    /// `text (1) yes or (2) no`
    Inline,
    /// Numbered list under the prompt text.
    List,
    /// Buttons.
    SuggestedAction,
    #[default]
    Auto,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoicePromptOptions {
    pub prompt: String,
    pub retry_prompt: Option<String>,
    pub choices: Vec<Choice>,
    pub style: ListStyle,
}

impl ChoicePromptOptions {
    /// Text for the attempt after a failed recognition (falls back to the prompt).
    pub fn retry_text(&self) -> &str {
        self.retry_prompt.as_deref().unwrap_or(&self.prompt)
    }
}

/// A recognized reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundChoice {
    pub value: String,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedPrompt {
    Text(String),
    Keyboard {
        text: String,
        keyboard: InlineKeyboard,
    },
}

pub fn render(
    text: &str,
    choices: &[Choice],
    style: ListStyle,
    caps: &MessagingCapabilities,
) -> RenderedPrompt {
    match resolve_style(choices, style, caps) {
        ListStyle::None | ListStyle::Auto => RenderedPrompt::Text(text.to_string()),
        ListStyle::Inline => RenderedPrompt::Text(render_inline(text, choices)),
        ListStyle::List => RenderedPrompt::Text(render_list(text, choices)),
        ListStyle::SuggestedAction => {
            let values: Vec<String> = choices.iter().map(|c| c.value.clone()).collect();
            RenderedPrompt::Keyboard {
                text: text.to_string(),
                keyboard: InlineKeyboard::one_per_row(
                    CHOICE_CALLBACK_PREFIX,
                    &values,
                    BUTTON_LABEL_MAX_LEN,
                ),
            }
        }
    }
}

fn resolve_style(choices: &[Choice], style: ListStyle, caps: &MessagingCapabilities) -> ListStyle {
    match style {
        ListStyle::SuggestedAction if !caps.supports_inline_keyboards => ListStyle::List,
        ListStyle::Auto if caps.supports_inline_keyboards => ListStyle::SuggestedAction,
        ListStyle::Auto => {
            let short = choices
                .iter()
                .all(|c| c.value.chars().count() <= INLINE_MAX_TITLE_LEN);
            if choices.len() <= INLINE_MAX_CHOICES && short {
                ListStyle::Inline
            } else {
                ListStyle::List
            }
        }
        other => other,
    }
}

fn render_inline(text: &str, choices: &[Choice]) -> String {
    let mut out = text.to_string();
    let last = choices.len().saturating_sub(1);
    for (idx, choice) in choices.iter().enumerate() {
        let sep = match idx {
            0 => " ",
            _ if idx == last && choices.len() == 2 => " or ",
            _ if idx == last => ", or ",
            _ => ", ",
        };
        out.push_str(sep);
        out.push_str(&format!("({}) {}", idx + 1, choice.value));
    }
    out
}

fn render_list(text: &str, choices: &[Choice]) -> String {
    let mut out = text.to_string();
    if choices.is_empty() {
        return out;
    }
    out.push('\n');
    for (idx, choice) in choices.iter().enumerate() {
        out.push_str(&format!("\n   {}. {}", idx + 1, choice.value));
    }
    out
}

/// Map a user reply (typed text or button callback data) onto one of `choices`.
///
/// Matches, in order: button data `choice:{index}`, a value or synonym
/// (case-insensitive), a 1-based ordinal.
pub fn recognize(input: &str, choices: &[Choice]) -> Option<FoundChoice> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let found = |index: usize| {
        choices.get(index).map(|c| FoundChoice {
            value: c.value.clone(),
            index,
        })
    };

    if let Some(idx) = input
        .strip_prefix(CHOICE_CALLBACK_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
    {
        return idx.parse::<usize>().ok().and_then(found);
    }

    let needle = input.trim_end_matches(['.', '!', '?']).to_lowercase();
    let by_name = choices.iter().position(|c| {
        c.value.to_lowercase() == needle || c.synonyms.iter().any(|s| s.to_lowercase() == needle)
    });
    if let Some(idx) = by_name {
        return found(idx);
    }

    match needle.parse::<usize>() {
        Ok(n) if n >= 1 => found(n - 1),
        _ => None,
    }
}

/// Render and send a prompt through the messenger.
pub async fn send_prompt(
    messenger: &Arc<dyn MessagingPort>,
    chat_id: ChatId,
    text: &str,
    choices: &[Choice],
    style: ListStyle,
) -> Result<MessageRef> {
    match render(text, choices, style, &messenger.capabilities()) {
        RenderedPrompt::Text(body) => messenger.send_text(chat_id, &body).await,
        RenderedPrompt::Keyboard { text, keyboard } => {
            messenger.send_inline_keyboard(chat_id, &text, keyboard).await
        }
    }
}
