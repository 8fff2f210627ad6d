/// Inline keyboard (buttons) used to render choice prompts as suggested actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    /// One button per option; callback data is `{prefix}:{index}`.
    pub fn one_per_row(prefix: &str, options: &[String], max_label_len: usize) -> Self {
        let buttons = options
            .iter()
            .enumerate()
            .map(|(idx, opt)| {
                let label = if opt.chars().count() > max_label_len {
                    format!("{}...", opt.chars().take(max_label_len).collect::<String>())
                } else {
                    opt.clone()
                };
                InlineButton {
                    label,
                    callback_data: format!("{prefix}:{idx}"),
                }
            })
            .collect();
        Self { buttons }
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_inline_keyboards: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_per_row_truncates_long_labels() {
        let kb = InlineKeyboard::one_per_row(
            "choice",
            &["yes".to_string(), "a very long option label".to_string()],
            6,
        );
        assert_eq!(kb.buttons.len(), 2);
        assert_eq!(kb.buttons[0].label, "yes");
        assert_eq!(kb.buttons[0].callback_data, "choice:0");
        assert_eq!(kb.buttons[1].label, "a very...");
        assert_eq!(kb.buttons[1].callback_data, "choice:1");
    }
}
