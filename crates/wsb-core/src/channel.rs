//! Channel identifiers.
//!
//! A channel is the messaging surface a conversation runs on. Ids are the
//! lowercase strings the bot connector uses on the wire.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Channel {
    Msteams,
    Slack,
    Telegram,
    Emulator,
    Webchat,
    Directline,
    Facebook,
    Email,
    Sms,
    Console,
    Test,
    Other(String),
}

impl Channel {
    pub fn as_str(&self) -> &str {
        match self {
            Channel::Msteams => "msteams",
            Channel::Slack => "slack",
            Channel::Telegram => "telegram",
            Channel::Emulator => "emulator",
            Channel::Webchat => "webchat",
            Channel::Directline => "directline",
            Channel::Facebook => "facebook",
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Console => "console",
            Channel::Test => "test",
            Channel::Other(id) => id,
        }
    }
}

impl From<&str> for Channel {
    fn from(id: &str) -> Self {
        match id {
            "msteams" => Channel::Msteams,
            "slack" => Channel::Slack,
            "telegram" => Channel::Telegram,
            "emulator" => Channel::Emulator,
            "webchat" => Channel::Webchat,
            "directline" => Channel::Directline,
            "facebook" => Channel::Facebook,
            "email" => Channel::Email,
            "sms" => Channel::Sms,
            "console" => Channel::Console,
            "test" => Channel::Test,
            other => Channel::Other(other.to_string()),
        }
    }
}

impl From<String> for Channel {
    fn from(id: String) -> Self {
        Channel::from(id.as_str())
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Other(id) => id,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Channel {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Channel::from(s))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
