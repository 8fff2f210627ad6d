//! Cross-messenger abstractions (Telegram today; other channels behind the same port).

pub mod port;
pub mod throttled;
pub mod types;
