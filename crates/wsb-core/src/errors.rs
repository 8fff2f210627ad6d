/// Core error type.
///
/// Adapter crates map their specific errors into this type so the dialog
/// runner and the router can handle failures consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("dialog error: {0}")]
    Dialog(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
