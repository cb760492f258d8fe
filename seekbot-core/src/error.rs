use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeekbotError {
    /// Missing or invalid configuration. The only class that aborts startup.
    #[error("Config error: {0}")]
    Config(String),

    /// Chat transport failure (send/reply). Request-scoped, never fatal.
    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, SeekbotError>;
