use thiserror::Error;

#[derive(Error, Debug)]
pub enum BbError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Launcher(String),

    #[error("{0}")]
    EmptyIdentity(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used to tag status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    Launcher,
    EmptyIdentity,
    Config,
    Io,
}

impl BbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BbError::Transport(_) => ErrorKind::Transport,
            BbError::Decode(_) => ErrorKind::Decode,
            BbError::Launcher(_) => ErrorKind::Launcher,
            BbError::EmptyIdentity(_) => ErrorKind::EmptyIdentity,
            BbError::Config(_) => ErrorKind::Config,
            BbError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<reqwest::Error> for BbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BbError::Decode(err.to_string())
        } else {
            BbError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BbError {
    fn from(err: serde_json::Error) -> Self {
        BbError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BbError>;
