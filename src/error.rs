use std::error::Error as StdError;

use thiserror::Error;

use crate::status::{DecoderState, InitStatus};

/// flac-bridge's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// flac-bridge's crate-wide error type.
///
/// Handler code talks `anyhow` (it is application code), but the library surface keeps a concrete
/// error so callers can match on native failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    /// `FLAC__stream_decoder_init_*` refused to start.
    #[error("failed to initialize FLAC decoder: {0}")]
    Init(InitStatus),

    /// A processing call returned false; `state` is what the decoder reported afterwards.
    #[error("{op} failed: decoder is {state}")]
    Decoder {
        op: &'static str,
        state: DecoderState,
    },

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
