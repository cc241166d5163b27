//! Error taxonomy for the storefront
//!
//! Both listing and preview failures are recovered locally: a `FetchError`
//! turns into an empty listing, a `DecodeError` or `OutputError` sends one
//! player back to idle. Nothing here is fatal to the application.

use thiserror::Error;

/// Failure of the public listing query
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("listing store unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("listing store rejected the query (HTTP {status})")]
    Status { status: u16 },

    #[error("listing store denied access (HTTP {status})")]
    Permission { status: u16 },

    #[error("malformed listing response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Permission { status },
            _ => Self::Status { status },
        }
    }
}

/// Failure to turn an audio asset into a sample buffer
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("could not fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not a supported audio format: {reason}")]
    Unsupported { url: String, reason: String },

    #[error("{url} contains no audio track")]
    NoAudioTrack { url: String },

    #[error("{url} decoded to zero samples")]
    Empty { url: String },

    #[error("decoding {url} failed: {reason}")]
    Codec { url: String, reason: String },

    #[error("preview did not load in time")]
    Timeout,
}

/// Failure to open or drive the audio output device
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),

    #[error("audio stream failed: {0}")]
    Stream(String),
}
