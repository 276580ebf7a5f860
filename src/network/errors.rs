use thiserror::Error;

// * Unified Error type for the reload path.
#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("Invalid engine address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Reload request timed out")]
    Timeout,

    #[error("Reload request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ReloadError {
    // * Splits timeouts out of the generic transport variant
    pub fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReloadError::Timeout
        } else {
            ReloadError::Transport(err)
        }
    }
}
