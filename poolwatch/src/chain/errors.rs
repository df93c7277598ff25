use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("contract call `{call}` failed: {reason}")]
    Contract { call: &'static str, reason: String },

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("malformed swap log: {0}")]
    MalformedLog(String),

    #[error("subscription transport error: {0}")]
    Transport(String),
}

impl ChainError {
    pub(crate) fn contract(call: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Contract {
            call,
            reason: err.to_string(),
        }
    }

    pub(crate) fn rpc(err: impl std::fmt::Display) -> Self {
        Self::Rpc(err.to_string())
    }
}
