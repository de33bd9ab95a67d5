use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An engine operation was invoked on a node that does not satisfy its
    /// contract, e.g. terminal utility of an unfinished position.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),

    #[error("no move available at the root position")]
    NoMoveAvailable,

    /// Internal control signal for anytime search. The root absorbs it and
    /// answers with the best completed subtree.
    #[error("search deadline exceeded")]
    DeadlineExceeded,

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: &'static str },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("invalid position '{input}': {reason}")]
    InvalidPosition { input: String, reason: &'static str },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
