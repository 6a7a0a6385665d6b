use thiserror::Error;

use crate::{eval::EvalError, packer::UnpackError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Please provide packed JavaScript as an argument")]
    MissingInput,

    #[error("Direct eval failed: {0}")]
    Evaluation(#[from] EvalError),

    #[error("Unpacking failed: {0}")]
    Unpack(#[from] UnpackError),

    #[error("Error decoding base64 candidate `{candidate}`: {reason}")]
    Decode { candidate: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
