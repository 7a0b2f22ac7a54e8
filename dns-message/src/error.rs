use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    /// The input could not be decoded: it was too short, a length or
    /// pointer field was invalid, or the structure was not what was expected.
    #[error("format error: {0}")]
    Format(String),

    /// A compression pointer that does not point strictly backwards.
    #[error("circular reference - pointer at {at} targets offset {target}")]
    CircularReference { at: usize, target: usize },

    #[error("opcode {0} does not fit in 4 bits")]
    ReservedOpCode(u8),

    #[error("label of length {0} exceeds 63 bytes: {1}")]
    NameLengthExceeded(usize, String),

    #[error("domain name of {0} bytes exceeds 255 bytes")]
    NameTooLong(usize),

    #[error("invalid domain name: {0:?}")]
    InvalidName(String),
}

impl MessageError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        MessageError::Format(msg.into())
    }
}

impl<E: std::fmt::Debug> From<nom::Err<E>> for MessageError {
    fn from(error: nom::Err<E>) -> Self {
        MessageError::Format(format!("parsing error: {}", error))
    }
}

impl From<std::str::Utf8Error> for MessageError {
    fn from(error: std::str::Utf8Error) -> Self {
        MessageError::Format(format!("label is not valid UTF-8: {}", error))
    }
}
