use dns_message::{MessageError, RCode, Response};
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The response (or the request being sent) could not be encoded or
    /// decoded.
    #[error(transparent)]
    Format(#[from] MessageError),

    /// The response carried an id other than the request's, so it answers
    /// some other query.
    #[error("response id {actual} does not match request id {expected}")]
    MismatchedId { expected: u16, actual: u16 },

    /// The server answered, but not usefully.
    #[error("query failed ({rcode}): {reason}")]
    Query {
        reason: String,
        rcode: RCode,
        response: Option<Box<Response>>,
    },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("lookup only supports A and AAAA records")]
    UnsupportedType,
}

impl ResolveError {
    pub(crate) fn query(reason: impl Into<String>, response: Option<Response>) -> Self {
        ResolveError::Query {
            reason: reason.into(),
            rcode: response
                .as_ref()
                .map(|r| r.rcode())
                .unwrap_or(RCode::NoError),
            response: response.map(Box::new),
        }
    }

    /// Maps a socket error, reporting an expired read or write timeout as
    /// [`ResolveError::Timeout`].
    pub(crate) fn from_io(error: io::Error, timeout: Duration) -> Self {
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ResolveError::Timeout(timeout),
            _ => ResolveError::Transport(error),
        }
    }
}
