//! Encoding and decoding of RFC1035 DNS messages.
//!
//! Names are always written uncompressed, but compression pointers are
//! followed (strictly backwards) when reading.

mod builder;
mod error;
mod header;
mod message;
mod name;
mod parser;
mod question;
mod resource_record;

pub use builder::{QuestionBuilder, RequestBuilder, ResourceRecordBuilder, ResponseBuilder};
pub use error::MessageError;
pub use header::{Header, OpCode, RCode, HEADER_LEN};
pub use message::{next_id, Request, Response};
pub use name::DomainName;
pub use question::{Class, Question, Type};
pub use resource_record::{RData, RawRecord, ResourceRecord, StartOfAuthority};

pub type Result<T> = std::result::Result<T, MessageError>;
