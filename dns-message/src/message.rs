use crate::{
    Header, MessageError, OpCode, Question, RCode, ResourceRecord, Result, Type, HEADER_LEN,
};
use std::fmt;
use tracing::{instrument, trace, warn};

/// A fresh random message id.
///
/// Draws from a thread local generator, so concurrent callers never contend.
pub fn next_id() -> u16 {
    fastrand::u16(..)
}

/// A query: a header plus its questions, and never any records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub header: Header,
    pub questions: Vec<Question>,
}

impl Request {
    /// A standard recursive query for a single question, with a random id.
    pub fn new(question: Question) -> Self {
        Request {
            header: Header {
                id: next_id(),
                opcode: OpCode::Query,
                rd: true,
                qd_count: 1,
                ..Default::default()
            },
            questions: vec![question],
        }
    }

    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Reads a request from the buffer, rejecting responses and anything
    /// carrying records.
    #[instrument(skip(input))]
    pub fn from_bytes(input: &[u8]) -> Result<Request> {
        let header = Header::decode(input, 0)?;
        if header.qr {
            return Err(MessageError::format("expected a query but QR is set"));
        }
        if header.an_count != 0 || header.ns_count != 0 || header.ar_count != 0 {
            return Err(MessageError::format(format!(
                "query carries records: {} answer, {} authority, {} additional",
                header.an_count, header.ns_count, header.ar_count
            )));
        }

        let (questions, _) = read_questions(input, HEADER_LEN, header.qd_count)?;
        let request = Request { header, questions };

        trace!("Read input as: {}", request);

        Ok(request)
    }

    /// Serializes the request, with the question count taken from the
    /// questions actually present.
    #[instrument(skip(self))]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = Header {
            qr: false,
            qd_count: section_count(self.questions.len())?,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
            ..self.header.clone()
        };

        let len = HEADER_LEN + self.questions.iter().map(|q| q.wire_len()).sum::<usize>();
        let mut buf = Vec::with_capacity(len);
        header.to_bytes(&mut buf)?;
        for q in self.questions.iter() {
            q.to_bytes(&mut buf);
        }

        trace!("Wrote {} bytes", buf.len());

        Ok(buf)
    }
}

/// A reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub name_servers: Vec<ResourceRecord>,
    pub additional_records: Vec<ResourceRecord>,
}

impl Response {
    pub fn id(&self) -> u16 {
        self.header.id
    }

    pub fn rcode(&self) -> RCode {
        self.header.rcode
    }

    pub fn is_truncated(&self) -> bool {
        self.header.tc
    }

    /// The answers of the given type.
    pub fn answers_of(&self, r_type: Type) -> impl Iterator<Item = &ResourceRecord> {
        self.answers.iter().filter(move |a| a.r_type() == r_type)
    }

    /// Reads the u8 buffer and parses the DNS response from it.
    ///
    /// This includes the dereferencing of rfc1035 Message Compression pointers
    /// and the typing of each record's data. Bytes after the last record are
    /// ignored. When the response is truncated, a record section that cannot
    /// be read completely is dropped along with every section after it.
    #[instrument(skip(input))]
    pub fn from_bytes(input: &[u8]) -> Result<Response> {
        let header = Header::decode(input, 0)?;
        if !header.qr {
            return Err(MessageError::format("expected a response but QR is clear"));
        }

        let (questions, offset) = read_questions(input, HEADER_LEN, header.qd_count)?;

        let mut sections = Vec::with_capacity(3);
        let mut offset = offset;
        for count in [header.an_count, header.ns_count, header.ar_count] {
            match read_records(input, offset, count) {
                Ok((records, next)) => {
                    sections.push(records);
                    offset = next;
                }
                Err(e) if header.tc => {
                    warn!("Dropping incomplete records of a truncated response: {}", e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        sections.resize_with(3, Vec::new);
        let additional_records = sections.pop().unwrap_or_default();
        let name_servers = sections.pop().unwrap_or_default();
        let answers = sections.pop().unwrap_or_default();

        let response = Response {
            header,
            questions,
            answers,
            name_servers,
            additional_records,
        };

        trace!("Read input as: {}", response);

        Ok(response)
    }

    /// Serializes the response to bytes, with the section counts taken from
    /// the sections actually present.
    #[instrument(skip(self))]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = Header {
            qr: true,
            qd_count: section_count(self.questions.len())?,
            an_count: section_count(self.answers.len())?,
            ns_count: section_count(self.name_servers.len())?,
            ar_count: section_count(self.additional_records.len())?,
            ..self.header.clone()
        };

        let mut buf = Vec::with_capacity(512);
        header.to_bytes(&mut buf)?;
        for q in self.questions.iter() {
            q.to_bytes(&mut buf);
        }
        for a in self.answers.iter() {
            a.to_bytes(&mut buf)?;
        }
        for n in self.name_servers.iter() {
            n.to_bytes(&mut buf)?;
        }
        for ar in self.additional_records.iter() {
            ar.to_bytes(&mut buf)?;
        }

        trace!("Wrote {} bytes", buf.len());

        Ok(buf)
    }
}

fn section_count(len: usize) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| MessageError::format(format!("{} entries do not fit in a section", len)))
}

/// The smallest question: a root name, type and class.
const MIN_QUESTION_LEN: usize = 5;

/// The smallest record: a root name, type, class, ttl and an empty rdata.
const MIN_RECORD_LEN: usize = 11;

/// How many entries to allocate for, given what the header claims and how
/// many could actually fit in the bytes left.
fn bounded_capacity(count: u16, input: &[u8], offset: usize, min_len: usize) -> usize {
    let remaining = input.len().saturating_sub(offset);
    (count as usize).min(remaining / min_len)
}

/// Reads `count` consecutive questions starting at `offset`, returning them
/// and the offset of the next section.
fn read_questions(input: &[u8], offset: usize, count: u16) -> Result<(Vec<Question>, usize)> {
    let mut questions =
        Vec::with_capacity(bounded_capacity(count, input, offset, MIN_QUESTION_LEN));
    let mut offset = offset;
    for _ in 0..count {
        let (question, next) = Question::decode(input, offset)?;
        questions.push(question);
        offset = next;
    }
    Ok((questions, offset))
}

fn read_records(input: &[u8], offset: usize, count: u16) -> Result<(Vec<ResourceRecord>, usize)> {
    let mut records = Vec::with_capacity(bounded_capacity(count, input, offset, MIN_RECORD_LEN));
    let mut offset = offset;
    for _ in 0..count {
        let (record, next) = ResourceRecord::decode(input, offset)?;
        records.push(record);
        offset = next;
    }
    Ok((records, offset))
}

fn write_questions(f: &mut fmt::Formatter<'_>, questions: &[Question]) -> fmt::Result {
    write!(f, "Query [")?;
    for (i, q) in questions.iter().enumerate() {
        if i != 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}({})", q.q_name, q.q_type)?;
    }
    write!(f, "]")
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "Request(id:{}) - ", self.header.id)?;
        write_questions(f, &self.questions)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "Response(id:{}, {}", self.header.id, self.header.rcode)?;
        if self.header.tc {
            write!(f, ", truncated")?;
        }
        write!(f, ") - ")?;
        write_questions(f, &self.questions)?;
        write!(f, " - Answer [")?;
        for (i, a) in self.answers.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} => {}", a.name, a.data)?;
        }
        write!(f, "]")
    }
}
