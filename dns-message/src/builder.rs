use crate::{
    message::next_id, Class, DomainName, Header, OpCode, Question, RCode, RData, Request,
    ResourceRecord, Response, Type,
};
use std::default::Default;

/// Saturates at `u16::MAX`. Encoding a message with more entries than that
/// fails, as the counts are taken again from the sections themselves.
fn entry_count(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

/// Builds a [`Request`]. Unless given, the id is random and recursion is
/// desired.
#[derive(Debug)]
pub struct RequestBuilder {
    id: u16,
    opcode: OpCode,
    rd: bool,
    questions: Vec<Question>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            id: next_id(),
            opcode: OpCode::Query,
            rd: true,
            questions: Vec::new(),
        }
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(self) -> Request {
        Request {
            header: Header {
                id: self.id,
                opcode: self.opcode,
                rd: self.rd,
                qd_count: entry_count(self.questions.len()),
                ..Default::default()
            },
            questions: self.questions,
        }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn opcode(mut self, opcode: OpCode) -> Self {
        self.opcode = opcode;
        self
    }

    pub fn rd(mut self, rd: bool) -> Self {
        self.rd = rd;
        self
    }

    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }
}

#[derive(Debug, Default)]
pub struct ResponseBuilder {
    id: u16,
    opcode: OpCode,
    aa: bool,
    tc: bool,
    rd: bool,
    ra: bool,
    rcode: RCode,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    name_servers: Vec<ResourceRecord>,
    additional_records: Vec<ResourceRecord>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts a reply to `request`, copying its id, opcode, recursion
    /// desired flag and questions.
    pub fn reply_to(request: &Request) -> Self {
        Self {
            id: request.header.id,
            opcode: request.header.opcode,
            rd: request.header.rd,
            questions: request.questions.clone(),
            ..Default::default()
        }
    }

    pub fn build(self) -> Response {
        Response {
            header: Header {
                id: self.id,
                qr: true,
                opcode: self.opcode,
                aa: self.aa,
                tc: self.tc,
                rd: self.rd,
                ra: self.ra,
                z: 0,
                rcode: self.rcode,
                qd_count: entry_count(self.questions.len()),
                an_count: entry_count(self.answers.len()),
                ns_count: entry_count(self.name_servers.len()),
                ar_count: entry_count(self.additional_records.len()),
            },
            questions: self.questions,
            answers: self.answers,
            name_servers: self.name_servers,
            additional_records: self.additional_records,
        }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn opcode(mut self, opcode: OpCode) -> Self {
        self.opcode = opcode;
        self
    }

    pub fn aa(mut self, aa: bool) -> Self {
        self.aa = aa;
        self
    }

    pub fn tc(mut self, tc: bool) -> Self {
        self.tc = tc;
        self
    }

    pub fn rd(mut self, rd: bool) -> Self {
        self.rd = rd;
        self
    }

    pub fn ra(mut self, ra: bool) -> Self {
        self.ra = ra;
        self
    }

    pub fn rcode(mut self, rcode: RCode) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn answer(mut self, answer: ResourceRecord) -> Self {
        self.answers.push(answer);
        self
    }

    pub fn name_server(mut self, ns: ResourceRecord) -> Self {
        self.name_servers.push(ns);
        self
    }

    pub fn additional_record(mut self, ar: ResourceRecord) -> Self {
        self.additional_records.push(ar);
        self
    }
}

#[derive(Debug, Default)]
pub struct QuestionBuilder {
    q_name: DomainName,
    q_type: Type,
    q_class: Class,
}

impl QuestionBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(self) -> Question {
        Question {
            q_name: self.q_name,
            q_type: self.q_type,
            q_class: self.q_class,
        }
    }

    pub fn name(mut self, name: DomainName) -> Self {
        self.q_name = name;
        self
    }

    pub fn q_type(mut self, t: Type) -> Self {
        self.q_type = t;
        self
    }

    pub fn class(mut self, cls: Class) -> Self {
        self.q_class = cls;
        self
    }
}

#[derive(Debug)]
pub struct ResourceRecordBuilder {
    name: DomainName,
    data: RData,
    class: Class,
    ttl: u32,
}

impl ResourceRecordBuilder {
    pub fn new(name: DomainName, data: RData) -> Self {
        Self {
            name,
            data,
            class: Default::default(),
            ttl: Default::default(),
        }
    }

    pub fn build(self) -> ResourceRecord {
        ResourceRecord {
            name: self.name,
            data: self.data,
            class: self.class,
            ttl: self.ttl,
        }
    }

    pub fn class(mut self, cls: Class) -> Self {
        self.class = cls;
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}
