use crate::{parser, DomainName, MessageError, Result};
use nom::sequence::tuple;
use std::fmt;
use std::str::FromStr;
use tracing::{instrument, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
/// The question section is used to carry the "question" in most queries, i.e.,
/// the parameters that define what is being asked.
pub struct Question {
    /// RFC1035 - a domain name represented as a sequence of labels, where each
    /// label consists of a length octet followed by that number of octets.  The
    /// domain name terminates with the zero length octet for the null label of
    /// the root.  Note that this field may be an odd number of octets; no
    /// padding is used.
    pub q_name: DomainName,

    /// RFC1035 - a two octet code which specifies the type of the query. The
    /// values for this field include all codes valid for a ['Type'] field,
    /// together with some more general codes which can match more than one type
    /// of RR.
    pub q_type: Type,

    /// RFC1035 - a two octet code that specifies the ['Class`] of the query.
    pub q_class: Class,
}

impl Question {
    pub fn new(q_name: DomainName, q_type: Type) -> Self {
        Question {
            q_name,
            q_type,
            q_class: Class::IN,
        }
    }

    /// Reads the question at `offset`, returning it and the offset of
    /// whatever follows it.
    #[instrument(skip(message))]
    pub fn decode(message: &[u8], offset: usize) -> Result<(Question, usize)> {
        let (q_name, offset) = DomainName::decode(message, offset)?;

        let input = parser::remaining(message, offset)?;
        let (rest, (q_type, q_class)) = tuple((parser::read_u16, parser::read_u16))(input)?;
        let next = offset + parser::consumed(input, rest);

        trace!("Read question {} {}", q_name, Type::from(q_type));

        Ok((
            Question {
                q_name,
                q_type: Type::from(q_type),
                q_class: Class::from(q_class),
            },
            next,
        ))
    }

    #[instrument(skip(buf))]
    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> usize {
        let mut byte_count = self.q_name.to_bytes(buf);
        byte_count += self.q_type.to_bytes(buf);
        byte_count += self.q_class.to_bytes(buf);

        trace!("Wrote {} bytes", byte_count);

        byte_count
    }

    /// The wire size: the name plus two bytes each of type and class.
    pub fn wire_len(&self) -> usize {
        self.q_name.wire_len() + 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Types used in [`Question`]s and resource records.
pub enum Type {
    /// RFC1035 - (1) a host address.
    A,

    /// RFC1035 - (2) an authoritative name server.
    NS,

    /// RFC1035 - (3) a mail destination (Obsolete - use MX).
    MD,

    /// RFC1035 - (4) a mail forwarder (Obsolete - use MX).
    MF,

    /// RFC1035 - (5) the canonical name for an alias.
    CNAME,

    /// RFC1035 - (6) marks the start of a zone of authority.
    SOA,

    /// RFC1035 - (7) a mailbox domain name (EXPERIMENTAL).
    MB,

    /// RFC1035 - (8) a mail group member (EXPERIMENTAL).
    MG,

    /// RFC1035 - (9) a mail rename domain name (EXPERIMENTAL).
    MR,

    /// RFC1035 - (10) a null RR (EXPERIMENTAL).
    NULL,

    /// RFC1035 - (11) a well known service description.
    WKS,

    /// RFC1035 - (12) a domain name pointer.
    PTR,

    /// RFC1035 - (13) host information.
    HINFO,

    /// RFC1035 - (14) mailbox or mail list information.
    MINFO,

    /// RFC1035 - (15) mail exchange.
    MX,

    /// RFC1035 - (16) text strings.
    TXT,

    /// RFC3596 - The AAAA resource record type is a record specific to the
    /// Internet class that stores a single IPv6 address.
    AAAA,

    /// RFC2782 - (33) the location of a service.
    SRV,

    /// RFC6891 - (41) the EDNS(0) pseudo record.
    OPT,

    /// RFC1035 - (252) A request for a transfer of an entire zone.
    AXFR,

    /// RFC1035 - (253) A request for mailbox-related records (MB, MG or MR).
    MAILB,

    /// RFC1035 - (254) A request for mail agent RRs (Obsolete - see MX).
    MAILA,

    /// RFC1035 - (255) A request for all records.
    ANY,

    /// An unknown [`Type`] - the value is contained within.
    Unknown(u16),
}

impl Type {
    pub(crate) fn to_bytes(self, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&u16::from(self).to_be_bytes());
        2
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        let disp = match self {
            Self::A => "A",
            Self::NS => "NS",
            Self::MD => "MD",
            Self::MF => "MF",
            Self::CNAME => "CNAME",
            Self::SOA => "SOA",
            Self::MB => "MB",
            Self::MG => "MG",
            Self::MR => "MR",
            Self::NULL => "NULL",
            Self::WKS => "WKS",
            Self::PTR => "PTR",
            Self::HINFO => "HINFO",
            Self::MINFO => "MINFO",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::AAAA => "AAAA",
            Self::SRV => "SRV",
            Self::OPT => "OPT",
            Self::AXFR => "AXFR",
            Self::MAILB => "MAILB",
            Self::MAILA => "MAILA",
            Self::ANY => "ANY",
            Self::Unknown(i) => {
                write!(f, "TYPE{}", i)?;
                return Ok(());
            }
        };
        write!(f, "{}", disp)
    }
}

impl FromStr for Type {
    type Err = MessageError;

    /// Accepts the mnemonic in any case, `*` for [`Type::ANY`], or the
    /// numeric value (optionally as `TYPE<n>`).
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        let t = match upper.as_str() {
            "A" => Type::A,
            "NS" => Type::NS,
            "MD" => Type::MD,
            "MF" => Type::MF,
            "CNAME" => Type::CNAME,
            "SOA" => Type::SOA,
            "MB" => Type::MB,
            "MG" => Type::MG,
            "MR" => Type::MR,
            "NULL" => Type::NULL,
            "WKS" => Type::WKS,
            "PTR" => Type::PTR,
            "HINFO" => Type::HINFO,
            "MINFO" => Type::MINFO,
            "MX" => Type::MX,
            "TXT" => Type::TXT,
            "AAAA" => Type::AAAA,
            "SRV" => Type::SRV,
            "OPT" => Type::OPT,
            "AXFR" => Type::AXFR,
            "MAILB" => Type::MAILB,
            "MAILA" => Type::MAILA,
            "ANY" | "*" => Type::ANY,
            other => {
                let digits = other.strip_prefix("TYPE").unwrap_or(other);
                digits
                    .parse::<u16>()
                    .map(Type::from)
                    .map_err(|_| MessageError::format(format!("unknown record type {:?}", s)))?
            }
        };
        Ok(t)
    }
}

impl Default for Type {
    fn default() -> Self {
        Self::A
    }
}

impl From<Type> for u16 {
    fn from(t: Type) -> u16 {
        match t {
            Type::A => 1,
            Type::NS => 2,
            Type::MD => 3,
            Type::MF => 4,
            Type::CNAME => 5,
            Type::SOA => 6,
            Type::MB => 7,
            Type::MG => 8,
            Type::MR => 9,
            Type::NULL => 10,
            Type::WKS => 11,
            Type::PTR => 12,
            Type::HINFO => 13,
            Type::MINFO => 14,
            Type::MX => 15,
            Type::TXT => 16,
            Type::AAAA => 28,
            Type::SRV => 33,
            Type::OPT => 41,
            Type::AXFR => 252,
            Type::MAILB => 253,
            Type::MAILA => 254,
            Type::ANY => 255,
            Type::Unknown(i) => i,
        }
    }
}

impl From<u16> for Type {
    fn from(val: u16) -> Self {
        match val {
            1 => Type::A,
            2 => Type::NS,
            3 => Type::MD,
            4 => Type::MF,
            5 => Type::CNAME,
            6 => Type::SOA,
            7 => Type::MB,
            8 => Type::MG,
            9 => Type::MR,
            10 => Type::NULL,
            11 => Type::WKS,
            12 => Type::PTR,
            13 => Type::HINFO,
            14 => Type::MINFO,
            15 => Type::MX,
            16 => Type::TXT,
            28 => Type::AAAA,
            33 => Type::SRV,
            41 => Type::OPT,
            252 => Type::AXFR,
            253 => Type::MAILB,
            254 => Type::MAILA,
            255 => Type::ANY,
            _ => Type::Unknown(val),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The class of the query - you will want [`Class::IN`] (the default) 99.99% of
/// the time.
pub enum Class {
    /// RFC1035 - 1 the Internet.
    IN,

    /// RFC1035 - 2 the CSNET class (Obsolete - used only for examples in some
    /// obsolete RFCs)
    CS,

    /// RFC1035 - 3 the CHAOS class.
    CH,

    /// RFC1035 - 4 Hesiod [Dyer 87].
    HS,

    /// RFC1035 - 255 any class.
    ANY,

    /// An unknown class - contained within.
    Unknown(u16),
}

impl Class {
    pub(crate) fn to_bytes(self, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&u16::from(self).to_be_bytes());
        2
    }
}

impl Default for Class {
    fn default() -> Self {
        Class::IN
    }
}

impl From<Class> for u16 {
    fn from(c: Class) -> u16 {
        match c {
            Class::IN => 1,
            Class::CS => 2,
            Class::CH => 3,
            Class::HS => 4,
            Class::ANY => 255,
            Class::Unknown(i) => i,
        }
    }
}

impl From<u16> for Class {
    fn from(val: u16) -> Self {
        match val {
            1 => Class::IN,
            2 => Class::CS,
            3 => Class::CH,
            4 => Class::HS,
            255 => Class::ANY,
            _ => Class::Unknown(val),
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Self::IN => write!(f, "IN"),
            Self::CS => write!(f, "CS"),
            Self::CH => write!(f, "CH"),
            Self::HS => write!(f, "HS"),
            Self::ANY => write!(f, "ANY"),
            Self::Unknown(i) => write!(f, "CLASS{}", i),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::setup;

    #[test]
    fn test_decode() {
        setup();
        let input: &[u8] = &[
            3, 119, 119, 119, // len: 3 - www
            6, 103, 111, 111, 103, 108, 101, // len: 6 - google
            3, 99, 111, 109, // len: 3 - com
            0,   // name terminator
            0, 28, // qtype
            0, 1, // qclass
            // Second question, name is a pointer to the first
            0xc0, 0, // pointer @ 0
            0, 15, // qtype
            0, 255, // qclass
        ];

        let (first, offset) = Question::decode(input, 0).unwrap();
        assert_eq!(offset, 20);
        assert_eq!(first.q_name.to_string(), "www.google.com");
        assert_eq!(first.q_type, Type::AAAA);
        assert_eq!(first.q_class, Class::IN);
        assert_eq!(first.wire_len(), 20);

        let (second, offset) = Question::decode(input, offset).unwrap();
        assert_eq!(offset, input.len());
        assert_eq!(second.q_name, first.q_name);
        assert_eq!(second.q_type, Type::MX);
        assert_eq!(second.q_class, Class::ANY);
    }

    #[test]
    fn test_decode_missing_class() {
        setup();
        let input: &[u8] = &[1, 97, 0, 0, 1, 0];
        assert!(matches!(
            Question::decode(input, 0),
            Err(MessageError::Format(_))
        ));
    }

    #[test]
    fn test_to_bytes() {
        setup();
        let question = Question::new("example.com".parse().unwrap(), Type::PTR);
        let mut buf = Vec::new();
        let len = question.to_bytes(&mut buf);
        assert_eq!(len, question.wire_len());
        assert_eq!(&buf[len - 4..], &[0, 12, 0, 1]);

        let (decoded, offset) = Question::decode(&buf, 0).unwrap();
        assert_eq!(decoded, question);
        assert_eq!(offset, len);
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("a".parse::<Type>().unwrap(), Type::A);
        assert_eq!("AAAA".parse::<Type>().unwrap(), Type::AAAA);
        assert_eq!("*".parse::<Type>().unwrap(), Type::ANY);
        assert_eq!("15".parse::<Type>().unwrap(), Type::MX);
        assert_eq!("TYPE65".parse::<Type>().unwrap(), Type::Unknown(65));
        assert!("BOGUS".parse::<Type>().is_err());
    }

    #[test]
    fn test_type_values() {
        for val in [1u16, 2, 5, 6, 12, 15, 16, 28, 33, 41, 255, 4242] {
            assert_eq!(u16::from(Type::from(val)), val);
        }
        assert_eq!(Type::Unknown(99).to_string(), "TYPE99");
        assert_eq!(Class::from(3), Class::CH);
    }
}
