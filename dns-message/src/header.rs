use crate::{parser, MessageError, Result};
use std::fmt;
use tracing::{instrument, trace};

/// The header is always exactly 12 bytes on the wire.
pub const HEADER_LEN: usize = 12;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// The DNS Message Header as per RFC1035.
pub struct Header {
    /// RFC1035 - A 16 bit identifier assigned by the program that generates any
    /// kind of query. This identifier is copied the corresponding reply and
    /// can be used by the requester to match up replies to outstanding queries.
    pub id: u16,

    /// RFC1035 - A one bit field that specifies whether this message is a query
    /// (0), or a response (1).
    pub qr: bool,

    /// RFC1035 -  A four bit field that specifies kind of query in this
    /// message.  This value is set by the originator of a query and copied into
    /// the response.
    pub opcode: OpCode,

    /// RFC1035 - Authoritative Answer - this bit is valid in responses, and
    /// specifies that the responding name server is an authority for the domain
    /// name in question section.
    pub aa: bool,

    /// RFC1035 - TrunCation - specifies that this message was truncated due to
    /// length greater than that permitted on the transmission channel.
    pub tc: bool,

    /// RFC1035 - Recursion Desired - this bit may be set in a query and is
    /// copied into the response. If RD is set, it directs the name server to
    /// pursue the query recursively.
    pub rd: bool,

    /// RFC1035 - Recursion Available - this be is set or cleared in a response,
    /// and denotes whether recursive query support is available in the name
    /// server.
    pub ra: bool,

    /// RFC1035 - Reserved for future use. Must be zero in all queries and
    /// responses, but whatever was read is written back unchanged.
    pub z: u8,

    /// RFC1035 - Response code - this 4 bit field is set as part of responses.
    pub rcode: RCode,

    /// Number of entries in the question section.
    pub qd_count: u16,

    /// Number of resource records in the answer section.
    pub an_count: u16,

    /// Number of name server resource records in the authority section.
    pub ns_count: u16,

    /// Number of resource records in the additional records section.
    pub ar_count: u16,
}

impl Header {
    /// Decodes the 12 byte header found at `offset` in `message`.
    #[instrument(skip(message))]
    pub fn decode(message: &[u8], offset: usize) -> Result<Header> {
        let input = parser::remaining(message, offset)?;
        if input.len() < HEADER_LEN {
            return Err(MessageError::format(format!(
                "header needs {} bytes, only {} remain",
                HEADER_LEN,
                input.len()
            )));
        }
        let (_, header) = parser::read_header(input)?;

        trace!("Read {} bytes", HEADER_LEN);

        Ok(header)
    }

    #[instrument(skip(buf))]
    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        buf.extend_from_slice(&self.id.to_be_bytes());

        let mut val = 0u8;
        if self.qr {
            val |= 1 << 7;
        }
        val |= self.opcode.as_u8()? << 3;
        if self.aa {
            val |= 1 << 2;
        }
        if self.tc {
            val |= 1 << 1;
        }
        if self.rd {
            val |= 1;
        }
        buf.push(val);

        val = 0;
        if self.ra {
            val |= 1 << 7;
        }
        val |= (self.z & 0x7) << 4;
        val |= self.rcode.as_u8() & 0xf;
        buf.push(val);

        buf.extend_from_slice(&self.qd_count.to_be_bytes());
        buf.extend_from_slice(&self.an_count.to_be_bytes());
        buf.extend_from_slice(&self.ns_count.to_be_bytes());
        buf.extend_from_slice(&self.ar_count.to_be_bytes());

        trace!("Wrote {} bytes", HEADER_LEN);

        Ok(HEADER_LEN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A four bit field that specifies kind of query in this message.  This value
/// is set by the originator of a query and copied into the response.
pub enum OpCode {
    /// A standard query.
    Query,

    /// An inverse query.
    IQuery,

    /// A server status request.
    Status,

    /// RFC1996 - A zone change notification.
    Notify,

    /// RFC2136 - A dynamic update.
    Update,

    /// An unknown OpCode (contained within).
    Unknown(u8),
}

impl OpCode {
    pub(crate) fn as_u8(&self) -> Result<u8> {
        match self {
            OpCode::Query => Ok(0),
            OpCode::IQuery => Ok(1),
            OpCode::Status => Ok(2),
            OpCode::Notify => Ok(4),
            OpCode::Update => Ok(5),
            OpCode::Unknown(opcode) => {
                if *opcode > 0xf {
                    // OpCodes can only be 4 bits wide.
                    Err(MessageError::ReservedOpCode(*opcode))
                } else {
                    Ok(*opcode)
                }
            }
        }
    }
}

impl From<u8> for OpCode {
    fn from(val: u8) -> Self {
        match val {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            4 => OpCode::Notify,
            5 => OpCode::Update,
            n => OpCode::Unknown(n),
        }
    }
}

impl Default for OpCode {
    fn default() -> Self {
        OpCode::Query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Response code - this 4 bit field is set as part of responses.
pub enum RCode {
    /// No error condition.
    NoError,

    /// Format error - The name server was unable to interpret the query.
    FormatError,

    /// Server failure - The name server was unable to process this query due to
    /// a problem with the name server.
    ServerFailure,

    /// Name Error - Meaningful only for responses from an authoritative name
    /// server, this code signifies that the domain name referenced in the query
    /// does not exist.
    NameError,

    /// Not Implemented - The name server does not support the requested kind of
    /// query.
    NotImplemented,

    /// Refused - The name server refuses to perform the specified operation for
    /// policy reasons.
    Refused,

    /// RFC2136 - Some name that ought not to exist, does exist.
    YXDomain,

    /// RFC2136 - Some RRset that ought not to exist, does exist.
    YXRRSet,

    /// RFC2136 - Some RRset that ought to exist, does not exist.
    NXRRSet,

    /// RFC2136 - The server is not authoritative for the zone named.
    NotAuth,

    /// RFC2136 - A name used is not within the zone.
    NotZone,

    /// The response code was unknown (contained within).
    Unknown(u8),
}

impl RCode {
    pub(crate) fn as_u8(&self) -> u8 {
        match self {
            RCode::NoError => 0,
            RCode::FormatError => 1,
            RCode::ServerFailure => 2,
            RCode::NameError => 3,
            RCode::NotImplemented => 4,
            RCode::Refused => 5,
            RCode::YXDomain => 6,
            RCode::YXRRSet => 7,
            RCode::NXRRSet => 8,
            RCode::NotAuth => 9,
            RCode::NotZone => 10,
            RCode::Unknown(i) => *i,
        }
    }
}

impl From<u8> for RCode {
    fn from(val: u8) -> Self {
        match val {
            0 => RCode::NoError,
            1 => RCode::FormatError,
            2 => RCode::ServerFailure,
            3 => RCode::NameError,
            4 => RCode::NotImplemented,
            5 => RCode::Refused,
            6 => RCode::YXDomain,
            7 => RCode::YXRRSet,
            8 => RCode::NXRRSet,
            9 => RCode::NotAuth,
            10 => RCode::NotZone,
            x => RCode::Unknown(x),
        }
    }
}

impl Default for RCode {
    fn default() -> Self {
        RCode::NoError
    }
}

impl fmt::Display for RCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        let disp = match self {
            Self::NoError => "NOERROR",
            Self::FormatError => "FORMERR",
            Self::ServerFailure => "SERVFAIL",
            Self::NameError => "NXDOMAIN",
            Self::NotImplemented => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::YXDomain => "YXDOMAIN",
            Self::YXRRSet => "YXRRSET",
            Self::NXRRSet => "NXRRSET",
            Self::NotAuth => "NOTAUTH",
            Self::NotZone => "NOTZONE",
            Self::Unknown(i) => {
                write!(f, "Unknown({})", i)?;
                return Ok(());
            }
        };
        write!(f, "{}", disp)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::setup;

    #[test]
    fn test_decode_flags() {
        setup();
        let input: &[u8] = &[
            0xdb, 0x42, // ID
            0x81, 0x80, // QR, RD, RA
            0x00, 0x01, // qdcount
            0x00, 0x02, // ancount
            0x00, 0x03, // nscount
            0x00, 0x04, // arcount
        ];

        let header = Header::decode(input, 0).unwrap();

        assert_eq!(header.id, 56130);
        assert!(header.qr);
        assert_eq!(header.opcode, OpCode::Query);
        assert!(!header.aa);
        assert!(!header.tc);
        assert!(header.rd);
        assert!(header.ra);
        assert_eq!(header.z, 0);
        assert_eq!(header.rcode, RCode::NoError);
        assert_eq!(header.qd_count, 1);
        assert_eq!(header.an_count, 2);
        assert_eq!(header.ns_count, 3);
        assert_eq!(header.ar_count, 4);
    }

    #[test]
    fn test_decode_at_offset() {
        setup();
        let input: &[u8] = &[
            0xff, 0xff, 0xff, // leading junk
            0x12, 0x34, 0x2a, 0x03, 0, 0, 0, 0, 0, 0, 0, 0,
        ];

        let header = Header::decode(input, 3).unwrap();

        assert_eq!(header.id, 0x1234);
        assert!(!header.qr);
        assert_eq!(header.opcode, OpCode::Update);
        assert!(!header.aa);
        assert!(header.tc);
        assert!(!header.rd);
        assert_eq!(header.rcode, RCode::NameError);
    }

    #[test]
    fn test_decode_short() {
        setup();
        let input = [0u8; 11];
        assert!(matches!(
            Header::decode(&input, 0),
            Err(MessageError::Format(_))
        ));
        assert!(matches!(
            Header::decode(&[0u8; 12], 1),
            Err(MessageError::Format(_))
        ));
    }

    #[test]
    fn test_to_bytes_from_bytes() {
        setup();
        let header = Header {
            id: 0xbeef,
            qr: true,
            opcode: OpCode::Status,
            aa: true,
            tc: true,
            rd: false,
            ra: true,
            z: 0,
            rcode: RCode::Refused,
            qd_count: 1,
            an_count: 0,
            ns_count: 7,
            ar_count: 65535,
        };

        let mut buf = Vec::new();
        assert_eq!(header.to_bytes(&mut buf).unwrap(), HEADER_LEN);
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(&buf[0..4], &[0xbe, 0xef, 0x96, 0x85]);

        assert_eq!(Header::decode(&buf, 0).unwrap(), header);
    }

    #[test]
    fn test_reserved_bits_round_trip() {
        setup();
        let input: &[u8] = &[0, 1, 0x01, 0x70, 0, 0, 0, 0, 0, 0, 0, 0];
        let header = Header::decode(input, 0).unwrap();
        assert_eq!(header.z, 0b111);
        assert!(header.rd);
        assert!(!header.ra);

        let mut buf = Vec::new();
        header.to_bytes(&mut buf).unwrap();
        assert_eq!(buf, input);
    }

    #[test]
    fn test_wide_opcode_rejected() {
        let header = Header {
            opcode: OpCode::Unknown(16),
            ..Default::default()
        };
        let mut buf = Vec::new();
        assert!(matches!(
            header.to_bytes(&mut buf),
            Err(MessageError::ReservedOpCode(16))
        ));
    }
}
