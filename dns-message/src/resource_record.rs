use crate::{parser, Class, DomainName, MessageError, Result, Type};
use nom::combinator::all_consuming;
use nom::multi::{length_data, many0};
use nom::number::complete::be_u8;
use nom::sequence::tuple;
use nom::IResult;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{instrument, trace};

/// The generic resource record envelope, exactly as it appears on the wire.
///
/// The rdata is kept as raw bytes. Any names inside it may be compressed
/// against the message it was read from, so it only makes sense alongside
/// that message - see [`ResourceRecord::from_raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: DomainName,
    pub r_type: Type,
    pub class: Class,
    pub ttl: u32,
    pub data: Vec<u8>,
}

impl RawRecord {
    /// Reads the record at `offset`, returning it and the offset of whatever
    /// follows it. The rdata starts at `next - record.data.len()`.
    #[instrument(skip(message))]
    pub fn decode(message: &[u8], offset: usize) -> Result<(RawRecord, usize)> {
        let (name, offset) = DomainName::decode(message, offset)?;

        let input = parser::remaining(message, offset)?;
        let (i, (r_type, class, ttl, rdlength)) = tuple((
            parser::read_u16,
            parser::read_u16,
            parser::read_u32,
            parser::read_u16,
        ))(input)?;

        trace!("Found rdata of length: {}", rdlength);

        let (rest, data) = parser::read_bytes(i, rdlength as usize)?;
        let next = offset + parser::consumed(input, rest);

        Ok((
            RawRecord {
                name,
                r_type: Type::from(r_type),
                class: Class::from(class),
                ttl,
                data: Vec::from(data),
            },
            next,
        ))
    }

    #[instrument(skip(buf))]
    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        if self.data.len() > u16::MAX as usize {
            return Err(MessageError::format(format!(
                "rdata of {} bytes does not fit in a record",
                self.data.len()
            )));
        }

        let mut byte_count = self.name.to_bytes(buf);
        byte_count += self.r_type.to_bytes(buf);
        byte_count += self.class.to_bytes(buf);
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.data);
        byte_count += 6 + self.data.len();

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }

    /// The wire size: the name, ten bytes of type, class, ttl and rdlength,
    /// then the rdata.
    pub fn wire_len(&self) -> usize {
        self.name.wire_len() + 10 + self.data.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The answer, authority and additional sections all share the same format,
/// that is a variable number of [`ResourceRecord`]s.
///
/// These can be constructed with a [`crate::ResourceRecordBuilder`].
pub struct ResourceRecord {
    /// A domain name to which this resource record pertains.
    pub name: DomainName,

    /// The class of the data in the `data` field.
    pub class: Class,

    /// RFC1035 - a 32 bit unsigned integer that specifies the time interval (in
    /// seconds) that the resource record may be cached before it should be
    /// discarded.  Zero values are interpreted to mean that the RR can only be
    /// used for the transaction in progress, and should not be cached.
    pub ttl: u32,

    /// The type and data of the resource record.
    pub data: RData,
}

impl ResourceRecord {
    /// Re-interprets the rdata of `raw` according to its type.
    ///
    /// `data_offset` is where the rdata begins in `message`; embedded names
    /// are decoded against the whole message as they may use compression.
    /// Types without a typed form come back as [`RData::Generic`].
    #[instrument(skip(message, raw), fields(r_type = %raw.r_type))]
    pub fn from_raw(message: &[u8], raw: RawRecord, data_offset: usize) -> Result<ResourceRecord> {
        let data_end = data_offset + raw.data.len();

        let data = match raw.r_type {
            Type::A | Type::AAAA => RData::Address(read_address(raw.r_type, &raw.data)?),
            Type::NS => RData::NameServer(read_embedded_name(message, data_offset, data_end)?.0),
            Type::CNAME => {
                RData::CanonicalName(read_embedded_name(message, data_offset, data_end)?.0)
            }
            Type::PTR => RData::Pointer(read_embedded_name(message, data_offset, data_end)?.0),
            Type::MX => {
                let input = parser::remaining(message, data_offset)?;
                let (_, preference) = parser::read_u16(input)?;
                check_within(data_offset + 2, data_end)?;
                let (exchange, _) = read_embedded_name(message, data_offset + 2, data_end)?;
                RData::MailExchange {
                    preference,
                    exchange,
                }
            }
            Type::SOA => {
                let (mname, offset) = read_embedded_name(message, data_offset, data_end)?;
                let (rname, offset) = read_embedded_name(message, offset, data_end)?;
                check_within(offset + 20, data_end)?;

                let input = parser::remaining(message, offset)?;
                let (_, (serial, refresh, retry, expire, minimum)) = tuple((
                    parser::read_u32,
                    parser::read_u32,
                    parser::read_u32,
                    parser::read_u32,
                    parser::read_u32,
                ))(input)?;

                RData::StartOfAuthority(StartOfAuthority {
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                })
            }
            Type::TXT => RData::Text(read_character_strings(&raw.data)?),
            r_type => RData::Generic {
                r_type,
                data: raw.data,
            },
        };

        trace!("Parsed rdata as {}", data);

        Ok(ResourceRecord {
            name: raw.name,
            class: raw.class,
            ttl: raw.ttl,
            data,
        })
    }

    /// Reads the record at `offset` and types its rdata, returning it and
    /// the offset of whatever follows it.
    pub fn decode(message: &[u8], offset: usize) -> Result<(ResourceRecord, usize)> {
        let (raw, next) = RawRecord::decode(message, offset)?;
        let data_offset = next - raw.data.len();
        Ok((ResourceRecord::from_raw(message, raw, data_offset)?, next))
    }

    pub fn r_type(&self) -> Type {
        self.data.r_type()
    }

    /// The address of an A or AAAA record.
    pub fn address(&self) -> Option<IpAddr> {
        match self.data {
            RData::Address(addr) => Some(addr),
            _ => None,
        }
    }

    /// The name carried by an NS, CNAME or PTR record.
    pub fn domain_name(&self) -> Option<&DomainName> {
        match &self.data {
            RData::NameServer(name) | RData::CanonicalName(name) | RData::Pointer(name) => {
                Some(name)
            }
            _ => None,
        }
    }

    /// The generic envelope for this record, with any embedded names written
    /// uncompressed.
    pub fn to_raw(&self) -> Result<RawRecord> {
        // We need this temp (rdata) buffer here as we don't know how long the
        // rdata will be until we convert it to bytes.
        let mut data = Vec::with_capacity(255);
        self.data.to_bytes(&mut data)?;

        Ok(RawRecord {
            name: self.name.clone(),
            r_type: self.r_type(),
            class: self.class,
            ttl: self.ttl,
            data,
        })
    }

    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        self.to_raw()?.to_bytes(buf)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        write!(
            f,
            "{} {} {} {} {}",
            self.name,
            self.ttl,
            self.class,
            self.r_type(),
            self.data
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// RFC1035 - (6) marks the start of a zone of authority.
pub struct StartOfAuthority {
    /// The <domain-name> of the name server that was the original or primary
    /// source of data for this zone.
    pub mname: DomainName,

    /// A <domain-name> which specifies the mailbox of the person responsible
    /// for this zone.
    pub rname: DomainName,

    /// The unsigned 32 bit version number of the original copy of the zone.
    /// Zone transfers preserve this value. This value wraps and should be
    /// compared using sequence space arithmetic.
    pub serial: u32,

    /// A 32 bit time interval before the zone should be refreshed.
    pub refresh: u32,

    /// A 32 bit time interval that should elapse before a failed refresh
    /// should be retried.
    pub retry: u32,

    /// A 32 bit time value that specifies the upper limit on the time interval
    /// that can elapse before the zone is no longer authoritative.
    pub expire: u32,

    /// The unsigned 32 bit minimum TTL field that should be exported with any
    /// RR from this zone.
    pub minimum: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The [`ResourceRecord`] data.
pub enum RData {
    /// RFC1035 - (1) a host address, or RFC3596 - (28) an IPv6 host address.
    Address(IpAddr),

    /// RFC1035 - (2) an authoritative name server.
    NameServer(DomainName),

    /// RFC1035 - (5) the canonical name for an alias.
    CanonicalName(DomainName),

    /// RFC1035 - (12) a domain name pointer.
    Pointer(DomainName),

    /// RFC1035 - (15) mail exchange.
    MailExchange {
        preference: u16,
        exchange: DomainName,
    },

    /// RFC1035 - (6) marks the start of a zone of authority.
    StartOfAuthority(StartOfAuthority),

    /// RFC1035 - (16) one or more character-strings, kept as raw bytes as
    /// they need not be text.
    Text(Vec<Vec<u8>>),

    /// Any other type, with its rdata left as it was on the wire.
    Generic { r_type: Type, data: Vec<u8> },
}

impl RData {
    pub fn r_type(&self) -> Type {
        match self {
            RData::Address(IpAddr::V4(_)) => Type::A,
            RData::Address(IpAddr::V6(_)) => Type::AAAA,
            RData::NameServer(_) => Type::NS,
            RData::CanonicalName(_) => Type::CNAME,
            RData::Pointer(_) => Type::PTR,
            RData::MailExchange { .. } => Type::MX,
            RData::StartOfAuthority(_) => Type::SOA,
            RData::Text(_) => Type::TXT,
            RData::Generic { r_type, .. } => *r_type,
        }
    }

    #[instrument(skip(buf))]
    fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        match self {
            RData::Address(IpAddr::V4(v4)) => {
                buf.extend_from_slice(&v4.octets());
                Ok(4)
            }
            RData::Address(IpAddr::V6(v6)) => {
                buf.extend_from_slice(&v6.octets());
                Ok(16)
            }
            RData::NameServer(name) | RData::CanonicalName(name) | RData::Pointer(name) => {
                Ok(name.to_bytes(buf))
            }
            RData::MailExchange {
                preference,
                exchange,
            } => {
                buf.extend_from_slice(&preference.to_be_bytes());
                Ok(2 + exchange.to_bytes(buf))
            }
            RData::StartOfAuthority(soa) => {
                let mut bytes_written = soa.mname.to_bytes(buf);
                bytes_written += soa.rname.to_bytes(buf);

                buf.extend_from_slice(&soa.serial.to_be_bytes());
                buf.extend_from_slice(&soa.refresh.to_be_bytes());
                buf.extend_from_slice(&soa.retry.to_be_bytes());
                buf.extend_from_slice(&soa.expire.to_be_bytes());
                buf.extend_from_slice(&soa.minimum.to_be_bytes());
                bytes_written += 20;

                Ok(bytes_written)
            }
            RData::Text(strings) => {
                let mut bytes_written = 0;
                for s in strings.iter() {
                    if s.len() > u8::MAX as usize {
                        return Err(MessageError::format(format!(
                            "character-string of {} bytes exceeds 255 bytes",
                            s.len()
                        )));
                    }
                    buf.push(s.len() as u8);
                    buf.extend_from_slice(s);
                    bytes_written += 1 + s.len();
                }
                Ok(bytes_written)
            }
            RData::Generic { data, .. } => {
                buf.extend_from_slice(data);
                Ok(data.len())
            }
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Self::Address(addr) => write!(f, "{}", addr),
            Self::NameServer(name) | Self::CanonicalName(name) | Self::Pointer(name) => {
                write!(f, "{}", name)
            }
            Self::MailExchange {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            Self::StartOfAuthority(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            Self::Text(strings) => {
                for (i, s) in strings.iter().enumerate() {
                    if i != 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:?}", String::from_utf8_lossy(s))?;
                }
                Ok(())
            }
            Self::Generic { data, .. } => write!(f, "{:?}", data),
        }
    }
}

/// An A record carries exactly 4 bytes and an AAAA record exactly 16.
fn read_address(r_type: Type, data: &[u8]) -> Result<IpAddr> {
    match (r_type, data.len()) {
        (Type::A, 4) => {
            let mut v4 = [0u8; 4];
            v4.copy_from_slice(data);
            Ok(IpAddr::V4(Ipv4Addr::from(v4)))
        }
        (Type::AAAA, 16) => {
            let mut v6 = [0u8; 16];
            v6.copy_from_slice(data);
            Ok(IpAddr::V6(Ipv6Addr::from(v6)))
        }
        (r_type, n) => Err(MessageError::format(format!(
            "{} rdata of {} bytes is not an address",
            r_type, n
        ))),
    }
}

fn check_within(end: usize, data_end: usize) -> Result<()> {
    if end > data_end {
        return Err(MessageError::format(format!(
            "rdata runs to {} but the record ends at {}",
            end, data_end
        )));
    }
    Ok(())
}

/// Decodes a name inside rdata against the whole message, making sure it
/// does not run past the end of the rdata.
fn read_embedded_name(
    message: &[u8],
    offset: usize,
    data_end: usize,
) -> Result<(DomainName, usize)> {
    let (name, end) = DomainName::decode(message, offset)?;
    check_within(end, data_end)?;
    Ok((name, end))
}

fn read_character_strings(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let parsed: IResult<&[u8], Vec<&[u8]>> = all_consuming(many0(length_data(be_u8)))(data);
    let (_, strings) = parsed?;
    Ok(strings.into_iter().map(Vec::from).collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::setup;

    fn name(s: &str) -> DomainName {
        s.parse().unwrap()
    }

    /// `example.com` at offset 0, followed by a record at offset 13 whose
    /// name points back at it.
    fn message_with_record(r_type: u16, rdata: &[u8]) -> Vec<u8> {
        let mut message = vec![
            7, 101, 120, 97, 109, 112, 108, 101, // example
            3, 99, 111, 109, 0, // com
            0xc0, 0, // name - pointer @ 0
        ];
        message.extend_from_slice(&r_type.to_be_bytes());
        message.extend_from_slice(&[0, 1]); // class IN
        message.extend_from_slice(&[0, 0, 0x0e, 0x10]); // ttl 3600
        message.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        message.extend_from_slice(rdata);
        message
    }

    #[test]
    fn test_raw_decode() {
        setup();
        let message = message_with_record(1, &[93, 184, 216, 34]);
        let (raw, next) = RawRecord::decode(&message, 13).unwrap();

        assert_eq!(next, message.len());
        assert_eq!(raw.name, name("example.com"));
        assert_eq!(raw.r_type, Type::A);
        assert_eq!(raw.class, Class::IN);
        assert_eq!(raw.ttl, 3600);
        assert_eq!(raw.data, &[93, 184, 216, 34]);
        assert_eq!(next - raw.data.len(), 25);
    }

    #[test]
    fn test_raw_wire_len() {
        setup();
        let raw = RawRecord {
            name: name("example.com"),
            r_type: Type::Unknown(99),
            class: Class::IN,
            ttl: 1,
            data: vec![1, 2, 3],
        };
        let mut buf = Vec::new();
        let len = raw.to_bytes(&mut buf).unwrap();
        assert_eq!(len, raw.wire_len());
        assert_eq!(len, 13 + 10 + 3);
        assert_eq!(RawRecord::decode(&buf, 0).unwrap(), (raw, len));
    }

    #[test]
    fn test_raw_decode_short_rdata() {
        setup();
        let mut message = message_with_record(1, &[93, 184, 216, 34]);
        message.pop();
        assert!(matches!(
            RawRecord::decode(&message, 13),
            Err(MessageError::Format(_))
        ));
    }

    #[test]
    fn test_address() {
        setup();
        let message = message_with_record(1, &[93, 184, 216, 34]);
        let (record, _) = ResourceRecord::decode(&message, 13).unwrap();
        assert_eq!(
            record.data,
            RData::Address(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)))
        );
        assert_eq!(record.r_type(), Type::A);
        assert_eq!(record.address(), Some("93.184.216.34".parse().unwrap()));

        let v6: Ipv6Addr = "2606:2800:220:1:248:1893:25c8:1946".parse().unwrap();
        let message = message_with_record(28, &v6.octets());
        let (record, _) = ResourceRecord::decode(&message, 13).unwrap();
        assert_eq!(record.address(), Some(IpAddr::V6(v6)));
        assert_eq!(record.r_type(), Type::AAAA);
    }

    #[test]
    fn test_address_bad_length() {
        setup();
        let message = message_with_record(1, &[93, 184, 216]);
        assert!(matches!(
            ResourceRecord::decode(&message, 13),
            Err(MessageError::Format(_))
        ));

        // The length must match the record type, not just either family.
        let message = message_with_record(1, &[0; 16]);
        assert!(matches!(
            ResourceRecord::decode(&message, 13),
            Err(MessageError::Format(_))
        ));
        let message = message_with_record(28, &[127, 0, 0, 1]);
        assert!(matches!(
            ResourceRecord::decode(&message, 13),
            Err(MessageError::Format(_))
        ));
    }

    #[test]
    fn test_address_keeps_wire_type() {
        setup();
        for (r_type, rdata) in [(1u16, vec![10, 0, 0, 1]), (28, vec![0xfe; 16])] {
            let message = message_with_record(r_type, &rdata);
            let (raw, _) = RawRecord::decode(&message, 13).unwrap();
            let (record, _) = ResourceRecord::decode(&message, 13).unwrap();
            assert_eq!(record.r_type(), Type::from(r_type));
            assert_eq!(record.to_raw().unwrap(), raw);
        }
    }

    #[test]
    fn test_compressed_names() {
        setup();
        let rdata = &[3, 119, 119, 119, 0xc0, 0]; // www + pointer @ 0
        for (r_type, expected) in [
            (2, RData::NameServer(name("www.example.com"))),
            (5, RData::CanonicalName(name("www.example.com"))),
            (12, RData::Pointer(name("www.example.com"))),
        ] {
            let message = message_with_record(r_type, rdata);
            let (record, next) = ResourceRecord::decode(&message, 13).unwrap();
            assert_eq!(next, message.len());
            assert_eq!(record.name, name("example.com"));
            assert_eq!(record.data, expected);
            assert_eq!(record.domain_name(), Some(&name("www.example.com")));
        }
    }

    #[test]
    fn test_embedded_name_overruns_rdata() {
        setup();
        // rdlength says 2 but the name needs 5.
        let mut message = message_with_record(5, &[3, 119]);
        message.extend_from_slice(&[119, 119, 0]);
        assert!(matches!(
            ResourceRecord::decode(&message, 13),
            Err(MessageError::Format(_))
        ));
    }

    #[test]
    fn test_mail_exchange() {
        setup();
        let rdata = &[0, 10, 4, 109, 97, 105, 108, 0xc0, 0]; // 10 mail.example.com
        let message = message_with_record(15, rdata);
        let (record, _) = ResourceRecord::decode(&message, 13).unwrap();
        assert_eq!(
            record.data,
            RData::MailExchange {
                preference: 10,
                exchange: name("mail.example.com"),
            }
        );
        assert_eq!(record.domain_name(), None);
    }

    #[test]
    fn test_start_of_authority() {
        setup();
        let mut rdata = vec![
            3, 110, 115, 49, 0xc0, 0, // ns1.example.com
            10, 104, 111, 115, 116, 109, 97, 115, 116, 101, 114, 0xc0,
            0, // hostmaster.example.com
        ];
        for v in [2021010101u32, 7200, 3600, 1209600, 300] {
            rdata.extend_from_slice(&v.to_be_bytes());
        }
        let message = message_with_record(6, &rdata);
        let (record, _) = ResourceRecord::decode(&message, 13).unwrap();
        assert_eq!(
            record.data,
            RData::StartOfAuthority(StartOfAuthority {
                mname: name("ns1.example.com"),
                rname: name("hostmaster.example.com"),
                serial: 2021010101,
                refresh: 7200,
                retry: 3600,
                expire: 1209600,
                minimum: 300,
            })
        );

        // Missing the last field.
        let message = message_with_record(6, &rdata[..rdata.len() - 4]);
        assert!(ResourceRecord::decode(&message, 13).is_err());
    }

    #[test]
    fn test_text() {
        setup();
        let rdata = &[5, 104, 101, 108, 108, 111, 0, 5, 119, 111, 114, 108, 100];
        let message = message_with_record(16, rdata);
        let (record, _) = ResourceRecord::decode(&message, 13).unwrap();
        assert_eq!(
            record.data,
            RData::Text(vec![b"hello".to_vec(), Vec::new(), b"world".to_vec()])
        );
        assert_eq!(record.data.to_string(), r#""hello" "" "world""#);

        let message = message_with_record(16, &[5, 104, 101]);
        assert!(ResourceRecord::decode(&message, 13).is_err());
    }

    #[test]
    fn test_text_binary_round_trip() {
        setup();
        let mut rdata = vec![255u8];
        rdata.extend_from_slice(&[0xff; 255]);
        rdata.extend_from_slice(&[2, 0x00, 0x80]);
        let message = message_with_record(16, &rdata);
        let (raw, _) = RawRecord::decode(&message, 13).unwrap();
        let (record, _) = ResourceRecord::decode(&message, 13).unwrap();

        assert_eq!(
            record.data,
            RData::Text(vec![vec![0xff; 255], vec![0x00, 0x80]])
        );
        let encoded = record.to_raw().unwrap();
        assert_eq!(encoded.data.len(), 259);
        assert_eq!(encoded, raw);
    }

    #[test]
    fn test_generic_passthrough() {
        setup();
        let message = message_with_record(99, &[1, 2, 3, 4, 5]);
        let (raw, next) = RawRecord::decode(&message, 13).unwrap();
        let record = ResourceRecord::from_raw(&message, raw.clone(), next - 5).unwrap();
        assert_eq!(
            record.data,
            RData::Generic {
                r_type: Type::Unknown(99),
                data: vec![1, 2, 3, 4, 5],
            }
        );
        assert_eq!(record.to_raw().unwrap(), raw);
    }

    #[test]
    fn test_to_raw_writes_names_uncompressed() {
        setup();
        let message = message_with_record(12, &[3, 119, 119, 119, 0xc0, 0]);
        let (record, _) = ResourceRecord::decode(&message, 13).unwrap();

        let mut buf = Vec::new();
        let len = record.to_bytes(&mut buf).unwrap();
        assert_eq!(len, buf.len());

        let (decoded, next) = ResourceRecord::decode(&buf, 0).unwrap();
        assert_eq!(next, len);
        assert_eq!(decoded, record);
        assert_eq!(record.to_raw().unwrap().data.len(), 17);
    }
}
