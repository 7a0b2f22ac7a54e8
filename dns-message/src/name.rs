use crate::parser::{self, Segment};
use crate::{MessageError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;
use tracing::{instrument, trace};

/// RFC1035 - labels are restricted to 63 octets or less.
pub(crate) const MAX_LABEL_LEN: usize = 63;

/// RFC1035 - names are restricted to 255 octets or less, counting length
/// octets and the root label.
pub(crate) const MAX_NAME_LEN: usize = 255;

/// A domain name, held as its sequence of labels without the root label.
///
/// Comparison and hashing ignore ASCII case, so `Example.COM` and
/// `example.com` are the same name.
#[derive(Debug, Clone, Default)]
pub struct DomainName {
    labels: Vec<String>,
}

impl DomainName {
    /// The root name, which has no labels.
    pub fn root() -> Self {
        Default::default()
    }

    /// Builds a name from its labels, validating each one.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(Into::into).collect::<Vec<String>>();
        for label in labels.iter() {
            if label.is_empty() {
                return Err(MessageError::InvalidName(labels.join(".")));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(MessageError::NameLengthExceeded(
                    label.len(),
                    label.to_string(),
                ));
            }
        }
        let name = DomainName { labels };
        if name.wire_len() > MAX_NAME_LEN {
            return Err(MessageError::NameTooLong(name.wire_len()));
        }
        Ok(name)
    }

    /// The special name used for reverse (PTR) lookups of `addr`.
    ///
    /// IPv4 addresses become their octets in reverse under `in-addr.arpa`,
    /// IPv6 addresses become their 32 nibbles in reverse under `ip6.arpa`.
    pub fn reverse_lookup(addr: IpAddr) -> Self {
        let mut labels: Vec<String> = match addr {
            IpAddr::V4(v4) => v4.octets().iter().rev().map(|o| o.to_string()).collect(),
            IpAddr::V6(v6) => v6
                .octets()
                .iter()
                .rev()
                .flat_map(|b| [b & 0xf, b >> 4])
                .map(|nibble| format!("{:x}", nibble))
                .collect(),
        };
        let suffix = match addr {
            IpAddr::V4(_) => "in-addr",
            IpAddr::V6(_) => "ip6",
        };
        labels.push(suffix.to_string());
        labels.push("arpa".to_string());
        DomainName { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// The number of bytes this name takes on the wire, uncompressed.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len()).sum::<usize>() + self.labels.len() + 1
    }

    /// Reads the name at `offset` in `message`, following compression
    /// pointers anywhere earlier in the message.
    ///
    /// Returns the name and the offset just past it: after the root label,
    /// or after the first pointer when the name was compressed.
    #[instrument(skip(message))]
    pub fn decode(message: &[u8], offset: usize) -> Result<(DomainName, usize)> {
        let mut labels = Vec::new();
        let mut wire_len = 1;
        let mut pos = offset;
        let mut run_start = offset;
        let mut end = None;

        loop {
            let input = parser::remaining(message, pos)?;
            let (rest, segment) = parser::read_segment(input)?;
            let next = pos + parser::consumed(input, rest);

            match segment {
                Segment::End => {
                    break;
                }
                Segment::Label(label) => {
                    wire_len += label.len() + 1;
                    if wire_len > MAX_NAME_LEN {
                        return Err(MessageError::NameTooLong(wire_len));
                    }
                    labels.push(std::str::from_utf8(label)?.to_string());
                    pos = next;
                }
                Segment::Pointer(target) => {
                    let target = target as usize;
                    // Each jump must land before the labels read since the
                    // last one, so the targets strictly decrease.
                    if target >= run_start {
                        return Err(MessageError::CircularReference { at: pos, target });
                    }
                    if end.is_none() {
                        end = Some(next);
                    }
                    run_start = target;
                    pos = target;
                }
            }
        }

        let end = match end {
            Some(end) => end,
            // Past the root label.
            None => pos + 1,
        };

        trace!("Read {} bytes", end - offset);

        Ok((DomainName { labels }, end))
    }

    /// Writes the name uncompressed, returning the number of bytes written.
    #[instrument(skip(buf))]
    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> usize {
        for label in self.labels.iter() {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);

        trace!("Wrote {} bytes", self.wire_len());

        self.wire_len()
    }
}

impl FromStr for DomainName {
    type Err = MessageError;

    /// Parses `www.example.com`, with or without the trailing dot. Both the
    /// empty string and `.` are the root.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_suffix('.').unwrap_or(s);
        if s.is_empty() {
            return Ok(DomainName::root());
        }
        DomainName::from_labels(s.split('.'))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        write!(f, "{}", self.labels.join("."))
    }
}

impl PartialEq for DomainName {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for DomainName {}

impl Hash for DomainName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().to_ascii_lowercase().hash(state);
    }
}
