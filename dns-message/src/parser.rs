use crate::{Header, MessageError, OpCode, RCode, Result};
use nom::bits::bits;
use nom::bits::complete::take as take_bits;
use nom::bytes::complete::take as take_bytes;
use nom::combinator::map;
use nom::number::complete::{be_u16, be_u32};
use nom::sequence::tuple;
use nom::IResult;
use tracing::{instrument, trace};

type Bits<'a> = (&'a [u8], usize);

/// One step of a wire-format domain name.
#[derive(Debug, PartialEq)]
pub(crate) enum Segment<'a> {
    /// The zero length root label.
    End,
    Label(&'a [u8]),
    /// A compression pointer to an absolute offset in the message.
    Pointer(u16),
}

/// Returns the message from `offset` onwards, or a format error when the
/// offset lies past the end of it.
pub(crate) fn remaining(message: &[u8], offset: usize) -> Result<&[u8]> {
    message.get(offset..).ok_or_else(|| {
        MessageError::format(format!(
            "offset {} is past the end of a {} byte message",
            offset,
            message.len()
        ))
    })
}

/// The number of bytes consumed by a nom parser that started on `before`.
pub(crate) fn consumed(before: &[u8], after: &[u8]) -> usize {
    before.len() - after.len()
}

pub(crate) fn read_u16(input: &[u8]) -> IResult<&[u8], u16> {
    be_u16(input)
}

pub(crate) fn read_u32(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

pub(crate) fn read_bytes(input: &[u8], count: usize) -> IResult<&[u8], &[u8]> {
    take_bytes(count)(input)
}

fn flag(input: Bits) -> IResult<Bits, bool> {
    map(take_bits(1usize), |b: u8| b == 1)(input)
}

fn bit_field(input: Bits, count: usize) -> IResult<Bits, u8> {
    take_bits(count)(input)
}

fn pointer_offset(input: Bits) -> IResult<Bits, u16> {
    take_bits(14usize)(input)
}

/// Reads the packed flag bytes:
/// `[QR(1)][OPCODE(4)][AA(1)][TC(1)][RD(1)]` `[RA(1)][Z(3)][RCODE(4)]`.
#[allow(clippy::type_complexity)]
fn read_flags(input: Bits) -> IResult<Bits, (bool, OpCode, bool, bool, bool, bool, u8, RCode)> {
    let (i, qr) = flag(input)?;
    let (i, opcode) = bit_field(i, 4)?;
    let (i, aa) = flag(i)?;
    let (i, tc) = flag(i)?;
    let (i, rd) = flag(i)?;
    let (i, ra) = flag(i)?;
    let (i, z) = bit_field(i, 3)?;
    let (i, rcode) = bit_field(i, 4)?;
    Ok((
        i,
        (
            qr,
            OpCode::from(opcode),
            aa,
            tc,
            rd,
            ra,
            z,
            RCode::from(rcode),
        ),
    ))
}

#[instrument(skip(input))]
pub(crate) fn read_header(input: &[u8]) -> IResult<&[u8], Header> {
    trace!("reading header");
    let (input, id) = read_u16(input)?;
    let (input, (qr, opcode, aa, tc, rd, ra, z, rcode)) =
        bits::<_, _, nom::error::Error<Bits>, nom::error::Error<&[u8]>, _>(read_flags)(input)?;
    let (input, (qd_count, an_count, ns_count, ar_count)) =
        tuple((read_u16, read_u16, read_u16, read_u16))(input)?;

    Ok((
        input,
        Header {
            id,
            qr,
            opcode,
            aa,
            tc,
            rd,
            ra,
            z,
            rcode,
            qd_count,
            an_count,
            ns_count,
            ar_count,
        },
    ))
}

/// Helper for pulling out either the length of a label, or the offset of
/// the rest of the name when using compression.
enum LabelRecord {
    Offset(u16),
    Length(u8),
    Invalid(u8),
}

fn read_label_record(input: Bits) -> IResult<Bits, LabelRecord> {
    let (i, kind) = bit_field(input, 2)?;
    match kind {
        0b11 => {
            let (i, offset) = pointer_offset(i)?;
            Ok((i, LabelRecord::Offset(offset)))
        }
        0b00 => {
            let (i, len) = bit_field(i, 6)?;
            Ok((i, LabelRecord::Length(len)))
        }
        other => Ok((i, LabelRecord::Invalid(other))),
    }
}

/// Reads a single name segment: a label, the terminating root label, or a
/// compression pointer.
pub(crate) fn read_segment(input: &[u8]) -> Result<(&[u8], Segment)> {
    let (i, record) =
        bits::<_, _, nom::error::Error<Bits>, nom::error::Error<&[u8]>, _>(read_label_record)(
            input,
        )?;

    match record {
        LabelRecord::Offset(offset) => {
            trace!("Name pointer at offset: {}", offset);
            Ok((i, Segment::Pointer(offset)))
        }
        LabelRecord::Length(0) => Ok((i, Segment::End)),
        LabelRecord::Length(length) => {
            trace!("Name of length {} found", length);
            let (i, label) = read_bytes(i, length as usize)?;
            Ok((i, Segment::Label(label)))
        }
        LabelRecord::Invalid(bits) => Err(MessageError::format(format!(
            "invalid label length prefix bits {:#04b}",
            bits
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_segment() {
        let (rest, segment) = read_segment(&[3, b'w', b'w', b'w', 0]).unwrap();
        assert_eq!(segment, Segment::Label(b"www"));
        assert_eq!(rest, &[0]);

        let (rest, segment) = read_segment(rest).unwrap();
        assert_eq!(segment, Segment::End);
        assert!(rest.is_empty());

        let (rest, segment) = read_segment(&[0xc0, 0x0c, 0xff]).unwrap();
        assert_eq!(segment, Segment::Pointer(12));
        assert_eq!(rest, &[0xff]);
    }

    #[test]
    fn test_read_segment_invalid_prefix() {
        assert!(matches!(
            read_segment(&[0x40, 0x01]),
            Err(MessageError::Format(_))
        ));
        assert!(matches!(
            read_segment(&[0x81, 0x01]),
            Err(MessageError::Format(_))
        ));
    }

    #[test]
    fn test_read_segment_short_label() {
        assert!(matches!(
            read_segment(&[5, b'a', b'b']),
            Err(MessageError::Format(_))
        ));
        assert!(read_segment(&[]).is_err());
    }

    #[test]
    fn test_remaining() {
        let message = [1u8, 2, 3];
        assert_eq!(remaining(&message, 1).unwrap(), &[2, 3]);
        assert!(remaining(&message, 3).unwrap().is_empty());
        assert!(remaining(&message, 4).is_err());
    }
}
