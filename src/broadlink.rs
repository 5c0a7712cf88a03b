//! Broadlink wire codec: the variable-length binary payload consumed by the
//! transceiver, base64-wrapped for JSON transport.
//!
//! Packet layout: `0x26` IR header, repeat byte, little-endian u16 length of
//! the tick stream, the stream itself, `0x0D 0x05` terminator, zero padding.
//! Each duration becomes a count of 8192/269 us (~32.84 us) hardware ticks:
//! one byte when the count fits, otherwise `0x00` plus a big-endian u16.
//! The length field covers the tick stream only. Padding aligns `len + 4`
//! to 16: the transport layer prepends a 4-byte send header before AES
//! encryption and block alignment counts it.

use crate::timing::{ConvertError, TimingSequence};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// IR packet header byte.
pub const IR_HEADER: u8 = 0x26;
/// RF packet headers; recognized by the decoder, never emitted.
const RF433_HEADER: u8 = 0xB2;
const RF315_HEADER: u8 = 0xD7;
/// Tick-stream terminator.
const TERMINATOR: [u8; 2] = [0x0D, 0x05];
/// Hardware tick scale: ticks = us * 269 / 8192. Inherited from the
/// transceiver clock; the hardware decodes these ticks bit-exact.
const TICK_NUM: u64 = 269;
const TICK_DEN: u64 = 8192;
/// Escape marker: the next two bytes are a big-endian tick count.
const ESCAPE: u8 = 0x00;
/// Bytes the transport layer prepends before AES.
const SEND_HEADER_LEN: usize = 4;
const AES_BLOCK: usize = 16;

/// A wire-format command: raw bytes plus their base64 transport form.
/// Only [`encode`] constructs these; the two fields never diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    wire: Vec<u8>,
    base64: String,
}

impl EncodedCommand {
    /// The full binary payload, header and padding included.
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// The base64 transport form; this is the string that gets persisted.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn into_base64(self) -> String {
        self.base64
    }
}

fn us_to_ticks(us: u32) -> u64 {
    (us as u64 * TICK_NUM + TICK_DEN / 2) / TICK_DEN
}

fn ticks_to_us(ticks: u64) -> u32 {
    ((ticks * TICK_DEN + TICK_NUM / 2) / TICK_NUM) as u32
}

/// Encode a timing sequence into the wire format. Deterministic: identical
/// input always yields identical bytes.
pub fn encode(seq: &TimingSequence) -> Result<EncodedCommand, ConvertError> {
    if seq.durations.is_empty() {
        return Err(ConvertError::MalformedInput(
            "empty pulse train".to_string(),
        ));
    }
    if seq.repeat > 255 {
        return Err(ConvertError::MalformedInput(format!(
            "repeat count {} exceeds the one-byte wire field",
            seq.repeat
        )));
    }

    let mut stream = Vec::with_capacity(seq.durations.len() + 8);
    for (i, &us) in seq.durations.iter().enumerate() {
        let ticks = us_to_ticks(us);
        if ticks == 0 {
            // A raw 0x00 byte is the escape marker; sub-tick pulses have no
            // representation.
            return Err(ConvertError::ValueOutOfRange(format!(
                "pulse {}: {} us is below one tick",
                i, us
            )));
        }
        if ticks <= 0xFF {
            stream.push(ticks as u8);
        } else if ticks <= 0xFFFF {
            let mut buf = [0u8; 2];
            BigEndian::write_u16(&mut buf, ticks as u16);
            stream.push(ESCAPE);
            stream.extend_from_slice(&buf);
        } else {
            return Err(ConvertError::ValueOutOfRange(format!(
                "pulse {}: {} us scales to {} ticks, beyond the two-byte escape",
                i, us, ticks
            )));
        }
    }
    if stream.len() > 0xFFFF {
        return Err(ConvertError::ValueOutOfRange(format!(
            "tick stream of {} bytes exceeds the u16 length field",
            stream.len()
        )));
    }

    let mut wire = Vec::with_capacity(4 + stream.len() + TERMINATOR.len() + AES_BLOCK);
    wire.push(IR_HEADER);
    wire.push(seq.repeat as u8);
    let mut len = [0u8; 2];
    LittleEndian::write_u16(&mut len, stream.len() as u16);
    wire.extend_from_slice(&len);
    wire.extend_from_slice(&stream);
    wire.extend_from_slice(&TERMINATOR);
    let remainder = (wire.len() + SEND_HEADER_LEN) % AES_BLOCK;
    if remainder != 0 {
        wire.resize(wire.len() + AES_BLOCK - remainder, 0);
    }

    let base64 = BASE64.encode(&wire);
    Ok(EncodedCommand { wire, base64 })
}

/// Decode wire bytes back into a timing sequence. Verification path only:
/// the production flow never round-trips. The wire carries no carrier
/// frequency, so `carrier_hz` comes back 0.
pub fn decode(wire: &[u8]) -> Result<TimingSequence, ConvertError> {
    let mut r = Cursor::new(wire);
    let header = r
        .read_u8()
        .map_err(|_| truncated("packet header"))?;
    match header {
        IR_HEADER => {}
        RF433_HEADER | RF315_HEADER => {
            return Err(ConvertError::UnsupportedProtocol(format!(
                "RF packet header {:#04X}",
                header
            )))
        }
        other => {
            return Err(ConvertError::MalformedInput(format!(
                "unknown packet header {:#04X}",
                other
            )))
        }
    }
    let repeat = r.read_u8().map_err(|_| truncated("repeat byte"))? as u32;
    let stream_len = r
        .read_u16::<LittleEndian>()
        .map_err(|_| truncated("length field"))? as usize;
    let start = r.position() as usize;
    let end = start + stream_len;
    if end > wire.len() {
        return Err(ConvertError::MalformedInput(format!(
            "length field {} runs past the {}-byte payload",
            stream_len,
            wire.len()
        )));
    }

    let mut durations = Vec::new();
    while (r.position() as usize) < end {
        let b = r.read_u8().map_err(|_| truncated("tick stream"))?;
        let ticks = if b == ESCAPE {
            if r.position() as usize + 2 > end {
                return Err(ConvertError::MalformedInput(
                    "truncated escape sequence".to_string(),
                ));
            }
            let v = r
                .read_u16::<BigEndian>()
                .map_err(|_| truncated("escape sequence"))?;
            if v == 0 {
                return Err(ConvertError::MalformedInput(
                    "zero-tick escape sequence".to_string(),
                ));
            }
            v as u64
        } else {
            b as u64
        };
        durations.push(ticks_to_us(ticks));
    }
    if durations.is_empty() {
        return Err(ConvertError::MalformedInput(
            "empty tick stream".to_string(),
        ));
    }

    if wire.len() < end + TERMINATOR.len() || wire[end..end + TERMINATOR.len()] != TERMINATOR {
        return Err(ConvertError::MalformedInput(
            "missing 0x0D 0x05 terminator".to_string(),
        ));
    }

    Ok(TimingSequence {
        carrier_hz: 0,
        durations,
        repeat,
    })
}

/// Unwrap the base64 transport form into wire bytes.
pub fn unwrap_base64(code: &str) -> Result<Vec<u8>, ConvertError> {
    BASE64
        .decode(code.trim())
        .map_err(|e| ConvertError::MalformedInput(format!("base64: {}", e)))
}

/// Decode a base64-wrapped command (base64, then [`decode`]).
pub fn decode_base64(code: &str) -> Result<TimingSequence, ConvertError> {
    decode(&unwrap_base64(code)?)
}

fn truncated(what: &str) -> ConvertError {
    ConvertError::MalformedInput(format!("truncated {}", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One tick in microseconds, rounded up; round-trip error stays within it.
    const TICK_US: u32 = 31;

    #[test]
    fn single_byte_and_escape_boundary() {
        // 7751 us rounds to exactly 255 ticks, 7781 us to 256.
        let seq = TimingSequence::new(38_000, vec![7751, 7781]);
        let cmd = encode(&seq).expect("encode");
        assert_eq!(&cmd.wire()[..4], &[0x26, 0x00, 0x04, 0x00]);
        assert_eq!(&cmd.wire()[4..8], &[0xFF, 0x00, 0x01, 0x00]);
        assert_eq!(&cmd.wire()[8..10], &TERMINATOR);
    }

    #[test]
    fn exact_wire_bytes_and_base64() {
        let seq = TimingSequence::new(38_000, vec![7751, 7781]);
        let cmd = encode(&seq).expect("encode");
        // 10 payload bytes + 2 padding: (12 + 4) % 16 == 0.
        assert_eq!(
            cmd.wire(),
            &[0x26, 0x00, 0x04, 0x00, 0xFF, 0x00, 0x01, 0x00, 0x0D, 0x05, 0x00, 0x00]
        );
        assert_eq!(cmd.base64(), "JgAEAP8AAQANBQAA");
    }

    #[test]
    fn encoding_is_deterministic() {
        let seq = TimingSequence::new(38_000, vec![9000, 4500, 560, 560, 560, 1690]);
        let a = encode(&seq).expect("encode");
        let b = encode(&seq).expect("encode");
        assert_eq!(a.wire(), b.wire());
        assert_eq!(a.base64(), b.base64());
    }

    #[test]
    fn round_trip_within_one_tick() {
        let seq = TimingSequence::new(38_000, vec![9000, 4500, 560, 560, 560, 1690, 560, 39000]);
        let cmd = encode(&seq).expect("encode");
        let back = decode(cmd.wire()).expect("decode");
        assert_eq!(back.durations.len(), seq.durations.len());
        assert_eq!(back.repeat, seq.repeat);
        for (a, b) in seq.durations.iter().zip(back.durations.iter()) {
            assert!(
                a.abs_diff(*b) <= TICK_US,
                "{} us came back as {} us",
                a,
                b
            );
        }
    }

    #[test]
    fn repeat_byte_survives() {
        let mut seq = TimingSequence::new(38_000, vec![9000, 4500]);
        seq.repeat = 3;
        let cmd = encode(&seq).expect("encode");
        assert_eq!(cmd.wire()[1], 3);
        assert_eq!(decode(cmd.wire()).expect("decode").repeat, 3);
    }

    #[test]
    fn rejects_repeat_above_byte() {
        let mut seq = TimingSequence::new(38_000, vec![9000, 4500]);
        seq.repeat = 256;
        let err = encode(&seq).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_sub_tick_pulse() {
        // 10 us rounds to zero ticks, which would collide with the escape
        // marker.
        let seq = TimingSequence::new(38_000, vec![10, 4500]);
        let err = encode(&seq).unwrap_err();
        assert!(matches!(err, ConvertError::ValueOutOfRange(_)));
    }

    #[test]
    fn rejects_empty_sequence() {
        let seq = TimingSequence::new(38_000, vec![]);
        let err = encode(&seq).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn padding_aligns_transport_frame() {
        for n in [2usize, 6, 20, 68] {
            let seq = TimingSequence::new(38_000, vec![560; n]);
            let cmd = encode(&seq).expect("encode");
            assert_eq!((cmd.wire().len() + SEND_HEADER_LEN) % AES_BLOCK, 0);
        }
    }

    #[test]
    fn decode_rejects_bad_header() {
        let err = decode(&[0x27, 0x00, 0x01, 0x00, 0x10, 0x0D, 0x05]).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn decode_rejects_rf_headers() {
        for h in [0xB2u8, 0xD7] {
            let err = decode(&[h, 0x00, 0x01, 0x00, 0x10, 0x0D, 0x05]).unwrap_err();
            assert!(matches!(err, ConvertError::UnsupportedProtocol(_)));
        }
    }

    #[test]
    fn decode_rejects_overlong_length() {
        let err = decode(&[0x26, 0x00, 0xFF, 0x00, 0x10, 0x0D, 0x05]).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn decode_rejects_truncated_escape() {
        // Length says two bytes but the escape needs three.
        let err = decode(&[0x26, 0x00, 0x02, 0x00, 0x00, 0x01, 0x0D, 0x05]).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn decode_rejects_missing_terminator() {
        let err = decode(&[0x26, 0x00, 0x02, 0x00, 0x10, 0x10, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn base64_round_trip() {
        let seq = TimingSequence::new(38_000, vec![9000, 4500, 560, 560]);
        let cmd = encode(&seq).expect("encode");
        let back = decode_base64(cmd.base64()).expect("decode_base64");
        assert_eq!(back.durations.len(), 4);
    }

    #[test]
    fn unwrap_rejects_bad_base64() {
        let err = unwrap_base64("not//valid!!base64===").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }
}
