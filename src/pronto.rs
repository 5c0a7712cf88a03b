//! Pronto hex parser: 4-digit hex groups into a [`TimingSequence`].
//!
//! Only the raw encodings are handled: `0000` (learned, unmodulated
//! reference) and `0100` (raw with carrier). Protocol-defined Pronto types
//! carry parameters instead of timings and would need a protocol encoder,
//! so they are rejected as [`ConvertError::UnsupportedProtocol`].

use crate::timing::{
    ConvertError, TimingSequence, MAX_CARRIER_HZ, MAX_DURATION_US, MIN_CARRIER_HZ,
    MIN_DURATION_US,
};

/// One Pronto time unit is `reference * 0.241246` microseconds; the factor
/// comes from the Pronto learner clock and fixes the carrier period.
const PRONTO_PERIOD_FACTOR: f64 = 0.241246;

const TYPE_RAW_LEARNED: u16 = 0x0000;
const TYPE_RAW_CARRIER: u16 = 0x0100;

/// Minimum group count: type, carrier reference, once count, repeat count.
const PREAMBLE_GROUPS: usize = 4;

/// Parse a Pronto hex string into the canonical timing model.
///
/// The once sequence and the repeat fragment are concatenated into one
/// stream, matching what learned codes transmit; `repeat` stays 0.
pub fn parse_pronto(source: &str) -> Result<TimingSequence, ConvertError> {
    let groups = split_groups(source)?;
    if groups.len() < PREAMBLE_GROUPS {
        return Err(ConvertError::MalformedInput(format!(
            "pronto preamble needs {} groups, got {}",
            PREAMBLE_GROUPS,
            groups.len()
        )));
    }

    match groups[0] {
        TYPE_RAW_LEARNED | TYPE_RAW_CARRIER => {}
        other => {
            return Err(ConvertError::UnsupportedProtocol(format!(
                "pronto type {:04X} requires a protocol encoder",
                other
            )))
        }
    }

    let reference = groups[1];
    if reference == 0 {
        return Err(ConvertError::MalformedInput(
            "zero carrier reference".to_string(),
        ));
    }
    let period_us = reference as f64 * PRONTO_PERIOD_FACTOR;
    let carrier_hz = (1_000_000.0 / period_us).round() as u32;
    if !(MIN_CARRIER_HZ..=MAX_CARRIER_HZ).contains(&carrier_hz) {
        return Err(ConvertError::MalformedInput(format!(
            "carrier {} Hz outside the IR band",
            carrier_hz
        )));
    }

    let once_pairs = groups[2] as usize;
    let repeat_pairs = groups[3] as usize;
    if once_pairs + repeat_pairs == 0 {
        return Err(ConvertError::MalformedInput(
            "both burst-pair counts are zero".to_string(),
        ));
    }
    let expected = 2 * (once_pairs + repeat_pairs);
    let data = &groups[PREAMBLE_GROUPS..];
    if data.len() != expected {
        return Err(ConvertError::MalformedInput(format!(
            "expected {} timing groups, got {}",
            expected,
            data.len()
        )));
    }

    let mut durations = Vec::with_capacity(expected);
    for (i, &units) in data.iter().enumerate() {
        let us = (units as f64 * period_us).round() as u32;
        if !(MIN_DURATION_US..=MAX_DURATION_US).contains(&us) {
            return Err(ConvertError::MalformedInput(format!(
                "group {}: duration {} us out of range",
                PREAMBLE_GROUPS + i,
                us
            )));
        }
        durations.push(us);
    }

    Ok(TimingSequence::new(carrier_hz, durations))
}

/// Split into 4-hex-digit groups. Anything else in the string is malformed.
fn split_groups(source: &str) -> Result<Vec<u16>, ConvertError> {
    let mut groups = Vec::new();
    for token in source.split_whitespace() {
        if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConvertError::MalformedInput(format!(
                "bad pronto group {:?}",
                token
            )));
        }
        let value = u16::from_str_radix(token, 16)
            .map_err(|_| ConvertError::MalformedInput(format!("bad pronto group {:?}", token)))?;
        groups.push(value);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_raw_code() {
        // One burst pair at a 38 kHz-ish carrier (reference 0x6D).
        let seq = parse_pronto("0000 006D 0001 0000 0157 00AC").expect("parse");
        assert_eq!(seq.durations.len(), 2);
        assert_eq!(seq.repeat, 0);
        assert!(seq.is_well_formed());
        // 0x157 units at a 26.3 us period is the classic 9 ms lead mark.
        assert!((9000..=9050).contains(&seq.durations[0]));
    }

    #[test]
    fn accepts_raw_with_carrier_type() {
        let seq = parse_pronto("0100 006D 0001 0000 0157 00AC").expect("parse");
        assert_eq!(seq.durations.len(), 2);
    }

    #[test]
    fn rejects_protocol_defined_type() {
        let err = parse_pronto("5000 006D 0001 0000 0157 00AC").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedProtocol(_)));
    }

    #[test]
    fn rejects_zero_reference() {
        let err = parse_pronto("0000 0000 0001 0000 0157 00AC").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_short_preamble() {
        let err = parse_pronto("0000 006D 0001").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_truncated_data() {
        // Preamble promises one pair but only one group follows.
        let err = parse_pronto("0000 006D 0001 0000 0157").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_excess_data() {
        let err = parse_pronto("0000 006D 0001 0000 0157 00AC 0015").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_non_hex_group() {
        let err = parse_pronto("0000 006D 0001 0000 01X7 00AC").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_wrong_width_group() {
        let err = parse_pronto("0000 6D 0001 0000 0157 00AC").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_zero_unit_duration() {
        let err = parse_pronto("0000 006D 0001 0000 0000 00AC").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn rejects_both_counts_zero() {
        let err = parse_pronto("0000 006D 0000 0000").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn lowercase_hex_is_fine() {
        let seq = parse_pronto("0000 006d 0001 0000 0157 00ac").expect("parse");
        assert_eq!(seq.durations.len(), 2);
    }

    #[test]
    fn repeat_fragment_is_appended() {
        let seq =
            parse_pronto("0000 006D 0001 0001 0157 00AC 0157 0055").expect("parse");
        assert_eq!(seq.durations.len(), 4);
        assert_eq!(seq.repeat, 0);
    }
}
