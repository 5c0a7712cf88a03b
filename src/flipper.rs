//! Flipper Zero `.ir` signal files and raw pulse arrays.
//!
//! The container is a line-oriented `key: value` format:
//!
//! ```text
//! Filetype: IR signals file
//! Version: 1
//! #
//! name: Power
//! type: raw
//! frequency: 38000
//! duty_cycle: 0.330000
//! data: 9024 4512 564 1692 564
//! ```
//!
//! `raw` signals carry their own carrier frequency and a mark-first pulse
//! array. `parsed` signals name a protocol (NEC, NECext, ...) instead of
//! timings; converting one fails with
//! [`ConvertError::UnsupportedProtocol`] since this engine never
//! synthesizes timings from protocol parameters.

use crate::timing::{
    ConvertError, TimingSequence, MAX_CARRIER_HZ, MAX_DURATION_US, MIN_CARRIER_HZ,
    MIN_DURATION_US,
};
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::collections::HashMap;

#[derive(PestParser)]
#[grammar = "flipper.pest"]
struct IrFileParser;

/// Carrier frequency Flipper assumes when a raw record omits `frequency:`.
pub const DEFAULT_CARRIER_HZ: u32 = 38_000;

const DEFAULT_DUTY_CYCLE: f32 = 0.33;

/// A parsed `.ir` container: format version plus the signal records.
#[derive(Debug, Clone, PartialEq)]
pub struct IrFile {
    pub version: u32,
    pub signals: Vec<IrSignal>,
}

/// One named signal record.
#[derive(Debug, Clone, PartialEq)]
pub enum IrSignal {
    /// Raw timing data, microseconds, mark first.
    Raw {
        name: String,
        frequency_hz: u32,
        duty_cycle: f32,
        data: Vec<i32>,
    },
    /// Protocol-encoded button; address/command are opaque hex strings.
    Parsed {
        name: String,
        protocol: String,
        address: String,
        command: String,
    },
}

impl IrSignal {
    pub fn name(&self) -> &str {
        match self {
            IrSignal::Raw { name, .. } => name,
            IrSignal::Parsed { name, .. } => name,
        }
    }

    /// Convert to the canonical timing model. Parsed signals are rejected:
    /// turning protocol parameters into pulses needs a protocol encoder.
    pub fn to_timing(&self) -> Result<TimingSequence, ConvertError> {
        match self {
            IrSignal::Raw {
                frequency_hz, data, ..
            } => parse_raw_pulses(data, *frequency_hz),
            IrSignal::Parsed { protocol, .. } => Err(ConvertError::UnsupportedProtocol(format!(
                "{} signal requires a protocol encoder",
                protocol
            ))),
        }
    }
}

/// Parse the text of a Flipper `.ir` file.
pub fn parse_ir_file(source: &str) -> Result<IrFile, ConvertError> {
    let mut pairs = IrFileParser::parse(Rule::file, source)
        .map_err(|e| ConvertError::MalformedInput(format!("ir file: {}", e)))?;
    let file = pairs
        .next()
        .ok_or_else(|| ConvertError::MalformedInput("empty ir file".to_string()))?;

    let mut filetype: Option<String> = None;
    let mut version: Option<u32> = None;
    let mut signals = Vec::new();
    let mut current: Option<RecordBuilder> = None;

    for pair in file.into_inner() {
        if pair.as_rule() != Rule::pair {
            continue;
        }
        let mut inner = pair.into_inner();
        let key = inner
            .next()
            .ok_or_else(|| ConvertError::MalformedInput("line without key".to_string()))?
            .as_str()
            .to_string();
        let value = inner.next().map(|p| p.as_str().trim()).unwrap_or("").to_string();

        match key.as_str() {
            "Filetype" => filetype = Some(value),
            "Version" => {
                version = Some(value.parse().map_err(|_| {
                    ConvertError::MalformedInput(format!("bad version {:?}", value))
                })?)
            }
            "name" => {
                if let Some(builder) = current.take() {
                    signals.push(builder.finish()?);
                }
                current = Some(RecordBuilder::new(value));
            }
            _ => {
                let builder = current.as_mut().ok_or_else(|| {
                    ConvertError::MalformedInput(format!("{}: before any name:", key))
                })?;
                builder.fields.insert(key, value);
            }
        }
    }
    if let Some(builder) = current.take() {
        signals.push(builder.finish()?);
    }

    match filetype.as_deref() {
        Some("IR signals file") | Some("IR library file") => {}
        Some(other) => {
            return Err(ConvertError::MalformedInput(format!(
                "not an IR signal file: Filetype {:?}",
                other
            )))
        }
        None => {
            return Err(ConvertError::MalformedInput(
                "missing Filetype header".to_string(),
            ))
        }
    }
    let version = version
        .ok_or_else(|| ConvertError::MalformedInput("missing Version header".to_string()))?;

    Ok(IrFile { version, signals })
}

struct RecordBuilder {
    name: String,
    fields: HashMap<String, String>,
}

impl RecordBuilder {
    fn new(name: String) -> Self {
        RecordBuilder {
            name,
            fields: HashMap::new(),
        }
    }

    fn finish(mut self) -> Result<IrSignal, ConvertError> {
        let kind = self
            .fields
            .remove("type")
            .ok_or_else(|| ConvertError::MalformedInput(format!("{}: missing type:", self.name)))?;
        match kind.as_str() {
            "raw" => {
                let frequency_hz = match self.fields.remove("frequency") {
                    Some(v) => v.parse().map_err(|_| {
                        ConvertError::MalformedInput(format!("{}: bad frequency {:?}", self.name, v))
                    })?,
                    None => DEFAULT_CARRIER_HZ,
                };
                let duty_cycle = match self.fields.remove("duty_cycle") {
                    Some(v) => v.parse().map_err(|_| {
                        ConvertError::MalformedInput(format!(
                            "{}: bad duty_cycle {:?}",
                            self.name, v
                        ))
                    })?,
                    None => DEFAULT_DUTY_CYCLE,
                };
                let data_str = self.fields.remove("data").ok_or_else(|| {
                    ConvertError::MalformedInput(format!("{}: raw signal without data:", self.name))
                })?;
                let mut data = Vec::new();
                for token in data_str.split_whitespace() {
                    let v: i32 = token.parse().map_err(|_| {
                        ConvertError::MalformedInput(format!(
                            "{}: bad raw duration {:?}",
                            self.name, token
                        ))
                    })?;
                    data.push(v);
                }
                if data.is_empty() {
                    return Err(ConvertError::MalformedInput(format!(
                        "{}: empty data line",
                        self.name
                    )));
                }
                Ok(IrSignal::Raw {
                    name: self.name,
                    frequency_hz,
                    duty_cycle,
                    data,
                })
            }
            "parsed" => {
                let protocol = self.fields.remove("protocol").ok_or_else(|| {
                    ConvertError::MalformedInput(format!(
                        "{}: parsed signal without protocol:",
                        self.name
                    ))
                })?;
                Ok(IrSignal::Parsed {
                    name: self.name,
                    protocol,
                    address: self.fields.remove("address").unwrap_or_default(),
                    command: self.fields.remove("command").unwrap_or_default(),
                })
            }
            other => Err(ConvertError::MalformedInput(format!(
                "{}: unknown signal type {:?}",
                self.name, other
            ))),
        }
    }
}

/// Normalize a raw pulse array into the canonical timing model.
///
/// Two sign conventions are accepted: all non-negative values with implicit
/// mark-first alternation (Flipper), or signed values where positive is mark
/// and negative is space (LIRC-style dumps), which must strictly alternate
/// starting with a mark. An odd count is fine: raw signals legitimately end
/// on a mark. The carrier is caller-resolved (see [`CarrierTable`]); this
/// function never infers it from the pulses.
pub fn parse_raw_pulses(pulses: &[i32], carrier_hz: u32) -> Result<TimingSequence, ConvertError> {
    if pulses.len() < 2 {
        return Err(ConvertError::MalformedInput(format!(
            "need at least one mark/space pair, got {} pulse(s)",
            pulses.len()
        )));
    }
    if carrier_hz != 0 && !(MIN_CARRIER_HZ..=MAX_CARRIER_HZ).contains(&carrier_hz) {
        return Err(ConvertError::MalformedInput(format!(
            "carrier {} Hz outside the IR band",
            carrier_hz
        )));
    }

    let signed = pulses.iter().any(|&p| p < 0);
    let mut durations = Vec::with_capacity(pulses.len());
    for (i, &pulse) in pulses.iter().enumerate() {
        if signed {
            let expect_mark = i % 2 == 0;
            if expect_mark != (pulse > 0) {
                return Err(ConvertError::MalformedInput(format!(
                    "pulse {}: sign does not alternate mark/space",
                    i
                )));
            }
        }
        let us = pulse.unsigned_abs();
        if !(MIN_DURATION_US..=MAX_DURATION_US).contains(&us) {
            return Err(ConvertError::MalformedInput(format!(
                "pulse {}: {} us out of range",
                i, us
            )));
        }
        durations.push(us);
    }

    Ok(TimingSequence::new(carrier_hz, durations))
}

/// Protocol tag to carrier frequency, supplied by callers converting tagged
/// pulse arrays. Protocol knowledge lives outside the engine; parsers only
/// consume the resolved frequency.
#[derive(Debug, Clone, Default)]
pub struct CarrierTable {
    entries: HashMap<String, u32>,
}

impl CarrierTable {
    pub fn new() -> Self {
        CarrierTable::default()
    }

    /// Common IR protocol carriers.
    pub fn default_ir() -> Self {
        let mut table = CarrierTable::new();
        for (tag, hz) in [
            ("raw", DEFAULT_CARRIER_HZ),
            ("NEC", 38_000),
            ("NECext", 38_000),
            ("Samsung32", 37_900),
            ("SIRC", 40_000),
            ("SIRC15", 40_000),
            ("SIRC20", 40_000),
            ("RC5", 36_000),
            ("RC5X", 36_000),
            ("RC6", 36_000),
            ("Kaseikyo", 37_000),
        ] {
            table.insert(tag, hz);
        }
        table
    }

    pub fn insert(&mut self, tag: impl Into<String>, carrier_hz: u32) {
        self.entries.insert(tag.into(), carrier_hz);
    }

    pub fn resolve(&self, tag: &str) -> Option<u32> {
        self.entries.get(tag).copied()
    }
}
