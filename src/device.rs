//! Device descriptors: fold named source codes through the parsers and the
//! wire encoder into a JSON-ready command map.
//!
//! Assembly never aborts on a bad command: failures accumulate next to the
//! descriptor so batch callers can report them per command. A device with
//! zero successful commands is dropped (`descriptor: None`).

use crate::broadlink;
use crate::flipper::{self, IrFile};
use crate::pronto;
use crate::timing::{ConvertError, TimingSequence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The only controller this engine emits for.
pub const CONTROLLER_BROADLINK: &str = "Broadlink";
/// The only command encoding this engine emits.
pub const ENCODING_BASE64: &str = "Base64";

/// The JSON-serializable record mapping a manufacturer/model to its named
/// command encodings. Assembled by [`assemble_device`]; discarded, not
/// patched, when validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub manufacturer: String,
    pub supported_models: Vec<String>,
    pub supported_controller: String,
    pub commands_encoding: String,
    /// Command name to base64 code. BTreeMap keeps serialization
    /// deterministic.
    pub commands: BTreeMap<String, String>,
}

/// A source-format command body, plus whatever the parser needs.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandSource {
    /// Pronto hex text.
    Pronto(String),
    /// Raw pulse array with a caller-resolved carrier (see
    /// [`flipper::CarrierTable`]).
    Raw { pulses: Vec<i32>, carrier_hz: u32 },
}

impl CommandSource {
    fn to_timing(&self) -> Result<TimingSequence, ConvertError> {
        match self {
            CommandSource::Pronto(text) => pronto::parse_pronto(text),
            CommandSource::Raw { pulses, carrier_hz } => {
                flipper::parse_raw_pulses(pulses, *carrier_hz)
            }
        }
    }
}

/// One command that failed to convert. The device may still be emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    pub command: String,
    pub error: ConvertError,
}

/// Assembly result: the descriptor (when at least one command converted)
/// plus the per-command failures.
#[derive(Debug)]
pub struct AssembleOutcome {
    pub descriptor: Option<DeviceDescriptor>,
    pub failures: Vec<CommandFailure>,
}

/// Fold named source codes into a device descriptor. Command names are
/// normalized via [`canonical_command_name`].
pub fn assemble_device<I, S>(manufacturer: &str, models: &[String], commands: I) -> AssembleOutcome
where
    I: IntoIterator<Item = (S, CommandSource)>,
    S: Into<String>,
{
    fold_commands(
        manufacturer,
        models,
        commands
            .into_iter()
            .map(|(name, source)| (name.into(), source.to_timing())),
    )
}

/// Convert every signal in a Flipper file into a device descriptor.
/// Parsed (protocol-encoded) signals surface as `UnsupportedProtocol`
/// failures rather than being silently skipped.
pub fn assemble_ir_file(file: &IrFile, manufacturer: &str, models: &[String]) -> AssembleOutcome {
    fold_commands(
        manufacturer,
        models,
        file.signals
            .iter()
            .map(|signal| (signal.name().to_string(), signal.to_timing())),
    )
}

fn fold_commands(
    manufacturer: &str,
    models: &[String],
    commands: impl Iterator<Item = (String, Result<TimingSequence, ConvertError>)>,
) -> AssembleOutcome {
    let mut encoded = BTreeMap::new();
    let mut failures = Vec::new();
    for (name, timing) in commands {
        match timing.and_then(|seq| broadlink::encode(&seq)) {
            Ok(cmd) => {
                encoded.insert(canonical_command_name(&name), cmd.into_base64());
            }
            Err(error) => failures.push(CommandFailure {
                command: name,
                error,
            }),
        }
    }
    let descriptor = if encoded.is_empty() {
        None
    } else {
        Some(DeviceDescriptor {
            manufacturer: manufacturer.to_string(),
            supported_models: models.to_vec(),
            supported_controller: CONTROLLER_BROADLINK.to_string(),
            commands_encoding: ENCODING_BASE64.to_string(),
            commands: encoded,
        })
    };
    AssembleOutcome {
        descriptor,
        failures,
    }
}

/// Source button names as they appear in Flipper and IRDB dumps, mapped to
/// the canonical command vocabulary.
const COMMAND_NAME_MAP: &[(&str, &str)] = &[
    ("Power", "power"),
    ("Power On", "turn_on"),
    ("Power Off", "turn_off"),
    ("Vol_up", "volume_up"),
    ("Volume Up", "volume_up"),
    ("Vol_dn", "volume_down"),
    ("Volume Down", "volume_down"),
    ("Mute", "mute"),
    ("Ch_next", "channel_up"),
    ("Channel Up", "channel_up"),
    ("Ch_prev", "channel_down"),
    ("Channel Down", "channel_down"),
    ("Input", "source"),
    ("Source", "source"),
    ("Menu", "menu"),
    ("Up", "up"),
    ("Down", "down"),
    ("Left", "left"),
    ("Right", "right"),
    ("Ok", "select"),
    ("OK", "select"),
    ("Enter", "select"),
    ("Back", "back"),
    ("Exit", "exit"),
    ("Home", "home"),
    ("Play", "play"),
    ("Pause", "pause"),
    ("Stop", "stop"),
    ("Record", "record"),
    ("Rewind", "rewind"),
    ("Fast Forward", "fast_forward"),
    ("Cool", "cool"),
    ("Heat", "heat"),
    ("Auto", "auto"),
    ("Dry", "dry"),
    ("Fan", "fan_only"),
    ("Temp_up", "temp_up"),
    ("Temp Up", "temp_up"),
    ("Temp_dn", "temp_down"),
    ("Temp Down", "temp_down"),
    ("Speed", "fan_speed"),
    ("Fan Speed", "fan_speed"),
    ("Swing", "swing"),
    ("Timer", "timer"),
];

/// Map a source button name to the canonical command name: exact table hit,
/// then a separator/case-insensitive pass, then sanitize (lowercase, spaces
/// and dashes to underscores). Single digits become `num_<d>`.
pub fn canonical_command_name(source: &str) -> String {
    for (from, to) in COMMAND_NAME_MAP {
        if *from == source {
            return (*to).to_string();
        }
    }
    if source.len() == 1 && source.as_bytes()[0].is_ascii_digit() {
        return format!("num_{}", source);
    }
    let sanitized = sanitize(source);
    for (from, to) in COMMAND_NAME_MAP {
        if sanitize(from) == sanitized {
            return (*to).to_string();
        }
    }
    sanitized
}

fn sanitize(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}
