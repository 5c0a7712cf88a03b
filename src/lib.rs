//! # ircodec — IR remote code conversion engine
//!
//! Converts IR remote codes from heterogeneous source formats (Pronto hex
//! and Flipper Zero `.ir` raw signals) into the Broadlink wire format,
//! base64-wrapped for JSON transport, folds named commands into device
//! descriptors, and validates the result structurally.
//!
//! ## Pipeline
//!
//! ```text
//! source text/pulses -> parser -> TimingSequence -> broadlink::encode
//!   -> EncodedCommand -> assemble_device -> DeviceDescriptor -> validate
//! ```
//!
//! ## Wire format
//!
//! `0x26` IR header, repeat byte, little-endian u16 stream length, one byte
//! per ~32.84 us tick value (`0x00` + big-endian u16 above 255), `0x0D 0x05`
//! terminator, zero padding to the transport AES block.
//!
//! ## Errors
//!
//! Every fallible operation returns [`ConvertError`], a closed set of three
//! kinds (malformed input, unsupported protocol, value out of range) so
//! batch callers can aggregate per command instead of unwinding. The engine
//! is pure: no I/O, no logging, no shared state. Conversions for different
//! devices can run in parallel freely.
//!
//! ## Usage
//!
//! ```
//! use ircodec::{encode, parse_pronto};
//!
//! let seq = parse_pronto("0000 006D 0001 0000 0157 00AC").unwrap();
//! let cmd = encode(&seq).unwrap();
//! assert!(cmd.base64().starts_with("Jg"));
//! ```

pub mod broadlink;
pub mod device;
pub mod flipper;
pub mod pronto;
pub mod timing;
pub mod validate;

pub use broadlink::{decode, decode_base64, encode, EncodedCommand};
pub use device::{
    assemble_device, assemble_ir_file, canonical_command_name, AssembleOutcome, CommandFailure,
    CommandSource, DeviceDescriptor,
};
pub use flipper::{parse_ir_file, parse_raw_pulses, CarrierTable, IrFile, IrSignal};
pub use pronto::parse_pronto;
pub use timing::{ConvertError, TimingSequence};
pub use validate::{validate, CheckRule, Severity, ValidationReport, Violation};
