//! Structural validation of device descriptors.
//!
//! Produces pass/fail plus a list of specific violations; the caller decides
//! whether to discard or quarantine the descriptor. Nothing here panics on
//! hostile input, and nothing escapes past the report.
//!
//! A missing required command is a warning, not an error: the required-key
//! set is category policy supplied by the caller, and a device that lacks
//! `power` may still be worth keeping.

use crate::broadlink;
use crate::device::{DeviceDescriptor, CONTROLLER_BROADLINK, ENCODING_BASE64};

/// Severity of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Identifies which check produced the violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRule {
    /// `manufacturer` must be a non-empty string.
    ManufacturerNonEmpty,
    /// `supportedModels` must contain at least one non-empty model name.
    ModelsNonEmpty,
    /// `supportedController` must be exactly "Broadlink".
    ControllerIsBroadlink,
    /// `commandsEncoding` must be exactly "Base64".
    EncodingIsBase64,
    /// The command map must not be empty.
    CommandsNonEmpty,
    /// A caller-required command name is missing.
    RequiredCommand,
    /// A command value is not valid base64.
    CommandBase64,
    /// A command payload fails the wire-format structural checks
    /// (header, length field, terminator).
    CommandWireFormat,
}

/// A single violation with its origin.
#[derive(Debug, Clone)]
pub struct Violation {
    pub rule: CheckRule,
    pub severity: Severity,
    pub message: String,
}

/// Validation result: all violations in check order.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// True when no error-severity violation was recorded. Warnings do not
    /// fail a descriptor.
    pub fn passed(&self) -> bool {
        self.violations
            .iter()
            .all(|v| v.severity != Severity::Error)
    }
}

/// Check a descriptor against the structural invariants. `required_commands`
/// is the caller-supplied required-key set for the device category (e.g.
/// `["power"]` for media players).
pub fn validate(descriptor: &DeviceDescriptor, required_commands: &[&str]) -> ValidationReport {
    let mut violations = Vec::new();

    if descriptor.manufacturer.trim().is_empty() {
        error(
            &mut violations,
            CheckRule::ManufacturerNonEmpty,
            "manufacturer must be non-empty".to_string(),
        );
    }
    if descriptor.supported_models.is_empty() {
        error(
            &mut violations,
            CheckRule::ModelsNonEmpty,
            "supportedModels is empty".to_string(),
        );
    }
    for model in &descriptor.supported_models {
        if model.trim().is_empty() {
            error(
                &mut violations,
                CheckRule::ModelsNonEmpty,
                "supportedModels contains an empty model name".to_string(),
            );
        }
    }
    if descriptor.supported_controller != CONTROLLER_BROADLINK {
        error(
            &mut violations,
            CheckRule::ControllerIsBroadlink,
            format!(
                "supportedController {:?} is not {:?}",
                descriptor.supported_controller, CONTROLLER_BROADLINK
            ),
        );
    }
    if descriptor.commands_encoding != ENCODING_BASE64 {
        error(
            &mut violations,
            CheckRule::EncodingIsBase64,
            format!(
                "commandsEncoding {:?} is not {:?}",
                descriptor.commands_encoding, ENCODING_BASE64
            ),
        );
    }
    if descriptor.commands.is_empty() {
        error(
            &mut violations,
            CheckRule::CommandsNonEmpty,
            "commands map is empty".to_string(),
        );
    }

    for required in required_commands {
        if !descriptor.commands.contains_key(*required) {
            violations.push(Violation {
                rule: CheckRule::RequiredCommand,
                severity: Severity::Warning,
                message: format!("missing recommended command {:?}", required),
            });
        }
    }

    for (name, code) in &descriptor.commands {
        let wire = match broadlink::unwrap_base64(code) {
            Ok(wire) => wire,
            Err(e) => {
                error(
                    &mut violations,
                    CheckRule::CommandBase64,
                    format!("command {:?}: {}", name, e),
                );
                continue;
            }
        };
        if let Err(e) = broadlink::decode(&wire) {
            error(
                &mut violations,
                CheckRule::CommandWireFormat,
                format!("command {:?}: {}", name, e),
            );
        }
    }

    ValidationReport { violations }
}

fn error(violations: &mut Vec<Violation>, rule: CheckRule, message: String) {
    violations.push(Violation {
        rule,
        severity: Severity::Error,
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{assemble_device, CommandSource};

    const POWER_PRONTO: &str = "0000 006D 0001 0000 0157 00AC";

    fn descriptor() -> DeviceDescriptor {
        assemble_device(
            "Acme",
            &["X1".to_string()],
            vec![("Power", CommandSource::Pronto(POWER_PRONTO.to_string()))],
        )
        .descriptor
        .expect("descriptor")
    }

    #[test]
    fn clean_descriptor_passes() {
        let report = validate(&descriptor(), &["power"]);
        assert!(report.passed(), "violations: {:?}", report.violations);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn missing_required_command_is_a_warning() {
        let report = validate(&descriptor(), &["power", "off"]);
        assert!(report.passed());
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule, CheckRule::RequiredCommand);
        assert_eq!(report.violations[0].severity, Severity::Warning);
    }

    #[test]
    fn wrong_controller_fails() {
        let mut desc = descriptor();
        desc.supported_controller = "Xiaomi".to_string();
        let report = validate(&desc, &[]);
        assert!(!report.passed());
        assert!(report
            .violations
            .iter()
            .any(|v| v.rule == CheckRule::ControllerIsBroadlink));
    }

    #[test]
    fn wrong_encoding_fails() {
        let mut desc = descriptor();
        desc.commands_encoding = "Hex".to_string();
        let report = validate(&desc, &[]);
        assert!(!report.passed());
        assert!(report
            .violations
            .iter()
            .any(|v| v.rule == CheckRule::EncodingIsBase64));
    }

    #[test]
    fn empty_manufacturer_fails() {
        let mut desc = descriptor();
        desc.manufacturer = "  ".to_string();
        assert!(!validate(&desc, &[]).passed());
    }

    #[test]
    fn garbage_base64_is_reported_not_thrown() {
        let mut desc = descriptor();
        desc.commands
            .insert("mute".to_string(), "!!!not base64!!!".to_string());
        let report = validate(&desc, &[]);
        assert!(!report.passed());
        assert!(report
            .violations
            .iter()
            .any(|v| v.rule == CheckRule::CommandBase64));
    }

    #[test]
    fn empty_command_value_fails_wire_check() {
        let mut desc = descriptor();
        desc.commands.insert("mute".to_string(), String::new());
        let report = validate(&desc, &[]);
        assert!(!report.passed());
        assert!(report
            .violations
            .iter()
            .any(|v| v.rule == CheckRule::CommandWireFormat));
    }
}
