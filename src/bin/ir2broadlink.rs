//! Convert IR codes to Broadlink base64.
//!
//! Usage:
//!   ir2broadlink --pronto "0000 006D 0022 0002 0157 00AC ..."
//!   ir2broadlink [--manufacturer NAME] [--model NAME] [--require CMD ...] FILE.ir
//!
//! With --pronto, prints the base64 code and exits. With a Flipper .ir file,
//! assembles a device descriptor, validates it (required commands default to
//! "power"), and prints the descriptor JSON to stdout; per-command failures
//! and validation findings go to stderr. Exit code 1 when no command
//! converts or validation fails.

use ircodec::{assemble_ir_file, encode, parse_ir_file, parse_pronto, validate, Severity};
use std::path::Path;

fn take_value(args: &mut Vec<String>, flag: &str) -> anyhow::Result<Option<String>> {
    if let Some(pos) = args.iter().position(|a| a == flag) {
        args.remove(pos);
        if pos < args.len() {
            Ok(Some(args.remove(pos)))
        } else {
            anyhow::bail!("{} needs a value", flag);
        }
    } else {
        Ok(None)
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if let Some(code) = take_value(&mut args, "--pronto")? {
        let seq = parse_pronto(&code)?;
        let cmd = encode(&seq)?;
        println!("{}", cmd.base64());
        return Ok(());
    }

    let manufacturer = take_value(&mut args, "--manufacturer")?;
    let model = take_value(&mut args, "--model")?;
    let mut required = Vec::new();
    while let Some(cmd) = take_value(&mut args, "--require")? {
        required.push(cmd);
    }
    if required.is_empty() {
        required.push("power".to_string());
    }

    let path = match args.first() {
        Some(p) => p.clone(),
        None => anyhow::bail!(
            "usage: ir2broadlink --pronto \"<hex>\" | ir2broadlink [--manufacturer NAME] [--model NAME] [--require CMD ...] FILE.ir"
        ),
    };
    let source = std::fs::read_to_string(&path)?;
    let file = parse_ir_file(&source)?;

    let stem = Path::new(&path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string());
    let manufacturer = manufacturer.unwrap_or_else(|| "Unknown".to_string());
    let model = model.unwrap_or(stem);

    let outcome = assemble_ir_file(&file, &manufacturer, &[model]);
    for failure in &outcome.failures {
        eprintln!("{}: {}: {}", path, failure.command, failure.error);
    }
    let descriptor = match outcome.descriptor {
        Some(d) => d,
        None => {
            eprintln!("{}: no command converted", path);
            std::process::exit(1);
        }
    };

    let required_refs: Vec<&str> = required.iter().map(String::as_str).collect();
    let report = validate(&descriptor, &required_refs);
    for violation in &report.violations {
        let severity = match violation.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("{}: {}: {}", path, severity, violation.message);
    }

    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}
