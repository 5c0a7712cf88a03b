//! Pronto parser fuzz target: feed arbitrary bytes to the parser.
//! It must not panic; it returns Ok(TimingSequence) or a ConvertError.
//! Build with: cargo fuzz run pronto_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let _ = ircodec::parse_pronto(s);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run pronto_fuzz");
}
