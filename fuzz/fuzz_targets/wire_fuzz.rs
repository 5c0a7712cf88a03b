//! Wire decoder fuzz target: feed arbitrary bytes to the Broadlink decoder.
//! It must not panic on truncated streams, bad lengths, or broken escapes.
//! Build with: cargo fuzz run wire_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let _ = ircodec::decode(data);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run wire_fuzz");
}
