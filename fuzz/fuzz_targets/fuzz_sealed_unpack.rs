#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Limit input size to avoid slow runs on pathological inputs
    if data.len() > 64 * 1024 {
        return;
    }
    // Arbitrary bytes as a sealed body (authentication should reject them)
    let _ = sealed_payload::unpack(data, Some("0123456789abcdef"));
    // Arbitrary bytes as a plain error body
    let _ = sealed_payload::unpack(data, None);
});
