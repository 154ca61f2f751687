#![no_main]

use libfuzzer_sys::fuzz_target;
use sealed_payload::codec;

fuzz_target!(|data: &[u8]| {
    // Don't panic on invalid input - errors are expected
    if let Ok(value) = codec::deserialize(data) {
        // Anything that decodes must serialize back and re-encode
        codec::serialize(&value).expect("decoded value must serialize");
        codec::reencode(value).expect("decoded value must re-encode");
    }
});
