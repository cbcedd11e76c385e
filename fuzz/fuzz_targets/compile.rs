#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(schema) = serde_json::from_slice(data) {
        let _ = jsv::Validator::from_value(schema, jsv::ValidatorOptions::new());
    }
});
