#![no_main]
use libfuzzer_sys::fuzz_target;

use serde_json;

fuzz_target!(|schema_and_instance: (Vec<u8>, Vec<u8>, bool)| {
    let (schema, instance, greedy) = schema_and_instance;

    // We're only interested in fuzzing against schemas that compile.
    let schema = match serde_json::from_slice(&schema) {
        Ok(schema) => schema,
        Err(_) => return,
    };

    let options = jsv::ValidatorOptions::new()
        .with_greedy(greedy)
        .with_verbose(true);

    let validator = match jsv::Validator::from_value(schema, options) {
        Ok(validator) => validator,
        Err(_) => return,
    };

    if let Ok(instance) = serde_json::from_slice(&instance) {
        let result = validator.validate(&instance);
        assert_eq!(result.valid, result.errors.is_empty());
    }
});
