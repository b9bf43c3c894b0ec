#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    // Inspection is bounded and the cleaned form always encodes
    let inspected = jlog::inspect(&value);
    let cleaned = jlog::inspect::cleanup::clean(&inspected);
    assert!(serde_json::to_string(&cleaned).is_ok());
});
