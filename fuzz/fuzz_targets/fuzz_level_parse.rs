#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(level) = data.parse::<jlog::Level>() {
        assert_eq!(level.as_str().parse::<jlog::Level>().ok(), Some(level));
    }
    let _ = data.parse::<jlog::Format>();
    let _ = data.parse::<jlog::TimeDisplay>();
});
