#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Must not panic on any config content
    let (_, remaining) = jlog::config::extract_sources(data);
    let _ = jlog::Config::from_toml(&remaining);
});
