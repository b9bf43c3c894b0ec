//! Host name and process id, resolved once.

use std::sync::OnceLock;

const UNKNOWN_HOST: &str = "<unknown_hostname>";

static HOST_NAME: OnceLock<String> = OnceLock::new();

/// `HOSTNAME`, then the kernel's host name file, then a placeholder.
pub fn host_name() -> &'static str {
    HOST_NAME.get_or_init(|| {
        std::env::var("HOSTNAME")
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(|| read_trimmed("/proc/sys/kernel/hostname"))
            .or_else(|| read_trimmed("/etc/hostname"))
            .unwrap_or_else(|| UNKNOWN_HOST.to_string())
    })
}

fn read_trimmed(path: &str) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| content.trim().to_string())
        .filter(|name| !name.is_empty())
}

#[must_use]
pub fn pid() -> u32 {
    std::process::id()
}
