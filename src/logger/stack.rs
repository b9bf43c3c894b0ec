//! Filtered backtraces attached to ERROR and CRITICAL records.

use crate::inspect::{ArrayVal, InspectableValue, StructVal};
use crate::record::STACK_TRACE_TYPE;
use regex::Regex;
use std::backtrace::Backtrace;
use std::sync::LazyLock;

static FRAME_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+:\s+(.+)$").expect("Invalid frame regex"));
static FRAME_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+at\s+(.+)$").expect("Invalid location regex"));

/// Symbols belonging to this crate or to the unwinding machinery itself.
static INTERNAL_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^<?(?:{}::|std::backtrace|std::sys::backtrace|std::backtrace_rs)",
        env!("CARGO_CRATE_NAME")
    ))
    .expect("Invalid internal frame regex")
});

/// Snapshot of the caller's stack as a `StackTrace { frames }` value.
pub(super) fn capture() -> InspectableValue {
    let frames = parse_frames(&Backtrace::force_capture().to_string());
    InspectableValue::Struct(StructVal {
        type_label: STACK_TRACE_TYPE,
        error_string: None,
        stringer_output: None,
        fields: vec![(
            "frames",
            InspectableValue::Array(ArrayVal {
                element_type: "String",
                true_length: frames.len(),
                is_truncated: false,
                elements: frames.into_iter().map(InspectableValue::text).collect(),
            }),
        )],
    })
}

/// `symbol (file:line:col)` per frame, internal frames dropped.
pub(super) fn parse_frames(rendered: &str) -> Vec<String> {
    let mut frames: Vec<(String, Option<String>)> = Vec::new();
    for line in rendered.lines() {
        if let Some(location) = FRAME_LOCATION.captures(line)
            && let Some(last) = frames.last_mut()
            && last.1.is_none()
        {
            last.1 = Some(location[1].trim().to_string());
        } else if let Some(symbol) = FRAME_SYMBOL.captures(line) {
            frames.push((symbol[1].trim().to_string(), None));
        }
    }
    frames
        .into_iter()
        .filter(|(symbol, _)| !INTERNAL_FRAME.is_match(symbol))
        .map(|(symbol, location)| match location {
            Some(location) => format!("{symbol} ({location})"),
            None => symbol,
        })
        .collect()
}
