//! Human-readable rendering of a record.
//!
//! `<time> <LEVEL> app:<name> [(log-id:..)] [(log-num:..)] <args...>`

use super::TimeDisplay;
use super::color::{BOLD, Color, ITALIC, colorize, level_badge, styled};
use crate::inspect::cleanup::{clean, placeholder};
use crate::inspect::{InspectableValue, Primitive, StructVal};
use crate::level::Level;
use crate::record::{LOG_ID_KEY, LOG_NUM_KEY, LogRecord, STACK_TRACE_TYPE, short_id};
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::LazyLock;

static MODULE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[a-z_][a-z0-9_]*::)+").expect("Invalid module path regex")
});

/// `alloc::vec::Vec<core::option::Option<i32>>` becomes `Vec<Option<i32>>`.
#[must_use]
pub fn short_type_name(full: &str) -> Cow<'_, str> {
    MODULE_PATH.replace_all(full, "")
}

/// One pretty line, without the trailing newline.
#[must_use]
pub fn render_line(record: &LogRecord, colors: bool, time: TimeDisplay) -> String {
    let paint = |text: &str, color: Color| {
        if colors {
            colorize(text, color)
        } else {
            text.to_string()
        }
    };
    let attr = |text: &str, attributes: &[&str]| {
        if colors {
            styled(text, attributes)
        } else {
            text.to_string()
        }
    };

    let mut line = String::with_capacity(128);
    line.push_str(&paint(time.clock(record.timestamp).as_str(), Color::gray(9)));
    line.push(' ');
    if colors {
        line.push_str(&level_badge(record.level));
    } else {
        line.push_str(record.level.label());
    }
    line.push(' ');
    line.push_str(&paint("app:", Color::gray(12)));
    line.push_str(&attr(&*record.app_name, &[ITALIC]));

    if let Some(id) = record.meta.get(LOG_ID_KEY) {
        let id = id.as_text().map_or_else(|| render_value(id, true), |s| short_id(s).to_string());
        let _ = write!(line, " ({}{id})", attr("log-id:", &[BOLD]));
    }
    if let Some(num) = record.meta.get(LOG_NUM_KEY) {
        let _ = write!(line, " ({}{})", attr("log-num:", &[BOLD]), render_value(num, false));
    }

    let verbose = matches!(record.level, Level::Trace | Level::Debug);
    for arg in &record.args {
        line.push(' ');
        line.push_str(&render_value(arg, false));
        if verbose && is_composite(arg) && !is_stack_trace(arg) {
            let _ = write!(line, "\njson:{}", clean(arg));
        }
    }
    line
}

/// Renders one inspected value. Top-level text is written bare, nested text quoted.
#[must_use]
pub fn render_value(value: &InspectableValue, nested: bool) -> String {
    match value {
        InspectableValue::Nil => "nil".to_string(),
        InspectableValue::Primitive(Primitive::Text(s)) if !nested => s.clone(),
        InspectableValue::Primitive(primitive) => render_primitive(primitive),
        InspectableValue::Array(array) => {
            let mut items: Vec<String> = array
                .elements
                .iter()
                .map(|item| render_value(item, true))
                .collect();
            if array.is_truncated {
                let hidden = array.true_length.saturating_sub(array.elements.len());
                items.push(format!("(+{hidden} more)"));
            }
            format!("[{}]", items.join(", "))
        }
        InspectableValue::Map(map) => {
            let mut items: Vec<String> = map
                .entries
                .iter()
                .map(|(key, item)| format!("{key}: {}", render_value(item, true)))
                .collect();
            if map.is_truncated {
                let hidden = map.true_key_count.saturating_sub(map.entries.len());
                items.push(format!("(+{hidden} more)"));
            }
            format!("{{{}}}", items.join(", "))
        }
        InspectableValue::Struct(value) if value.type_label == STACK_TRACE_TYPE => {
            render_stack(value)
        }
        InspectableValue::Struct(value) => render_struct(value),
        InspectableValue::Opaque(value) => placeholder(value),
    }
}

fn render_primitive(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Bool(b) => b.to_string(),
        Primitive::Int(i) => i.to_string(),
        Primitive::Uint(u) => u.to_string(),
        Primitive::Float(f) => f.to_string(),
        Primitive::Text(s) => format!("{s:?}"),
    }
}

fn render_struct(value: &StructVal) -> String {
    let mut parts = Vec::with_capacity(value.fields.len() + 2);
    if let Some(error) = &value.error_string {
        parts.push(format!("@error: {error:?}"));
    }
    if let Some(display) = &value.stringer_output {
        parts.push(format!("@display: {display:?}"));
    }
    for (name, field) in &value.fields {
        parts.push(format!("{name}: {}", render_value(field, true)));
    }
    let name = short_type_name(value.type_label);
    if parts.is_empty() {
        name.into_owned()
    } else {
        format!("{name} {{ {} }}", parts.join(", "))
    }
}

fn render_stack(value: &StructVal) -> String {
    let mut out = String::from("StackTrace:");
    if let Some(InspectableValue::Array(frames)) = value.field("frames") {
        for frame in &frames.elements {
            out.push_str("\n    at ");
            out.push_str(&render_value(frame, false));
        }
    }
    out
}

const fn is_composite(value: &InspectableValue) -> bool {
    matches!(
        value,
        InspectableValue::Array(_) | InspectableValue::Map(_) | InspectableValue::Struct(_)
    )
}

fn is_stack_trace(value: &InspectableValue) -> bool {
    value
        .as_struct()
        .is_some_and(|s| s.type_label == STACK_TRACE_TYPE)
}
