//! Tests for the value inspector and the cleanup fallback.

use jlog::inspect::cleanup::clean;
use jlog::inspect::{OpaqueKind, Primitive};
use jlog::{AsDebug, AsDisplay, InspectableValue, Inspector, Limits, inspect, reflect_struct};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex, mpsc};

struct Node {
    name: String,
    next: RefCell<Option<Rc<Node>>>,
}

reflect_struct!(Node { name, next });

struct Parent {
    label: String,
    me: RefCell<Weak<Parent>>,
}

reflect_struct!(Parent { label, me });

struct Account {
    user: String,
    password: String,
}

reflect_struct!(Account { user } hidden { password });

struct Money {
    cents: i64,
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.cents / 100, self.cents % 100)
    }
}

reflect_struct!(@display Money { cents });

#[derive(Debug)]
struct Timeout {
    after_ms: u64,
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out after {}ms", self.after_ms)
    }
}

impl std::error::Error for Timeout {}

reflect_struct!(@error Timeout { after_ms });

fn opaque_kind(value: &InspectableValue) -> Option<OpaqueKind> {
    value.as_opaque().map(|o| o.kind)
}

#[test]
fn primitives_map_directly() {
    assert_eq!(inspect(&-5_i32), InspectableValue::Primitive(Primitive::Int(-5)));
    assert_eq!(inspect(&7_u8), InspectableValue::Primitive(Primitive::Uint(7)));
    assert_eq!(inspect(&true), InspectableValue::Primitive(Primitive::Bool(true)));
    assert_eq!(inspect(&"hi"), InspectableValue::text("hi"));
    assert_eq!(inspect(&None::<i32>), InspectableValue::Nil);
    assert_eq!(inspect(&Some(Box::new(3_i64))), InspectableValue::Primitive(Primitive::Int(3)));
}

#[test]
fn arrays_cap_at_forty() {
    let items: Vec<u32> = (0..100).collect();
    let InspectableValue::Array(array) = inspect(&items) else {
        panic!("expected array");
    };
    assert_eq!(array.elements.len(), 40);
    assert_eq!(array.true_length, 100);
    assert!(array.is_truncated);
}

#[test]
fn arrays_at_the_cap_are_not_truncated() {
    let items: Vec<u32> = (0..40).collect();
    let InspectableValue::Array(array) = inspect(&items) else {
        panic!("expected array");
    };
    assert_eq!(array.elements.len(), 40);
    assert!(!array.is_truncated);
}

#[test]
fn maps_cap_at_twenty_five_keys() {
    let map: HashMap<String, usize> = (0..30).map(|i| (format!("k{i}"), i)).collect();
    let InspectableValue::Map(rendered) = inspect(&map) else {
        panic!("expected map");
    };
    assert_eq!(rendered.entries.len(), 25);
    assert_eq!(rendered.true_key_count, 30);
    assert!(rendered.is_truncated);
}

#[test]
fn empty_containers_are_not_truncated() {
    let InspectableValue::Array(array) = inspect(&Vec::<i32>::new()) else {
        panic!("expected array");
    };
    assert!(array.elements.is_empty() && !array.is_truncated);

    let InspectableValue::Map(map) = inspect(&BTreeMap::<i32, i32>::new()) else {
        panic!("expected map");
    };
    assert!(map.entries.is_empty() && !map.is_truncated);
}

#[test]
fn map_keys_are_rendered_as_text() {
    let map: BTreeMap<i32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
    let InspectableValue::Map(rendered) = inspect(&map) else {
        panic!("expected map");
    };
    assert_eq!(rendered.entries.get("1"), Some(&InspectableValue::text("one")));
    assert_eq!(rendered.entries.get("2"), Some(&InspectableValue::text("two")));
}

#[test]
fn byte_buffers_decode_as_text() {
    assert_eq!(inspect(&b"hello".to_vec()), InspectableValue::text("hello"));
}

#[test]
fn self_referential_rc_terminates() {
    let node = Rc::new(Node {
        name: "loop".into(),
        next: RefCell::new(None),
    });
    *node.next.borrow_mut() = Some(Rc::clone(&node));

    let result = inspect(&node);
    let root = result.as_struct().unwrap();
    assert_eq!(root.field("name"), Some(&InspectableValue::text("loop")));
    assert_eq!(opaque_kind(root.field("next").unwrap()), Some(OpaqueKind::Circular));

    node.next.borrow_mut().take();
}

#[test]
fn self_referential_weak_terminates() {
    let parent = Rc::new(Parent {
        label: "root".into(),
        me: RefCell::new(Weak::new()),
    });
    *parent.me.borrow_mut() = Rc::downgrade(&parent);

    let result = inspect(&parent);
    let root = result.as_struct().unwrap();
    assert_eq!(opaque_kind(root.field("me").unwrap()), Some(OpaqueKind::Circular));
}

#[test]
fn dropped_weak_is_unavailable() {
    let weak = {
        let strong = Rc::new(5_i32);
        Rc::downgrade(&strong)
    };
    assert_eq!(opaque_kind(&inspect(&weak)), Some(OpaqueKind::Unavailable));
}

#[test]
fn deep_nesting_hits_the_ceiling() {
    let nested = vec![vec![vec![vec![vec![vec![vec![vec![vec![vec![vec![vec![1]]]]]]]]]]]];
    let json = serde_json::to_string(&inspect(&nested)).unwrap();
    assert!(json.contains("depth_exceeded"));
}

#[test]
fn custom_limits_apply() {
    let limits = Limits {
        max_array: 2,
        ..Limits::default()
    };
    let InspectableValue::Array(array) = Inspector::new(limits).inspect(&vec![1, 2, 3]) else {
        panic!("expected array");
    };
    assert_eq!(array.elements.len(), 2);
    assert!(array.is_truncated);
}

#[test]
fn long_pointer_chains_stop() {
    let chain = Some(Some(Some(Some(Some(Some(Some(Some(Some(Some(1_i32))))))))));
    assert_eq!(
        opaque_kind(&inspect(&chain)),
        Some(OpaqueKind::IndirectionExceeded)
    );
}

#[test]
fn hidden_fields_show_only_their_type() {
    let account = Account {
        user: "ada".into(),
        password: "hunter2".into(),
    };
    let result = inspect(&account);
    let value = result.as_struct().unwrap();
    assert_eq!(value.field("user"), Some(&InspectableValue::text("ada")));
    let hidden = value.field("password").and_then(InspectableValue::as_text).unwrap();
    assert!(hidden.starts_with("<hidden:"));
    assert!(!serde_json::to_string(&result).unwrap().contains("hunter2"));
}

#[test]
fn display_and_error_texts_are_kept() {
    let money = inspect(&Money { cents: 1234 });
    assert_eq!(money.as_struct().unwrap().stringer_output.as_deref(), Some("$12.34"));

    let timeout = inspect(&Timeout { after_ms: 50 });
    let value = timeout.as_struct().unwrap();
    assert_eq!(value.error_string.as_deref(), Some("timed out after 50ms"));
    assert_eq!(value.stringer_output, None);
}

#[test]
fn io_errors_carry_their_message() {
    let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
    let result = inspect(&error);
    assert_eq!(
        result.as_struct().unwrap().error_string.as_deref(),
        Some("missing.toml")
    );
}

#[test]
fn locked_mutex_does_not_block() {
    let shared = Arc::new(Mutex::new(vec![1, 2, 3]));
    let _held = shared.lock().unwrap();
    assert_eq!(opaque_kind(&inspect(&shared)), Some(OpaqueKind::Unavailable));
}

#[test]
fn unlocked_mutex_is_walked() {
    let shared = Mutex::new(9_u16);
    assert_eq!(inspect(&shared), InspectableValue::Primitive(Primitive::Uint(9)));
}

#[test]
fn channels_functions_and_raw_pointers_are_opaque() {
    let (tx, rx) = mpsc::channel::<u8>();
    fn answer() -> i32 {
        42
    }
    let f: fn() -> i32 = answer;
    let number = 1_i32;
    let ptr: *const i32 = &number;

    assert_eq!(opaque_kind(&inspect(&tx)), Some(OpaqueKind::Channel));
    assert_eq!(opaque_kind(&inspect(&rx)), Some(OpaqueKind::Channel));
    assert_eq!(opaque_kind(&inspect(&f)), Some(OpaqueKind::Function));
    assert_eq!(opaque_kind(&inspect(&ptr)), Some(OpaqueKind::RawPointer));
}

#[test]
fn debug_and_display_wrappers() {
    assert_eq!(opaque_kind(&inspect(&AsDebug((1, "x")))), Some(OpaqueKind::Unknown));
    assert_eq!(inspect(&AsDisplay(Money { cents: 5 })), InspectableValue::text("$0.05"));
}

#[test]
fn shared_map_is_rendered_each_time_it_appears() {
    let map: Rc<BTreeMap<&str, i32>> = Rc::new([("a", 1)].into_iter().collect());
    let pair = (Rc::clone(&map), Rc::clone(&map));
    let result = inspect(&pair);
    let value = result.as_struct().unwrap();
    assert_eq!(value.field("0"), value.field("1"));
    assert!(matches!(value.field("1"), Some(InspectableValue::Map(_))));
}

#[test]
fn inspection_is_deterministic() {
    let data: BTreeMap<&str, Vec<f64>> = [("x", vec![1.5, 2.5]), ("y", vec![])]
        .into_iter()
        .collect();
    assert_eq!(inspect(&data), inspect(&data));
}

#[test]
fn cleanup_replaces_non_finite_floats() {
    let values = vec![1.0, f64::NAN, f64::INFINITY];
    let inspected = inspect(&values);
    assert!(serde_json::to_string(&inspected).is_err());
    let cleaned = clean(&inspected);
    assert_eq!(cleaned, serde_json::json!([1.0, "(f64:NaN)", "(f64:inf)"]));
}

#[test]
fn json_values_round_trip_through_inspection() {
    let value = serde_json::json!({"a": [1, 2], "b": {"c": null}});
    let cleaned = clean(&inspect(&value));
    assert_eq!(cleaned, value);
}

#[test]
fn byte_strings_decode_as_text() {
    let c_string = std::ffi::CString::new("héllo").unwrap();
    assert_eq!(inspect(&c_string), InspectableValue::text("héllo"));
    assert_eq!(inspect(&c_string.as_c_str()), InspectableValue::text("héllo"));
    assert_eq!(inspect(&b"raw".to_vec()), InspectableValue::text("raw"));
}

#[test]
fn shallow_inspection_keeps_scalars_and_stops_at_containers() {
    assert_eq!(jlog::inspect_shallow(&Some(5_i32)), InspectableValue::Primitive(Primitive::Int(5)));
    assert!(jlog::inspect_shallow(&None::<i32>).is_nil());
    let nested = vec![vec![1, 2], vec![3]];
    let shallow = jlog::inspect_shallow(&nested);
    let text = shallow.as_text().unwrap();
    assert!(text.starts_with("[2 x "), "{text}");
}
