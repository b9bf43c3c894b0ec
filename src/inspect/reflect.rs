//! The capability trait through which a value exposes its shape.
//!
//! Rust has no runtime reflection, so every inspectable type describes itself
//! with a [`Reflection`]: a borrowed, one-level view that the inspector walks.
//! Containers hand out views over their children instead of copies, which keeps
//! inspection allocation-light and lets the inspector bound how far it descends.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::ffi::{CStr, CString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex, RwLock, TryLockError, mpsc};
use std::time::Duration;

/// A value the inspector can walk.
///
/// Implemented for std primitives, strings, collections, smart pointers,
/// cells and locks, channels, function pointers, raw pointers, tuples,
/// `serde_json::Value` and chrono timestamps. User structs opt in through
/// [`reflect_struct!`](crate::reflect_struct), error types through
/// [`reflect_error!`](crate::reflect_error).
pub trait Reflect {
    /// Concrete type name, shown in opaque placeholders and struct labels.
    fn type_label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn reflect(&self) -> Reflection<'_>;
}

/// One level of a value's shape.
pub enum Reflection<'a> {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(Cow<'a, str>),
    /// Byte strings such as `CStr`; rendered as lossy UTF-8 text. Plain
    /// `u8` sequences are decoded the same way.
    Bytes(&'a [u8]),
    Seq(Box<dyn SeqView + 'a>),
    Map(Box<dyn MapView + 'a>),
    Struct(&'a dyn StructView),
    /// An error and its `source` chain.
    Error(&'a (dyn std::error::Error + 'static)),
    /// One hop of indirection. `None` is a null pointer.
    Pointer(Option<&'a dyn Reflect>),
    /// A value behind a borrow flag, lock or weak reference.
    Guarded(&'a dyn GuardView),
    /// A channel endpoint; never read from.
    Channel { element: &'static str },
    Function { signature: &'static str },
    RawPointer(usize),
    /// Anything the inspector cannot specialize.
    Opaque {
        raw: String,
        display: Option<String>,
    },
}

/// Ordered sequence of reflectable elements.
pub trait SeqView {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type name; `u8` sequences are decoded as text.
    fn element_type(&self) -> &'static str;

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;
}

/// Key/value container.
pub trait MapView {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;
}

/// Named fields, plus the optional error and display contracts.
pub trait StructView {
    /// Fields in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;

    fn error_text(&self) -> Option<String> {
        None
    }

    fn display_text(&self) -> Option<String> {
        None
    }
}

pub struct Field<'a> {
    pub name: &'static str,
    pub value: FieldValue<'a>,
}

pub enum FieldValue<'a> {
    Visible(&'a dyn Reflect),
    /// The value stays private; only its type is shown.
    Hidden(&'static str),
}

impl<'a> Field<'a> {
    #[must_use]
    pub fn visible(name: &'static str, value: &'a dyn Reflect) -> Self {
        Self {
            name,
            value: FieldValue::Visible(value),
        }
    }

    #[must_use]
    pub fn hidden<T: ?Sized>(name: &'static str, _value: &T) -> Self {
        Self {
            name,
            value: FieldValue::Hidden(std::any::type_name::<T>()),
        }
    }
}

/// Access to a value that may be unavailable at inspection time.
pub trait GuardView {
    /// Calls `visit` with the guarded value, or with the reason it cannot be
    /// read without blocking.
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>));
}

/// Renders a value through its `Debug` impl as an opaque leaf.
#[derive(Clone, Copy)]
pub struct AsDebug<T>(pub T);

/// Renders a value through its `Display` impl as text.
#[derive(Clone, Copy)]
pub struct AsDisplay<T>(pub T);

impl<T: fmt::Debug> Reflect for AsDebug<T> {
    fn type_label(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn reflect(&self) -> Reflection<'_> {
        Reflection::Opaque {
            raw: format!("{:?}", self.0),
            display: None,
        }
    }
}

impl<T: fmt::Display> Reflect for AsDisplay<T> {
    fn type_label(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Owned(self.0.to_string()))
    }
}

// Scalars

impl Reflect for () {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Nil
    }
}

impl Reflect for bool {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Bool(*self)
    }
}

macro_rules! reflect_signed {
    ($($t:ty),*) => {
        $(impl Reflect for $t {
            fn reflect(&self) -> Reflection<'_> {
                Reflection::Int(i64::from(*self))
            }
        })*
    };
}

macro_rules! reflect_unsigned {
    ($($t:ty),*) => {
        $(impl Reflect for $t {
            fn reflect(&self) -> Reflection<'_> {
                Reflection::Uint(u64::from(*self))
            }
        })*
    };
}

macro_rules! reflect_wide {
    ($variant:ident, $target:ty, $($t:ty),*) => {
        $(impl Reflect for $t {
            fn reflect(&self) -> Reflection<'_> {
                <$target>::try_from(*self).map_or_else(
                    |_| Reflection::Text(Cow::Owned(self.to_string())),
                    Reflection::$variant,
                )
            }
        })*
    };
}

reflect_signed!(i8, i16, i32, i64);
reflect_unsigned!(u8, u16, u32, u64);
reflect_wide!(Int, i64, isize, i128);
reflect_wide!(Uint, u64, usize, u128);

impl Reflect for f32 {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Float(f64::from(*self))
    }
}

impl Reflect for f64 {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Float(*self)
    }
}

impl Reflect for char {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Owned(self.to_string()))
    }
}

// Text

impl Reflect for str {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Borrowed(self))
    }
}

impl Reflect for String {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Borrowed(self.as_str()))
    }
}

impl Reflect for Cow<'_, str> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Borrowed(&**self))
    }
}

impl Reflect for Path {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(self.to_string_lossy())
    }
}

impl Reflect for PathBuf {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(self.to_string_lossy())
    }
}

// C strings are byte buffers without a guaranteed encoding.

impl Reflect for CStr {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Bytes(self.to_bytes())
    }
}

impl Reflect for CString {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Bytes(self.as_bytes())
    }
}

impl Reflect for Duration {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Owned(format!("{self:?}")))
    }
}

impl<Tz> Reflect for chrono::DateTime<Tz>
where
    Tz: chrono::TimeZone,
    Tz::Offset: fmt::Display,
{
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Owned(self.to_rfc3339()))
    }
}

impl Reflect for chrono::NaiveDateTime {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Owned(self.to_string()))
    }
}

// Transparent references: same identity and label as the referent.

impl<T: Reflect + ?Sized> Reflect for &T {
    fn type_label(&self) -> &'static str {
        (**self).type_label()
    }

    fn reflect(&self) -> Reflection<'_> {
        (**self).reflect()
    }
}

impl<T: Reflect + ?Sized> Reflect for &mut T {
    fn type_label(&self) -> &'static str {
        (**self).type_label()
    }

    fn reflect(&self) -> Reflection<'_> {
        (**self).reflect()
    }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn type_label(&self) -> &'static str {
        (**self).type_label()
    }

    fn reflect(&self) -> Reflection<'_> {
        (**self).reflect()
    }
}

// Indirection the inspector resolves hop by hop.

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Pointer(self.as_ref().map(|value| value as &dyn Reflect))
    }
}

impl<T: Reflect> Reflect for Rc<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Pointer(Some(&**self))
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Pointer(Some(&**self))
    }
}

impl Reflect for Rc<str> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Borrowed(&**self))
    }
}

impl Reflect for Arc<str> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Text(Cow::Borrowed(&**self))
    }
}

impl Reflect for Arc<dyn Reflect + Send + Sync> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Pointer(Some(&**self))
    }
}

impl<T: Reflect, E: Reflect> Reflect for Result<T, E> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Struct(self)
    }
}

impl<T: Reflect, E: Reflect> StructView for Result<T, E> {
    fn fields(&self) -> Vec<Field<'_>> {
        match self {
            Ok(value) => vec![Field::visible("Ok", value)],
            Err(error) => vec![Field::visible("Err", error)],
        }
    }
}

// Guarded values

impl<T: Reflect> Reflect for RefCell<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect> GuardView for RefCell<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        match self.try_borrow() {
            Ok(value) => visit(Ok(&*value)),
            Err(_) => visit(Err("mutably borrowed")),
        }
    }
}

impl<T: Reflect + Copy> Reflect for Cell<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect + Copy> GuardView for Cell<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        let value = self.get();
        visit(Ok(&value));
    }
}

impl<T: Reflect> Reflect for Mutex<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect> GuardView for Mutex<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        match self.try_lock() {
            Ok(guard) => visit(Ok(&*guard)),
            Err(TryLockError::Poisoned(poisoned)) => visit(Ok(&*poisoned.into_inner())),
            Err(TryLockError::WouldBlock) => visit(Err("locked")),
        }
    }
}

impl<T: Reflect> Reflect for RwLock<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect> GuardView for RwLock<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        match self.try_read() {
            Ok(guard) => visit(Ok(&*guard)),
            Err(TryLockError::Poisoned(poisoned)) => visit(Ok(&*poisoned.into_inner())),
            Err(TryLockError::WouldBlock) => visit(Err("write-locked")),
        }
    }
}

impl<T: Reflect> Reflect for parking_lot::Mutex<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect> GuardView for parking_lot::Mutex<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        match self.try_lock() {
            Some(guard) => visit(Ok(&*guard)),
            None => visit(Err("locked")),
        }
    }
}

impl<T: Reflect> Reflect for parking_lot::RwLock<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect> GuardView for parking_lot::RwLock<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        match self.try_read() {
            Some(guard) => visit(Ok(&*guard)),
            None => visit(Err("write-locked")),
        }
    }
}

impl<T: Reflect> Reflect for std::rc::Weak<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect> GuardView for std::rc::Weak<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        match self.upgrade() {
            Some(strong) => visit(Ok(&*strong)),
            None => visit(Err("dropped")),
        }
    }
}

impl<T: Reflect> Reflect for std::sync::Weak<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Guarded(self)
    }
}

impl<T: Reflect> GuardView for std::sync::Weak<T> {
    fn with_inner(&self, visit: &mut dyn FnMut(Result<&dyn Reflect, &'static str>)) {
        match self.upgrade() {
            Some(strong) => visit(Ok(&*strong)),
            None => visit(Err("dropped")),
        }
    }
}

// Sequences

impl<T: Reflect> SeqView for &[T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }
}

impl<T: Reflect> SeqView for &VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }
}

impl<T: Reflect, S> SeqView for &HashSet<T, S> {
    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }
}

impl<T: Reflect> SeqView for &BTreeSet<T> {
    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }
}

impl<T: Reflect> Reflect for [T] {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Seq(Box::new(self))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Seq(Box::new(self.as_slice()))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Seq(Box::new(self.as_slice()))
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Seq(Box::new(self))
    }
}

impl<T: Reflect, S> Reflect for HashSet<T, S> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Seq(Box::new(self))
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Seq(Box::new(self))
    }
}

// Maps

impl<K: Reflect, V: Reflect, S> MapView for &HashMap<K, V, S> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }
}

impl<K: Reflect, V: Reflect> MapView for &BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }
}

impl<K: Reflect, V: Reflect, S> Reflect for HashMap<K, V, S> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Map(Box::new(self))
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Map(Box::new(self))
    }
}

// serde_json documents

impl MapView for &serde_json::Map<String, serde_json::Value> {
    fn len(&self) -> usize {
        serde_json::Map::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }
}

impl Reflect for serde_json::Map<String, serde_json::Value> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Map(Box::new(self))
    }
}

impl Reflect for serde_json::Value {
    fn reflect(&self) -> Reflection<'_> {
        use serde_json::Value;
        match self {
            Value::Null => Reflection::Nil,
            Value::Bool(b) => Reflection::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Reflection::Int)
                .or_else(|| n.as_u64().map(Reflection::Uint))
                .or_else(|| n.as_f64().map(Reflection::Float))
                .unwrap_or_else(|| Reflection::Text(Cow::Owned(n.to_string()))),
            Value::String(s) => Reflection::Text(Cow::Borrowed(s.as_str())),
            Value::Array(items) => Reflection::Seq(Box::new(items.as_slice())),
            Value::Object(map) => Reflection::Map(Box::new(map)),
        }
    }
}

// Tuples render as structs with positional field names.

macro_rules! reflect_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn reflect(&self) -> Reflection<'_> {
                Reflection::Struct(self)
            }
        }

        impl<$($name: Reflect),+> StructView for ($($name,)+) {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![$(Field::visible(stringify!($idx), &self.$idx)),+]
            }
        }
    };
}

reflect_tuple!(A: 0, B: 1);
reflect_tuple!(A: 0, B: 1, C: 2);
reflect_tuple!(A: 0, B: 1, C: 2, D: 3);

// Values that cannot be serialized meaningfully.

impl<T> Reflect for mpsc::Sender<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Channel {
            element: std::any::type_name::<T>(),
        }
    }
}

impl<T> Reflect for mpsc::SyncSender<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Channel {
            element: std::any::type_name::<T>(),
        }
    }
}

impl<T> Reflect for mpsc::Receiver<T> {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Channel {
            element: std::any::type_name::<T>(),
        }
    }
}

macro_rules! reflect_fn {
    ($($arg:ident),*) => {
        impl<R, $($arg),*> Reflect for fn($($arg),*) -> R {
            fn reflect(&self) -> Reflection<'_> {
                Reflection::Function {
                    signature: std::any::type_name::<Self>(),
                }
            }
        }
    };
}

reflect_fn!();
reflect_fn!(A);
reflect_fn!(A, B);
reflect_fn!(A, B, C);

impl<T: ?Sized> Reflect for *const T {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::RawPointer(self.addr())
    }
}

impl<T: ?Sized> Reflect for *mut T {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::RawPointer(self.addr())
    }
}

// Errors

impl Reflect for dyn std::error::Error + 'static {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Error(self)
    }
}

impl Reflect for dyn std::error::Error + Send + Sync + 'static {
    fn reflect(&self) -> Reflection<'_> {
        Reflection::Error(self)
    }
}

crate::reflect_error!(
    std::io::Error,
    std::fmt::Error,
    std::num::ParseIntError,
    std::num::ParseFloatError,
    std::str::Utf8Error,
    std::string::FromUtf8Error,
    serde_json::Error,
);
