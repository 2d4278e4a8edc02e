// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Structured values attached to log entries.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

/// The key-value payload of a [`LogEntry`](crate::LogEntry).
pub type LogData = BTreeMap<String, LogValue>;

/// A host value that knows how to encode itself for logging.
///
/// Implement this for domain types that should render as structured data
/// instead of an opaque placeholder. When
/// [`encode_rich_types`](crate::SerializeConfig::encode_rich_types) is
/// disabled, the value renders as `"<TypeName>"` instead.
///
/// # Examples
///
/// ```
/// use flowlog::{data, Encode, LogValue};
///
/// struct Vec2 {
///     x: f64,
///     y: f64,
/// }
///
/// impl Encode for Vec2 {
///     fn type_name(&self) -> &'static str {
///         "Vec2"
///     }
///
///     fn encode(&self) -> LogValue {
///         LogValue::from(data! { "x" => self.x, "y" => self.y })
///     }
/// }
/// ```
pub trait Encode: Send + Sync + 'static {
    /// The name rendered inside the `"<...>"` placeholder when rich encoding
    /// is disabled.
    fn type_name(&self) -> &'static str;

    /// Produces the structured representation of this value.
    fn encode(&self) -> LogValue;
}

/// A structured value that can be attached to a log entry.
///
/// Most values are built through the [`From`] impls or the
/// [`data!`](crate::data) macro. [`LogValue::Shared`] and [`LogValue::Rich`]
/// carry values that need encoding before they are log-safe; the
/// [`serialize`](crate::serialize) pass resolves them.
#[derive(Clone)]
pub enum LogValue {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// An ordered sequence of values.
    Array(Vec<LogValue>),
    /// A string-keyed mapping of values.
    Map(LogData),
    /// A handle to a value that may be shared or self-referential.
    Shared(SharedValue),
    /// A host value encoded on demand via [`Encode`].
    Rich(Arc<dyn Encode>),
}

impl LogValue {
    /// Whether this value is already log-safe, i.e. free of [`LogValue::Shared`]
    /// and [`LogValue::Rich`] nodes at this level.
    pub fn is_plain(&self) -> bool {
        !matches!(self, LogValue::Shared(_) | LogValue::Rich(_))
    }

    /// The string content, if this is a [`LogValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LogValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The map content, if this is a [`LogValue::Map`].
    pub fn as_map(&self) -> Option<&LogData> {
        match self {
            LogValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Debug for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Null => f.write_str("Null"),
            LogValue::Bool(v) => write!(f, "Bool({v})"),
            LogValue::Int(v) => write!(f, "Int({v})"),
            LogValue::Float(v) => write!(f, "Float({v})"),
            LogValue::Str(v) => write!(f, "Str({v:?})"),
            LogValue::Array(v) => f.debug_tuple("Array").field(v).finish(),
            LogValue::Map(v) => f.debug_tuple("Map").field(v).finish(),
            LogValue::Shared(v) => write!(f, "Shared(0x{:x})", v.ptr() as usize),
            LogValue::Rich(v) => write!(f, "Rich(<{}>)", v.type_name()),
        }
    }
}

impl PartialEq for LogValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LogValue::Null, LogValue::Null) => true,
            (LogValue::Bool(a), LogValue::Bool(b)) => a == b,
            (LogValue::Int(a), LogValue::Int(b)) => a == b,
            (LogValue::Float(a), LogValue::Float(b)) => a == b,
            (LogValue::Str(a), LogValue::Str(b)) => a == b,
            (LogValue::Array(a), LogValue::Array(b)) => a == b,
            (LogValue::Map(a), LogValue::Map(b)) => a == b,
            (LogValue::Shared(a), LogValue::Shared(b)) => a.ptr() == b.ptr(),
            (LogValue::Rich(a), LogValue::Rich(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl serde::Serialize for LogValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            LogValue::Null => serializer.serialize_unit(),
            LogValue::Bool(v) => serializer.serialize_bool(*v),
            LogValue::Int(v) => serializer.serialize_i64(*v),
            LogValue::Float(v) => serializer.serialize_f64(*v),
            LogValue::Str(v) => serializer.serialize_str(v),
            LogValue::Array(v) => v.serialize(serializer),
            LogValue::Map(v) => v.serialize(serializer),
            // never follow shared handles here; cyclic values would recurse
            LogValue::Shared(_) => serializer.serialize_str("<Shared>"),
            LogValue::Rich(v) => serializer.serialize_str(&format!("<{}>", v.type_name())),
        }
    }
}

impl From<bool> for LogValue {
    fn from(v: bool) -> Self {
        LogValue::Bool(v)
    }
}

impl From<i32> for LogValue {
    fn from(v: i32) -> Self {
        LogValue::Int(v.into())
    }
}

impl From<i64> for LogValue {
    fn from(v: i64) -> Self {
        LogValue::Int(v)
    }
}

impl From<u32> for LogValue {
    fn from(v: u32) -> Self {
        LogValue::Int(v.into())
    }
}

impl From<f32> for LogValue {
    fn from(v: f32) -> Self {
        LogValue::Float(v.into())
    }
}

impl From<f64> for LogValue {
    fn from(v: f64) -> Self {
        LogValue::Float(v)
    }
}

impl From<&str> for LogValue {
    fn from(v: &str) -> Self {
        LogValue::Str(v.to_owned())
    }
}

impl From<String> for LogValue {
    fn from(v: String) -> Self {
        LogValue::Str(v)
    }
}

impl From<LogData> for LogValue {
    fn from(v: LogData) -> Self {
        LogValue::Map(v)
    }
}

impl From<SharedValue> for LogValue {
    fn from(v: SharedValue) -> Self {
        LogValue::Shared(v)
    }
}

impl<T: Into<LogValue>> From<Vec<T>> for LogValue {
    fn from(v: Vec<T>) -> Self {
        LogValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<LogValue>, const N: usize> From<[T; N]> for LogValue {
    fn from(v: [T; N]) -> Self {
        LogValue::Array(v.into_iter().map(Into::into).collect())
    }
}

/// A cloneable handle to a [`LogValue`] that may be shared between several
/// entries or reference itself.
///
/// Self-referential values are resolved by the
/// [`serialize`](crate::serialize) pass, which replaces the back-reference
/// with a `"<PtrToSelf>"` sentinel instead of recursing forever.
///
/// # Examples
///
/// ```
/// use flowlog::SharedValue;
///
/// let player = SharedValue::map();
/// player.insert("name", "daymon");
/// player.insert("itself", player.clone());
/// ```
#[derive(Clone)]
pub struct SharedValue(Arc<RwLock<LogValue>>);

impl SharedValue {
    /// Creates a new shared handle around `value`.
    pub fn new(value: LogValue) -> Self {
        SharedValue(Arc::new(RwLock::new(value)))
    }

    /// Creates a shared handle around an empty map.
    pub fn map() -> Self {
        SharedValue::new(LogValue::Map(LogData::new()))
    }

    /// Inserts a key-value pair, converting the inner value to a map first if
    /// it is not one already.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<LogValue>) {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if let LogValue::Map(map) = &mut *guard {
            map.insert(key.into(), value.into());
        } else {
            let mut map = LogData::new();
            map.insert(key.into(), value.into());
            *guard = LogValue::Map(map);
        }
    }

    /// A clone of the inner value. Tolerates a poisoned lock.
    pub fn snapshot(&self) -> LogValue {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn ptr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedValue(0x{:x})", self.ptr() as usize)
    }
}

/// Builds a [`LogData`] map from `key => value` pairs.
///
/// Keys convert via `String::from` and values via [`LogValue::from`].
///
/// # Examples
///
/// ```
/// use flowlog::data;
///
/// let data = data! {
///     "player" => 1338,
///     "alive" => true,
///     "position" => [1.0, 2.0],
/// };
/// assert_eq!(data.len(), 3);
/// ```
#[macro_export]
macro_rules! data {
    () => {
        $crate::LogData::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::LogData::new();
        $(
            map.insert(::std::string::String::from($key), $crate::LogValue::from($value));
        )+
        map
    }};
}
