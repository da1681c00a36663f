//! Named field access on records
//!
//! The engine never looks inside a record type. It reads and writes fields
//! by name through [`FieldAccessor`], which has two implementations:
//!
//! - struct records, which describe their fields once in a static
//!   [`RecordDescriptor`] and implement [`StructRecord`]
//! - [`MapRecord`], an insertion-ordered key/value record that accepts any
//!   field name
//!
//! ```rust
//! use once_cell::sync::Lazy;
//! use sheetmap::record::{RecordDescriptor, StructRecord};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     name: String,
//!     age: Option<i32>,
//! }
//!
//! static USER: Lazy<RecordDescriptor<User>> = Lazy::new(|| {
//!     RecordDescriptor::builder()
//!         .field("name", |u: &User| u.name.clone(), |u, v| u.name = v)
//!         .field("age", |u: &User| u.age, |u, v| u.age = v)
//!         .build()
//! });
//!
//! impl StructRecord for User {
//!     fn descriptor() -> &'static RecordDescriptor<Self> {
//!         &USER
//!     }
//! }
//! ```

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use num_bigint::BigInt;
use rust_decimal::Decimal;

use crate::coerce::{CoercionRegistry, FieldValue, RawCellValue, ScalarKind, TargetType};
use crate::error::{AccessError, CoerceError};

/// Get and set named fields on a record
pub trait FieldAccessor {
    /// A fresh record: default-constructed, or an empty map
    fn new_record() -> Self
    where
        Self: Sized;

    /// Read a field
    fn get_field(&self, name: &str) -> Result<FieldValue, AccessError>;

    /// Assign a raw cell value to a field, choosing and coercing through
    /// `registry`
    fn set_field(
        &mut self,
        name: &str,
        value: &RawCellValue,
        registry: &CoercionRegistry,
    ) -> Result<(), AccessError>;

    /// Distinct names of the fields that can be set, in declared order
    fn settable_fields() -> Vec<String>
    where
        Self: Sized;

    /// Names of the fields that can be read, in declared order
    fn gettable_fields() -> Vec<String>
    where
        Self: Sized;
}

/// A Rust type a record field can hold
pub trait FieldType: Sized {
    /// The coercion target for this type
    fn target() -> TargetType;

    /// Take a coerced value, `None` if it has the wrong kind
    fn from_field_value(value: FieldValue) -> Option<Self>;

    /// Wrap the value for writing
    fn into_field_value(self) -> FieldValue;
}

macro_rules! impl_field_type {
    ($ty:ty, $variant:ident) => {
        impl FieldType for $ty {
            fn target() -> TargetType {
                TargetType::required(ScalarKind::$variant)
            }

            fn from_field_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_field_value(self) -> FieldValue {
                FieldValue::$variant(self)
            }
        }
    };
}

impl_field_type!(i16, I16);
impl_field_type!(i32, I32);
impl_field_type!(i64, I64);
impl_field_type!(f32, F32);
impl_field_type!(f64, F64);
impl_field_type!(bool, Bool);
impl_field_type!(BigInt, BigInt);
impl_field_type!(BigDecimal, BigDecimal);
impl_field_type!(Decimal, Decimal);
impl_field_type!(String, Text);
impl_field_type!(NaiveDateTime, DateTime);

impl<T: FieldType> FieldType for Option<T> {
    fn target() -> TargetType {
        TargetType::optional(T::target().kind)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::from_field_value(other).map(Some),
        }
    }

    fn into_field_value(self) -> FieldValue {
        match self {
            Some(v) => v.into_field_value(),
            None => FieldValue::Null,
        }
    }
}

type GetFn<R> = Box<dyn Fn(&R) -> Result<FieldValue, String> + Send + Sync>;
type SetFn<R> = Box<dyn Fn(&mut R, FieldValue) -> Result<(), String> + Send + Sync>;

struct Getter<R> {
    name: &'static str,
    get: GetFn<R>,
}

struct Setter<R> {
    name: &'static str,
    target: TargetType,
    set: SetFn<R>,
}

impl<R> Setter<R> {
    fn invoke(&self, record: &mut R, value: FieldValue) -> Result<(), AccessError> {
        (self.set)(record, value).map_err(|message| AccessError::Invocation {
            field: self.name.to_string(),
            message,
        })
    }
}

/// Field table of a struct record type
///
/// A field name may have several setters, each taking a different type.
/// When a cell is assigned they are tried in this order:
///
/// 1. a date cell goes to the date setter
/// 2. a text cell goes verbatim to the `String` setter
/// 3. otherwise the first setter, in declared order, whose type the text
///    coerces to
///
/// An absent cell goes to the first setter that accepts null.
pub struct RecordDescriptor<R> {
    getters: Vec<Getter<R>>,
    setters: Vec<Setter<R>>,
}

impl<R> fmt::Debug for RecordDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field(
                "getters",
                &self.getters.iter().map(|g| g.name).collect::<Vec<_>>(),
            )
            .field(
                "setters",
                &self
                    .setters
                    .iter()
                    .map(|s| (s.name, s.target))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<R: 'static> RecordDescriptor<R> {
    /// Start an empty descriptor
    pub fn builder() -> RecordDescriptorBuilder<R> {
        RecordDescriptorBuilder {
            descriptor: RecordDescriptor {
                getters: Vec::new(),
                setters: Vec::new(),
            },
        }
    }

    /// Read a field
    pub fn get(&self, record: &R, name: &str) -> Result<FieldValue, AccessError> {
        let getter = self
            .getters
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| AccessError::NoSuchField(name.to_string()))?;
        (getter.get)(record).map_err(|message| AccessError::Invocation {
            field: name.to_string(),
            message,
        })
    }

    /// Pick a setter for `raw` and assign it
    pub fn set(
        &self,
        record: &mut R,
        name: &str,
        raw: &RawCellValue,
        registry: &CoercionRegistry,
    ) -> Result<(), AccessError> {
        let no_setter = || AccessError::NoSuitableSetter {
            field: name.to_string(),
            value: raw.describe(),
        };
        let candidates: Vec<&Setter<R>> = self.setters.iter().filter(|s| s.name == name).collect();
        if candidates.is_empty() {
            return Err(no_setter());
        }

        match raw {
            RawCellValue::Absent => {
                let setter = candidates
                    .iter()
                    .find(|s| s.target.accepts_null())
                    .ok_or_else(no_setter)?;
                if setter.target.nullable {
                    setter.invoke(record, FieldValue::Null)
                } else {
                    // non-nullable text: the field stays unset
                    Ok(())
                }
            }
            RawCellValue::Date(d) => {
                let setter = candidates
                    .iter()
                    .find(|s| s.target.kind == ScalarKind::DateTime)
                    .ok_or_else(no_setter)?;
                setter.invoke(record, FieldValue::DateTime(*d))
            }
            text => {
                let text_value = text.as_text().ok_or_else(no_setter)?;
                if let Some(setter) = candidates.iter().find(|s| s.target.kind == ScalarKind::Text) {
                    return setter.invoke(record, FieldValue::Text(text_value.to_string()));
                }
                for setter in &candidates {
                    if let Ok(value) = registry.coerce(raw, setter.target) {
                        return setter.invoke(record, value);
                    }
                }
                Err(no_setter())
            }
        }
    }

    /// Distinct settable field names, in declared order
    pub fn settable_fields(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for setter in &self.setters {
            if !names.iter().any(|n| n == setter.name) {
                names.push(setter.name.to_string());
            }
        }
        names
    }

    /// Gettable field names, in declared order
    pub fn gettable_fields(&self) -> Vec<String> {
        self.getters.iter().map(|g| g.name.to_string()).collect()
    }
}

/// Builder for a [`RecordDescriptor`]
pub struct RecordDescriptorBuilder<R> {
    descriptor: RecordDescriptor<R>,
}

impl<R: 'static> RecordDescriptorBuilder<R> {
    /// Add a field with one getter and one setter
    pub fn field<T: FieldType + 'static>(
        self,
        name: &'static str,
        get: fn(&R) -> T,
        set: fn(&mut R, T),
    ) -> Self {
        self.getter(name, get).setter(name, set)
    }

    /// Add a read-only accessor
    pub fn getter<T: FieldType + 'static>(self, name: &'static str, get: fn(&R) -> T) -> Self {
        self.push_getter(name, Box::new(move |r: &R| Ok(get(r).into_field_value())))
    }

    /// Add a getter that can fail
    pub fn try_getter<T: FieldType + 'static>(
        self,
        name: &'static str,
        get: fn(&R) -> Result<T, String>,
    ) -> Self {
        self.push_getter(name, Box::new(move |r: &R| get(r).map(T::into_field_value)))
    }

    /// Add a setter. Calling this again with the same name adds an overload.
    pub fn setter<T: FieldType + 'static>(self, name: &'static str, set: fn(&mut R, T)) -> Self {
        self.push_setter::<T>(
            name,
            Box::new(move |r: &mut R, value: FieldValue| {
                let value = Self::unwrap_value::<T>(value)?;
                set(r, value);
                Ok(())
            }),
        )
    }

    /// Add a setter that can fail
    pub fn try_setter<T: FieldType + 'static>(
        self,
        name: &'static str,
        set: fn(&mut R, T) -> Result<(), String>,
    ) -> Self {
        self.push_setter::<T>(
            name,
            Box::new(move |r: &mut R, value: FieldValue| {
                set(r, Self::unwrap_value::<T>(value)?)
            }),
        )
    }

    /// Finish the descriptor
    pub fn build(self) -> RecordDescriptor<R> {
        self.descriptor
    }

    fn push_getter(mut self, name: &'static str, get: GetFn<R>) -> Self {
        self.descriptor.getters.push(Getter { name, get });
        self
    }

    fn push_setter<T: FieldType>(mut self, name: &'static str, set: SetFn<R>) -> Self {
        self.descriptor.setters.push(Setter {
            name,
            target: T::target(),
            set,
        });
        self
    }

    fn unwrap_value<T: FieldType>(value: FieldValue) -> Result<T, String> {
        let rendered = value.to_string();
        T::from_field_value(value).ok_or_else(|| {
            CoerceError::TypeMismatch {
                value: rendered,
                target: T::target(),
            }
            .to_string()
        })
    }
}

/// A struct record with a static field table
pub trait StructRecord: Default + 'static {
    /// The field table, built once
    fn descriptor() -> &'static RecordDescriptor<Self>;
}

impl<R: StructRecord> FieldAccessor for R {
    fn new_record() -> Self {
        R::default()
    }

    fn get_field(&self, name: &str) -> Result<FieldValue, AccessError> {
        R::descriptor().get(self, name)
    }

    fn set_field(
        &mut self,
        name: &str,
        value: &RawCellValue,
        registry: &CoercionRegistry,
    ) -> Result<(), AccessError> {
        R::descriptor().set(self, name, value, registry)
    }

    fn settable_fields() -> Vec<String> {
        R::descriptor().settable_fields()
    }

    fn gettable_fields() -> Vec<String> {
        R::descriptor().gettable_fields()
    }
}

/// Insertion-ordered key/value record
///
/// Any field name can be set; cell text is stored verbatim and dates as
/// dates. Reading a key that was never set is a [`AccessError::NoSuchField`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRecord {
    entries: Vec<(String, FieldValue)>,
}

impl MapRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, keeping the original position on replace
    pub fn insert<K: Into<String>>(&mut self, key: K, value: FieldValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value of a key
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the record has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for MapRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut record = MapRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl FieldAccessor for MapRecord {
    fn new_record() -> Self {
        MapRecord::new()
    }

    fn get_field(&self, name: &str) -> Result<FieldValue, AccessError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| AccessError::NoSuchField(name.to_string()))
    }

    fn set_field(
        &mut self,
        name: &str,
        value: &RawCellValue,
        _registry: &CoercionRegistry,
    ) -> Result<(), AccessError> {
        self.insert(name, value.to_field_value());
        Ok(())
    }

    /// Open-ended: any name can be set
    fn settable_fields() -> Vec<String> {
        Vec::new()
    }

    fn gettable_fields() -> Vec<String> {
        Vec::new()
    }
}
