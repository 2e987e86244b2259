// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic value handles.
//!
//! - [`ValueRef`]: borrowed `(type, storage)` view, never frees anything
//! - [`ValueMut`]: exclusive borrowed view allowing in-place updates
//! - [`Value`]: owning handle, storage is released when it is dropped
//!
//! A handle without a type is invalid (void) and its storage is never
//! interpreted.

use super::Storage;
use crate::compare;
use crate::convert::{Converted, Converter};
use crate::error::{Error, Result};
use crate::types::{type_of, FromStorage, Kind, Reflect, TypeRef};
use std::cmp::Ordering;
use std::fmt;

static VOID: Storage = Storage::Void;

/// Borrowed view of a value.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    ty: Option<TypeRef>,
    storage: &'a Storage,
}

impl<'a> ValueRef<'a> {
    /// View `storage` as a value of type `ty`.
    ///
    /// `storage` must have the shape `ty` describes.
    pub(crate) fn new(ty: TypeRef, storage: &'a Storage) -> Self {
        Self {
            ty: Some(ty),
            storage,
        }
    }

    pub fn invalid() -> ValueRef<'static> {
        ValueRef {
            ty: None,
            storage: &VOID,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.ty.is_some()
    }

    pub fn ty(&self) -> Option<TypeRef> {
        self.ty
    }

    /// Kind of the value; `Void` for an invalid handle.
    pub fn kind(&self) -> Kind {
        self.ty.map_or(Kind::Void, |t| t.kind())
    }

    pub fn storage(&self) -> &'a Storage {
        self.storage
    }

    /// Identity address, used for ordering of identity-compared kinds.
    pub fn address(&self) -> usize {
        self.storage.address()
    }

    /// Deep copy into an owning handle. Object instances stay shared.
    pub fn to_owned_value(&self) -> Value {
        Value {
            ty: self.ty,
            storage: self.storage.clone(),
        }
    }

    /// Convert through the global converter.
    pub fn convert(&self, target: TypeRef) -> Result<Converted<'a>> {
        Converter::global().convert(*self, target)
    }

    /// Convert, always returning an owned value.
    pub fn convert_copy(&self, target: TypeRef) -> Result<Value> {
        Converter::global().convert_copy(*self, target)
    }

    /// Extract a native value, converting first when the types differ.
    pub fn to<T: Reflect + FromStorage>(&self) -> Result<T> {
        let target = type_of::<T>();
        let converted = self.convert(target)?;
        T::from_storage(converted.storage()).ok_or_else(|| Error::Conversion {
            from: self.type_name().to_string(),
            to: target.name().to_string(),
            reason: "storage does not match the native layout".to_string(),
        })
    }

    pub fn to_int(&self) -> Result<i64> {
        self.to::<i64>()
    }

    pub fn to_uint(&self) -> Result<u64> {
        self.to::<u64>()
    }

    pub fn to_double(&self) -> Result<f64> {
        self.to::<f64>()
    }

    pub fn to_string(&self) -> Result<String> {
        self.to::<String>()
    }

    /// Content of a Dynamic value.
    pub fn as_dynamic(&self) -> Result<ValueRef<'a>> {
        match self.storage {
            Storage::Dynamic(inner) if self.kind() == Kind::Dynamic => Ok((**inner).as_ref()),
            _ => Err(Error::invalid_operation("as_dynamic", self.kind())),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.ty.map_or("<invalid>", |t| t.name())
    }
}

impl PartialEq for ValueRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        compare::equals(*self, *other)
    }
}

impl PartialOrd for ValueRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(compare::compare(*self, *other))
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRef")
            .field("type", &self.type_name())
            .field("storage", self.storage)
            .finish()
    }
}

/// Exclusive view allowing in-place modification.
pub struct ValueMut<'a> {
    ty: Option<TypeRef>,
    storage: &'a mut Storage,
}

impl<'a> ValueMut<'a> {
    pub(crate) fn new(ty: TypeRef, storage: &'a mut Storage) -> Self {
        Self {
            ty: Some(ty),
            storage,
        }
    }

    pub fn ty(&self) -> Option<TypeRef> {
        self.ty
    }

    pub fn kind(&self) -> Kind {
        self.ty.map_or(Kind::Void, |t| t.kind())
    }

    pub fn as_ref(&self) -> ValueRef<'_> {
        ValueRef {
            ty: self.ty,
            storage: &*self.storage,
        }
    }

    /// Reborrow for a shorter lifetime.
    pub fn reborrow(&mut self) -> ValueMut<'_> {
        ValueMut {
            ty: self.ty,
            storage: &mut *self.storage,
        }
    }

    pub(crate) fn parts(&mut self) -> (Option<TypeRef>, &mut Storage) {
        (self.ty, &mut *self.storage)
    }

    pub(crate) fn into_parts(self) -> (Option<TypeRef>, &'a mut Storage) {
        (self.ty, self.storage)
    }

    /// Store a signed integer into an Int or Float value.
    pub fn set_int(&mut self, v: i64) -> Result<()> {
        match self.ty.map(|t| t.type_kind()) {
            Some(crate::TypeKind::Int(d)) => {
                let bits = d.encode_int(v).ok_or_else(|| self.overflow(v))?;
                *self.storage = Storage::Int(bits);
                Ok(())
            }
            Some(crate::TypeKind::Float(d)) => {
                *self.storage = Storage::Float(d.narrow(v as f64));
                Ok(())
            }
            _ => Err(Error::invalid_operation("set_int", self.kind())),
        }
    }

    /// Store an unsigned integer into an Int or Float value.
    pub fn set_uint(&mut self, v: u64) -> Result<()> {
        match self.ty.map(|t| t.type_kind()) {
            Some(crate::TypeKind::Int(d)) => {
                let bits = d.encode_uint(v).ok_or_else(|| self.overflow(v))?;
                *self.storage = Storage::Int(bits);
                Ok(())
            }
            Some(crate::TypeKind::Float(d)) => {
                *self.storage = Storage::Float(d.narrow(v as f64));
                Ok(())
            }
            _ => Err(Error::invalid_operation("set_uint", self.kind())),
        }
    }

    /// Store a float into a Float or Int value; Int targets truncate.
    pub fn set_double(&mut self, v: f64) -> Result<()> {
        match self.ty.map(|t| t.type_kind()) {
            Some(crate::TypeKind::Float(d)) => {
                *self.storage = Storage::Float(d.narrow(v));
                Ok(())
            }
            Some(crate::TypeKind::Int(d)) => {
                let bits = d.encode_double(v).ok_or_else(|| self.overflow(v))?;
                *self.storage = Storage::Int(bits);
                Ok(())
            }
            _ => Err(Error::invalid_operation("set_double", self.kind())),
        }
    }

    pub fn set_string(&mut self, v: &str) -> Result<()> {
        match self.kind() {
            Kind::String => {
                *self.storage = Storage::String(v.as_bytes().to_vec());
                Ok(())
            }
            kind => Err(Error::invalid_operation("set_string", kind)),
        }
    }

    /// Overwrite a scalar with `value` read as this value's kind.
    pub fn update(&mut self, value: ValueRef<'_>) -> Result<()> {
        match self.kind() {
            Kind::Int => self.set_int(value.to_int()?),
            Kind::Float => self.set_double(value.to_double()?),
            Kind::String => {
                let s = value.to_string()?;
                self.set_string(&s)
            }
            kind => Err(Error::invalid_operation("update", kind)),
        }
    }

    fn overflow(&self, v: impl fmt::Display) -> Error {
        Error::Conversion {
            from: v.to_string(),
            to: self.as_ref().type_name().to_string(),
            reason: "value out of range".to_string(),
        }
    }
}

impl fmt::Debug for ValueMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_ref(), f)
    }
}

/// Owning value handle.
#[derive(Clone)]
pub struct Value {
    ty: Option<TypeRef>,
    storage: Storage,
}

impl Value {
    /// The invalid (void) value.
    pub const fn invalid() -> Self {
        Self {
            ty: None,
            storage: Storage::Void,
        }
    }

    /// `storage` must have the shape `ty` describes.
    pub(crate) fn from_parts(ty: TypeRef, storage: Storage) -> Self {
        Self {
            ty: Some(ty),
            storage,
        }
    }

    /// Move a native value behind a generic handle.
    pub fn from_native<T: Reflect>(value: T) -> Self {
        Self::from_parts(type_of::<T>(), value.into_storage())
    }

    /// Default value of `ty`; `None` for types without one (objects).
    pub fn with_default(ty: TypeRef) -> Option<Self> {
        ty.default_storage().map(|s| Self::from_parts(ty, s))
    }

    pub fn is_valid(&self) -> bool {
        self.ty.is_some()
    }

    pub fn ty(&self) -> Option<TypeRef> {
        self.ty
    }

    pub fn kind(&self) -> Kind {
        self.ty.map_or(Kind::Void, |t| t.kind())
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn into_storage(self) -> Storage {
        self.storage
    }

    pub fn as_ref(&self) -> ValueRef<'_> {
        ValueRef {
            ty: self.ty,
            storage: &self.storage,
        }
    }

    pub fn as_mut(&mut self) -> ValueMut<'_> {
        ValueMut {
            ty: self.ty,
            storage: &mut self.storage,
        }
    }

    /// Extract a native value.
    pub fn to<T: Reflect + FromStorage>(&self) -> Result<T> {
        self.as_ref().to::<T>()
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::invalid()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        compare::equals(self.as_ref(), other.as_ref())
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        compare::compare(self.as_ref(), other.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.as_ref().type_name())
            .field("storage", &self.storage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value() {
        let v = Value::invalid();
        assert!(!v.is_valid());
        assert_eq!(v.kind(), Kind::Void);
        assert!(!ValueRef::invalid().is_valid());
        assert_eq!(Value::invalid(), Value::default());
    }

    #[test]
    fn test_setters_check_range() {
        let mut v = Value::from_native(0u8);
        v.as_mut().set_int(255).unwrap();
        assert_eq!(v.to::<u8>().unwrap(), 255);
        assert!(v.as_mut().set_int(256).unwrap_err().is_conversion());
        assert!(v.as_mut().set_int(-1).is_err());
        assert!(v.as_mut().set_string("x").is_err());

        v.as_mut().set_double(7.9).unwrap();
        assert_eq!(v.to::<u8>().unwrap(), 7);
    }

    #[test]
    fn test_float_setters_narrow() {
        let mut v = Value::from_native(0f32);
        v.as_mut().set_double(0.1).unwrap();
        assert_eq!(v.storage(), &Storage::Float(f64::from(0.1f32)));
        v.as_mut().set_uint(3).unwrap();
        assert_eq!(v.to::<f32>().unwrap(), 3.0);
    }

    #[test]
    fn test_update_reads_as_target_kind() {
        let mut s = Value::from_native(String::from("old"));
        s.as_mut()
            .update(Value::from_native(String::from("new")).as_ref())
            .unwrap();
        assert_eq!(s.to::<String>().unwrap(), "new");

        let mut i = Value::from_native(1i32);
        i.as_mut().update(Value::from_native(41.5f64).as_ref()).unwrap();
        assert_eq!(i.to::<i32>().unwrap(), 41);

        let mut list = Value::from_native(vec![1i32]);
        assert_eq!(
            list.as_mut().update(Value::from_native(1i32).as_ref()),
            Err(Error::invalid_operation("update", Kind::List))
        );
    }

    #[test]
    fn test_as_dynamic() {
        let inner = Value::from_native(5i32);
        let dynamic = Value::from_native(inner.clone());
        assert_eq!(dynamic.kind(), Kind::Dynamic);
        assert_eq!(dynamic.as_ref().as_dynamic().unwrap(), inner.as_ref());
        assert!(inner.as_ref().as_dynamic().is_err());
    }
}
