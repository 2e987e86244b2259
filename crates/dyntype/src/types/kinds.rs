// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kind-specific capability descriptors.
//!
//! Each descriptor interprets a [`Storage`] of its own shape. Handing one a
//! storage of another shape is a programming error and is rejected with
//! [`Error::InvalidOperation`].

use super::descriptor::{Kind, TypeRef};
use crate::compare;
use crate::error::{Error, Result};
use crate::value::{Cursor, Storage};

/// Integer type: width in bits (1 for booleans) and signedness.
///
/// Storage holds the 64-bit pattern: sign-extended for signed types, the
/// plain value for unsigned ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntDescriptor {
    bits: u8,
    signed: bool,
}

impl IntDescriptor {
    pub const BOOL: Self = Self {
        bits: 1,
        signed: false,
    };

    pub const fn new(bits: u8, signed: bool) -> Self {
        Self { bits, signed }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn is_bool(&self) -> bool {
        self.bits == 1
    }

    /// Size in bytes (booleans occupy one).
    pub fn size(&self) -> usize {
        usize::from(self.bits.div_ceil(8))
    }

    /// Raw 64-bit pattern.
    pub fn get(&self, storage: &Storage) -> Result<i64> {
        match storage {
            Storage::Int(bits) => Ok(*bits as i64),
            _ => Err(Error::invalid_operation("int get", Kind::Int)),
        }
    }

    /// Numeric value, with unsigned 64-bit values kept exact.
    pub fn value(&self, storage: &Storage) -> Result<i128> {
        match storage {
            Storage::Int(bits) if self.signed => Ok(i128::from(*bits as i64)),
            Storage::Int(bits) => Ok(i128::from(*bits)),
            _ => Err(Error::invalid_operation("int get", Kind::Int)),
        }
    }

    fn signed_range(&self) -> (i64, i64) {
        if self.bits >= 64 {
            (i64::MIN, i64::MAX)
        } else {
            let half = 1i64 << (self.bits - 1);
            (-half, half - 1)
        }
    }

    fn unsigned_max(&self) -> u64 {
        if self.bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Range-checked encoding of a signed value; `None` on overflow.
    pub fn encode_int(&self, v: i64) -> Option<u64> {
        if self.is_bool() {
            return Some(u64::from(v != 0));
        }
        if self.signed {
            let (min, max) = self.signed_range();
            (min..=max).contains(&v).then_some(v as u64)
        } else {
            let v = u64::try_from(v).ok()?;
            (v <= self.unsigned_max()).then_some(v)
        }
    }

    /// Range-checked encoding of an unsigned value; `None` on overflow.
    pub fn encode_uint(&self, v: u64) -> Option<u64> {
        if self.is_bool() {
            return Some(u64::from(v != 0));
        }
        if self.signed {
            let (_, max) = self.signed_range();
            (v <= max as u64).then_some(v)
        } else {
            (v <= self.unsigned_max()).then_some(v)
        }
    }

    /// Range-checked encoding of a float, truncated toward zero.
    pub fn encode_double(&self, v: f64) -> Option<u64> {
        if self.is_bool() {
            return Some(u64::from(v != 0.0));
        }
        if !v.is_finite() {
            return None;
        }
        let t = v.trunc();
        if self.signed {
            let limit = 2f64.powi(i32::from(self.bits) - 1);
            if t < -limit || t >= limit {
                return None;
            }
            self.encode_int(t as i64)
        } else {
            let limit = 2f64.powi(i32::from(self.bits));
            if t < 0.0 || t >= limit {
                return None;
            }
            self.encode_uint(t as u64)
        }
    }
}

/// Floating point type (32 or 64 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatDescriptor {
    bits: u8,
}

impl FloatDescriptor {
    pub const fn new(bits: u8) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn get(&self, storage: &Storage) -> Result<f64> {
        match storage {
            Storage::Float(v) => Ok(*v),
            _ => Err(Error::invalid_operation("float get", Kind::Float)),
        }
    }

    /// Round `v` to this type's precision.
    pub fn narrow(&self, v: f64) -> f64 {
        if self.bits == 32 {
            f64::from(v as f32)
        } else {
            v
        }
    }
}

/// Homogeneous growable sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ListDescriptor {
    element: TypeRef,
}

impl ListDescriptor {
    pub fn new(element: TypeRef) -> Self {
        Self { element }
    }

    pub fn element_type(&self) -> TypeRef {
        self.element
    }

    pub fn items<'s>(&self, storage: &'s Storage) -> Result<&'s [Storage]> {
        match storage {
            Storage::List(items) => Ok(items),
            _ => Err(Error::invalid_operation("list access", Kind::List)),
        }
    }

    pub fn size(&self, storage: &Storage) -> Result<usize> {
        self.items(storage).map(<[Storage]>::len)
    }

    pub fn element<'s>(&self, storage: &'s Storage, index: usize) -> Result<Option<&'s Storage>> {
        Ok(self.items(storage)?.get(index))
    }

    pub fn element_mut<'s>(
        &self,
        storage: &'s mut Storage,
        index: usize,
    ) -> Result<Option<&'s mut Storage>> {
        match storage {
            Storage::List(items) => Ok(items.get_mut(index)),
            _ => Err(Error::invalid_operation("list access", Kind::List)),
        }
    }

    /// Append storage already shaped for the element type.
    pub fn push_back(&self, storage: &mut Storage, item: Storage) -> Result<()> {
        match storage {
            Storage::List(items) => {
                items.push(item);
                Ok(())
            }
            _ => Err(Error::invalid_operation("push_back", Kind::List)),
        }
    }
}

/// Ordered associative container.
///
/// Entries are stored as `(key, element)` tuple storages sorted by the key
/// type's own comparator, so iteration yields entries of `entry_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDescriptor {
    key: TypeRef,
    element: TypeRef,
    entry: TypeRef,
}

impl MapDescriptor {
    pub fn new(key: TypeRef, element: TypeRef, entry: TypeRef) -> Self {
        Self {
            key,
            element,
            entry,
        }
    }

    pub fn key_type(&self) -> TypeRef {
        self.key
    }

    pub fn element_type(&self) -> TypeRef {
        self.element
    }

    /// Tuple type `(key, element)` of iterated entries.
    pub fn entry_type(&self) -> TypeRef {
        self.entry
    }

    pub fn entries<'s>(&self, storage: &'s Storage) -> Result<&'s [Storage]> {
        match storage {
            Storage::Map(entries) => Ok(entries),
            _ => Err(Error::invalid_operation("map access", Kind::Map)),
        }
    }

    pub fn size(&self, storage: &Storage) -> Result<usize> {
        self.entries(storage).map(<[Storage]>::len)
    }

    /// Binary search for `key`: `Ok(position)` when present, `Err(insert_at)`.
    pub fn find(&self, storage: &Storage, key: &Storage) -> Result<core::result::Result<usize, usize>> {
        let entries = self.entries(storage)?;
        Ok(entries.binary_search_by(|entry| {
            compare::storage_cmp(self.key, entry_key(entry), key)
        }))
    }

    /// Element stored under `key`.
    pub fn lookup<'s>(&self, storage: &'s Storage, key: &Storage) -> Result<Option<&'s Storage>> {
        let position = self.find(storage, key)?;
        let entries = self.entries(storage)?;
        Ok(position.ok().and_then(|p| entry_value(&entries[p])))
    }

    /// Element stored under `key`.
    ///
    /// On a miss `default` is called; `Ok(Some(_))` is inserted under `key`,
    /// `Ok(None)` leaves the map untouched. Hits never call it.
    pub fn lookup_mut<'s, F>(
        &self,
        storage: &'s mut Storage,
        key: Storage,
        default: F,
    ) -> Result<Option<&'s mut Storage>>
    where
        F: FnOnce() -> Result<Option<Storage>>,
    {
        let position = match self.find(storage, &key)? {
            Ok(p) => p,
            Err(at) => match default()? {
                Some(value) => {
                    self.entries_mut(storage)?
                        .insert(at, Storage::Tuple(vec![key, value]));
                    at
                }
                None => return Ok(None),
            },
        };
        Ok(self
            .entries_mut(storage)?
            .get_mut(position)
            .and_then(entry_value_mut))
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&self, storage: &mut Storage, key: Storage, value: Storage) -> Result<()> {
        match self.find(storage, &key)? {
            Ok(p) => {
                if let Some(slot) = self.entries_mut(storage)?.get_mut(p).and_then(entry_value_mut) {
                    *slot = value;
                }
            }
            Err(at) => {
                self.entries_mut(storage)?
                    .insert(at, Storage::Tuple(vec![key, value]));
            }
        }
        Ok(())
    }

    fn entries_mut<'s>(&self, storage: &'s mut Storage) -> Result<&'s mut Vec<Storage>> {
        match storage {
            Storage::Map(entries) => Ok(entries),
            _ => Err(Error::invalid_operation("map access", Kind::Map)),
        }
    }
}

fn entry_key(entry: &Storage) -> &Storage {
    match entry {
        Storage::Tuple(pair) => pair.first().unwrap_or(&Storage::Void),
        other => other,
    }
}

fn entry_value(entry: &Storage) -> Option<&Storage> {
    match entry {
        Storage::Tuple(pair) => pair.get(1),
        _ => None,
    }
}

fn entry_value_mut(entry: &mut Storage) -> Option<&mut Storage> {
    match entry {
        Storage::Tuple(pair) => pair.get_mut(1),
        _ => None,
    }
}

/// Fixed-arity heterogeneous product.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleDescriptor {
    members: Vec<TypeRef>,
}

impl TupleDescriptor {
    pub fn new(members: Vec<TypeRef>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[TypeRef] {
        &self.members
    }

    pub fn arity(&self) -> usize {
        self.members.len()
    }

    pub fn get<'s>(&self, storage: &'s Storage, index: usize) -> Result<Option<&'s Storage>> {
        match storage {
            Storage::Tuple(members) => Ok(members.get(index)),
            _ => Err(Error::invalid_operation("tuple get", Kind::Tuple)),
        }
    }

    pub fn get_mut<'s>(
        &self,
        storage: &'s mut Storage,
        index: usize,
    ) -> Result<Option<&'s mut Storage>> {
        match storage {
            Storage::Tuple(members) => Ok(members.get_mut(index)),
            _ => Err(Error::invalid_operation("tuple get", Kind::Tuple)),
        }
    }

    /// Replace member `index` with storage shaped for its member type.
    pub fn set(&self, storage: &mut Storage, index: usize, value: Storage) -> Result<()> {
        let length = self.arity();
        match self.get_mut(storage, index)? {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::Index {
                index: index as i64,
                length,
            }),
        }
    }
}

/// Pointer to a value of `pointee` type.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDescriptor {
    pointee: TypeRef,
}

impl PointerDescriptor {
    pub fn new(pointee: TypeRef) -> Self {
        Self { pointee }
    }

    pub fn pointee(&self) -> TypeRef {
        self.pointee
    }

    pub fn dereference<'s>(&self, storage: &'s Storage) -> Result<&'s Storage> {
        match storage {
            Storage::Pointer(Some(target)) => Ok(target),
            Storage::Pointer(None) => Err(Error::NullPointer),
            _ => Err(Error::invalid_operation("dereference", Kind::Pointer)),
        }
    }
}

/// Cursor over a List or Map of `container` type.
#[derive(Debug, Clone, PartialEq)]
pub struct IteratorDescriptor {
    container: TypeRef,
}

impl IteratorDescriptor {
    pub fn new(container: TypeRef) -> Self {
        Self { container }
    }

    pub fn container_type(&self) -> TypeRef {
        self.container
    }

    pub fn cursor(&self, storage: &Storage) -> Result<Cursor> {
        match storage {
            Storage::Iterator(cursor) => Ok(*cursor),
            _ => Err(Error::invalid_operation("iterator access", Kind::Iterator)),
        }
    }

    /// Two cursors are equal when they walk the same container at the same
    /// position.
    pub fn equals(&self, a: &Storage, b: &Storage) -> bool {
        match (self.cursor(a), self.cursor(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_encode_signed() {
        let i8_desc = IntDescriptor::new(8, true);
        assert_eq!(i8_desc.encode_int(127), Some(127));
        assert_eq!(i8_desc.encode_int(-128), Some(-128i64 as u64));
        assert_eq!(i8_desc.encode_int(128), None);
        assert_eq!(i8_desc.encode_uint(u64::MAX), None);
        assert_eq!(i8_desc.encode_uint(5), Some(5));
    }

    #[test]
    fn test_int_encode_unsigned() {
        let u16_desc = IntDescriptor::new(16, false);
        assert_eq!(u16_desc.encode_int(-1), None);
        assert_eq!(u16_desc.encode_uint(65535), Some(65535));
        assert_eq!(u16_desc.encode_uint(65536), None);

        let u64_desc = IntDescriptor::new(64, false);
        assert_eq!(u64_desc.encode_uint(u64::MAX), Some(u64::MAX));
        assert_eq!(
            u64_desc.value(&Storage::Int(u64::MAX)).unwrap(),
            i128::from(u64::MAX)
        );
    }

    #[test]
    fn test_int_encode_double() {
        let i32_desc = IntDescriptor::new(32, true);
        assert_eq!(i32_desc.encode_double(-3.9), Some(-3i64 as u64));
        assert_eq!(i32_desc.encode_double(f64::NAN), None);
        assert_eq!(i32_desc.encode_double(2147483648.0), None);
        assert_eq!(IntDescriptor::new(64, true).encode_double(9.3e18), None);
        assert_eq!(IntDescriptor::new(8, false).encode_double(-1.0), None);
    }

    #[test]
    fn test_bool_normalizes() {
        assert_eq!(IntDescriptor::BOOL.encode_int(42), Some(1));
        assert_eq!(IntDescriptor::BOOL.encode_uint(0), Some(0));
        assert_eq!(IntDescriptor::BOOL.size(), 1);
    }

    #[test]
    fn test_float_narrow() {
        let f32_desc = FloatDescriptor::new(32);
        assert_eq!(f32_desc.narrow(0.1), f64::from(0.1f32));
        assert_eq!(FloatDescriptor::new(64).narrow(0.1), 0.1);
    }

    #[test]
    fn test_pointer_dereference_null() {
        let desc = PointerDescriptor::new(crate::type_of::<i32>());
        assert_eq!(
            desc.dereference(&Storage::Pointer(None)),
            Err(Error::NullPointer)
        );
    }

    #[test]
    fn test_map_insert_keeps_order() {
        let map = crate::type_of::<std::collections::BTreeMap<i32, String>>();
        let desc = map.as_map().unwrap();
        let mut storage = Storage::Map(Vec::new());
        for key in [5i64, 1, 3] {
            desc.insert(
                &mut storage,
                Storage::Int(key as u64),
                Storage::String(b"v".to_vec()),
            )
            .unwrap();
        }
        desc.insert(&mut storage, Storage::Int(3), Storage::String(b"w".to_vec()))
            .unwrap();
        let keys: Vec<_> = desc
            .entries(&storage)
            .unwrap()
            .iter()
            .map(|e| entry_key(e).clone())
            .collect();
        assert_eq!(keys, vec![Storage::Int(1), Storage::Int(3), Storage::Int(5)]);
        assert_eq!(
            desc.lookup(&storage, &Storage::Int(3)).unwrap(),
            Some(&Storage::String(b"w".to_vec()))
        );
    }

    #[test]
    fn test_map_lookup_mut_defaults_only_on_miss() {
        let map = crate::type_of::<std::collections::BTreeMap<i32, i32>>();
        let desc = map.as_map().unwrap();
        let mut storage = Storage::Map(vec![Storage::Tuple(vec![
            Storage::Int(1),
            Storage::Int(10),
        ])]);

        let hit = desc
            .lookup_mut(&mut storage, Storage::Int(1), || Err(Error::NullPointer))
            .unwrap();
        assert_eq!(hit, Some(&mut Storage::Int(10)));

        let miss = desc
            .lookup_mut(&mut storage, Storage::Int(2), || Ok(None))
            .unwrap();
        assert!(miss.is_none());
        assert_eq!(desc.size(&storage).unwrap(), 1);

        assert_eq!(
            desc.lookup_mut(&mut storage, Storage::Int(2), || Err(Error::NullPointer)),
            Err(Error::NullPointer)
        );
        desc.lookup_mut(&mut storage, Storage::Int(2), || Ok(Some(Storage::Int(0))))
            .unwrap();
        assert_eq!(desc.size(&storage).unwrap(), 2);
    }
}
