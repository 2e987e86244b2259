// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Container protocol over List, Map and Tuple values.

use super::{Cursor, Storage, Value, ValueMut, ValueRef};
use crate::compare;
use crate::error::{Error, Result};
use crate::types::{Kind, TypeKind, TypeRef, TypeRegistry};
use std::fmt;

fn type_kind(ty: Option<TypeRef>) -> Option<&'static TypeKind> {
    ty.map(|t| t.type_kind())
}

/// Integer position from a key value; negative positions are out of range.
fn position(key: ValueRef<'_>, length: usize) -> Result<Option<usize>> {
    let index = key.to_int()?;
    Ok(usize::try_from(index).ok().filter(|i| *i < length))
}

fn out_of_range(key: ValueRef<'_>, length: usize) -> Error {
    Error::Index {
        index: key.to_int().unwrap_or(-1),
        length,
    }
}

fn key_error(err: Error) -> Error {
    Error::Key(err.to_string())
}

impl<'a> ValueRef<'a> {
    /// Number of elements of a List, Map or Tuple.
    pub fn size(&self) -> Result<usize> {
        match type_kind(self.ty()) {
            Some(TypeKind::List(list)) => list.size(self.storage()),
            Some(TypeKind::Map(map)) => map.size(self.storage()),
            Some(TypeKind::Tuple(tuple)) => Ok(tuple.arity()),
            _ => Err(Error::invalid_operation("size", self.kind())),
        }
    }

    /// Read-only element access; a miss is `Ok(None)`.
    ///
    /// Lists and tuples take an integer position, maps a key convertible to
    /// their key type.
    pub fn get(&self, key: ValueRef<'_>) -> Result<Option<ValueRef<'a>>> {
        let storage = self.storage();
        match type_kind(self.ty()) {
            Some(TypeKind::List(list)) => {
                let items = list.items(storage)?;
                Ok(position(key, items.len())?
                    .map(|i| ValueRef::new(list.element_type(), &items[i])))
            }
            Some(TypeKind::Map(map)) => {
                let converted = key.convert(map.key_type()).map_err(key_error)?;
                Ok(map
                    .lookup(storage, converted.storage())?
                    .map(|s| ValueRef::new(map.element_type(), s)))
            }
            Some(TypeKind::Tuple(tuple)) => {
                let members = tuple.members();
                match position(key, members.len())? {
                    Some(i) => Ok(tuple.get(storage, i)?.map(|s| ValueRef::new(members[i], s))),
                    None => Ok(None),
                }
            }
            _ => Err(Error::invalid_operation("element", self.kind())),
        }
    }

    /// Target of a Pointer value.
    pub fn dereference(&self) -> Result<ValueRef<'a>> {
        match type_kind(self.ty()) {
            Some(TypeKind::Pointer(pointer)) => {
                let target = pointer.dereference(self.storage())?;
                Ok(ValueRef::new(pointer.pointee(), target))
            }
            _ => Err(Error::invalid_operation("dereference", self.kind())),
        }
    }

    fn cursor_at(&self, end: bool) -> Result<GenericIterator<'a>> {
        let ty = match self.ty() {
            Some(ty) if matches!(ty.kind(), Kind::List | Kind::Map) => ty,
            _ => return Err(Error::invalid_operation("iterate", self.kind())),
        };
        let position = if end { self.size()? } else { 0 };
        Ok(GenericIterator {
            container: *self,
            ty: TypeRegistry::global().iterator_type(ty),
            cursor: Storage::Iterator(Cursor {
                container: self.address(),
                position,
            }),
        })
    }

    /// Cursor on the first element of a List or Map.
    pub fn begin(&self) -> Result<GenericIterator<'a>> {
        self.cursor_at(false)
    }

    /// Cursor one past the last element of a List or Map.
    pub fn end(&self) -> Result<GenericIterator<'a>> {
        self.cursor_at(true)
    }

    /// Iterate elements (List) or `(key, element)` entries (Map).
    pub fn iter(&self) -> Result<GenericIterator<'a>> {
        self.begin()
    }

    /// Tuple view of a List or Tuple value.
    ///
    /// A homogeneous tuple repeats the list's element type. Otherwise the
    /// element type must be Dynamic and each member takes the type of the
    /// value it wraps.
    pub fn to_tuple(&self, homogeneous: bool) -> Result<Value> {
        let list = match type_kind(self.ty()) {
            Some(TypeKind::Tuple(_)) => return Ok(self.to_owned_value()),
            Some(TypeKind::List(list)) => list,
            _ => return Err(Error::Type("expected Tuple or List kind".to_string())),
        };
        let element = list.element_type();
        if !homogeneous && element.kind() != Kind::Dynamic {
            return Err(Error::Type(format!(
                "element type {} is not dynamic",
                element.name()
            )));
        }

        let mut types = Vec::new();
        let mut members = Vec::new();
        for item in self.iter()? {
            let member = if homogeneous { item } else { item.as_dynamic()? };
            let ty = member
                .ty()
                .ok_or_else(|| Error::Type("invalid dynamic element".to_string()))?;
            types.push(ty);
            members.push(member.storage().clone());
        }
        let ty = TypeRegistry::global().tuple_type(&types);
        Ok(Value::from_parts(ty, Storage::Tuple(members)))
    }
}

impl<'a> ValueMut<'a> {
    /// Mutable element access.
    ///
    /// `throw_on_failure` makes a List or Tuple index miss an `Index` error
    /// instead of `Ok(None)`. For maps the same flag requests auto-insertion
    /// of a default element on a key miss; without it a miss is `Ok(None)`.
    pub fn element(self, key: ValueRef<'_>, throw_on_failure: bool) -> Result<Option<ValueMut<'a>>> {
        let (ty, storage) = self.into_parts();
        let kind = ty.map_or(Kind::Void, |t| t.kind());
        match type_kind(ty) {
            Some(TypeKind::List(list)) => {
                let length = list.size(storage)?;
                match position(key, length)? {
                    Some(i) => Ok(list
                        .element_mut(storage, i)?
                        .map(|s| ValueMut::new(list.element_type(), s))),
                    None if throw_on_failure => Err(out_of_range(key, length)),
                    None => Ok(None),
                }
            }
            Some(TypeKind::Map(map)) => {
                let converted = key.convert(map.key_type()).map_err(key_error)?;
                let auto_insert = throw_on_failure;
                let element = map.element_type();
                let default = || {
                    if !auto_insert {
                        return Ok(None);
                    }
                    element
                        .default_storage()
                        .map(Some)
                        .ok_or_else(|| Error::invalid_operation("auto-insert", element.kind()))
                };
                Ok(map
                    .lookup_mut(storage, converted.into_storage(), default)?
                    .map(|s| ValueMut::new(element, s)))
            }
            Some(TypeKind::Tuple(tuple)) => {
                let members = tuple.members();
                match position(key, members.len())? {
                    Some(i) => Ok(tuple
                        .get_mut(storage, i)?
                        .map(|s| ValueMut::new(members[i], s))),
                    None if throw_on_failure => Err(out_of_range(key, members.len())),
                    None => Ok(None),
                }
            }
            _ => Err(Error::invalid_operation("element", kind)),
        }
    }

    /// Convert `element` to the list's element type and push it.
    pub fn append(&mut self, element: ValueRef<'_>) -> Result<()> {
        let kind = self.kind();
        let (ty, storage) = self.parts();
        match type_kind(ty) {
            Some(TypeKind::List(list)) => {
                let converted = element.convert(list.element_type())?;
                list.push_back(storage, converted.into_storage())
            }
            _ => Err(Error::invalid_operation("append", kind)),
        }
    }

    /// Convert `key` and `value` to the map's key and element types and
    /// insert, replacing any entry with an equal key.
    pub fn insert(&mut self, key: ValueRef<'_>, value: ValueRef<'_>) -> Result<()> {
        let kind = self.kind();
        let (ty, storage) = self.parts();
        match type_kind(ty) {
            Some(TypeKind::Map(map)) => {
                let key = key.convert(map.key_type()).map_err(key_error)?;
                let value = value.convert(map.element_type())?;
                map.insert(storage, key.into_storage(), value.into_storage())
            }
            _ => Err(Error::invalid_operation("insert", kind)),
        }
    }
}

/// Cursor over the elements of a List or the entries of a Map.
///
/// Two iterators are equal when they walk the same container and sit at the
/// same position.
#[derive(Clone)]
pub struct GenericIterator<'a> {
    container: ValueRef<'a>,
    ty: TypeRef,
    cursor: Storage,
}

impl<'a> GenericIterator<'a> {
    pub fn position(&self) -> usize {
        match &self.cursor {
            Storage::Iterator(cursor) => cursor.position,
            _ => 0,
        }
    }

    /// The cursor as a value of the container's iterator type.
    pub fn as_value(&self) -> ValueRef<'_> {
        ValueRef::new(self.ty, &self.cursor)
    }

    /// Element under the cursor; `None` at the end.
    pub fn get(&self) -> Option<ValueRef<'a>> {
        let storage = self.container.storage();
        let position = self.position();
        match type_kind(self.container.ty()) {
            Some(TypeKind::List(list)) => list
                .element(storage, position)
                .ok()
                .flatten()
                .map(|s| ValueRef::new(list.element_type(), s)),
            Some(TypeKind::Map(map)) => map
                .entries(storage)
                .ok()
                .and_then(|entries| entries.get(position))
                .map(|s| ValueRef::new(map.entry_type(), s)),
            _ => None,
        }
    }

    /// Move to the next element, stopping at the end.
    pub fn advance(&mut self) {
        let length = self.container.size().unwrap_or(0);
        if let Storage::Iterator(cursor) = &mut self.cursor {
            if cursor.position < length {
                cursor.position += 1;
            }
        }
    }
}

impl PartialEq for GenericIterator<'_> {
    fn eq(&self, other: &Self) -> bool {
        compare::equals(self.as_value(), other.as_value())
    }
}

impl<'a> Iterator for GenericIterator<'a> {
    type Item = ValueRef<'a>;

    fn next(&mut self) -> Option<ValueRef<'a>> {
        let item = self.get()?;
        self.advance();
        Some(item)
    }
}

impl fmt::Debug for GenericIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericIterator")
            .field("type", &self.ty.name())
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn v<T: crate::Reflect>(value: T) -> Value {
        Value::from_native(value)
    }

    #[test]
    fn test_list_get_and_size() {
        let list = v(vec![10i32, 20, 30]);
        let list = list.as_ref();
        assert_eq!(list.size().unwrap(), 3);
        assert_eq!(list.get(v(1i32).as_ref()).unwrap().unwrap().to_int().unwrap(), 20);
        assert!(list.get(v(3i32).as_ref()).unwrap().is_none());
        assert!(list.get(v(-1i32).as_ref()).unwrap().is_none());
    }

    #[test]
    fn test_list_element_throws_on_miss() {
        let mut list = v(vec![1i32]);
        let err = list.as_mut().element(v(5i32).as_ref(), true).unwrap_err();
        assert_eq!(err, Error::Index { index: 5, length: 1 });
        assert!(list.as_mut().element(v(5i32).as_ref(), false).unwrap().is_none());

        let mut first = list.as_mut().element(v(0i32).as_ref(), true).unwrap().unwrap();
        first.set_int(9).unwrap();
        assert_eq!(list.to::<Vec<i32>>().unwrap(), vec![9]);
    }

    #[test]
    fn test_map_element_auto_insert_is_coupled_to_throw() {
        let mut map = v(BTreeMap::<String, i32>::new());
        let key = v(String::from("a"));

        assert!(map.as_mut().element(key.as_ref(), false).unwrap().is_none());
        assert_eq!(map.as_ref().size().unwrap(), 0);

        let slot = map.as_mut().element(key.as_ref(), true).unwrap().unwrap();
        assert_eq!(slot.as_ref().to_int().unwrap(), 0);
        assert_eq!(map.as_ref().size().unwrap(), 1);
    }

    #[test]
    fn test_map_element_without_default_value() {
        let sensor = crate::ObjectBuilder::new("sensor").build();
        let mut map = v(BTreeMap::from([(String::from("k"), sensor.clone())]));

        let hit = map
            .as_mut()
            .element(v(String::from("k")).as_ref(), true)
            .unwrap()
            .unwrap();
        assert!(hit.as_ref().to::<crate::ObjectPtr>().unwrap().ptr_eq(&sensor));

        let missing = v(String::from("other"));
        assert!(map.as_mut().element(missing.as_ref(), false).unwrap().is_none());
        assert_eq!(
            map.as_mut().element(missing.as_ref(), true).unwrap_err(),
            Error::invalid_operation("auto-insert", Kind::Object)
        );
        assert_eq!(map.as_ref().size().unwrap(), 1);
    }

    #[test]
    fn test_map_key_error() {
        let mut map = v(BTreeMap::<i32, i32>::new());
        let err = map
            .as_mut()
            .element(v(vec![1i32]).as_ref(), true)
            .unwrap_err();
        assert!(matches!(err, Error::Key(_)));
    }

    #[test]
    fn test_append_converts() {
        let mut list = v(Vec::<f64>::new());
        list.as_mut().append(v(2i32).as_ref()).unwrap();
        list.as_mut().append(v(0.5f32).as_ref()).unwrap();
        assert_eq!(list.to::<Vec<f64>>().unwrap(), vec![2.0, 0.5]);

        let mut map = v(BTreeMap::<i32, i32>::new());
        assert_eq!(
            map.as_mut().append(v(1i32).as_ref()),
            Err(Error::invalid_operation("append", Kind::Map))
        );
    }

    #[test]
    fn test_insert_replaces_and_sorts() {
        let mut map = v(BTreeMap::<i64, String>::new());
        for (k, s) in [(3i32, "c"), (1, "a"), (3, "z")] {
            map.as_mut()
                .insert(v(k).as_ref(), v(String::from(s)).as_ref())
                .unwrap();
        }
        let native = map.to::<BTreeMap<i64, String>>().unwrap();
        assert_eq!(native.len(), 2);
        assert_eq!(native[&3], "z");

        let mut list = v(vec![1i32]);
        assert!(list
            .as_mut()
            .insert(v(0i32).as_ref(), v(0i32).as_ref())
            .is_err());
    }

    #[test]
    fn test_tuple_element() {
        let mut tuple = v((1i32, String::from("x")));
        assert_eq!(tuple.as_ref().size().unwrap(), 2);
        let mut second = tuple.as_mut().element(v(1u8).as_ref(), true).unwrap().unwrap();
        second.set_string("y").unwrap();
        assert_eq!(tuple.to::<(i32, String)>().unwrap().1, "y");
        assert!(tuple.as_mut().element(v(2u8).as_ref(), true).is_err());
    }

    #[test]
    fn test_element_on_scalar_is_invalid() {
        let mut x = v(1i32);
        assert_eq!(
            x.as_mut().element(v(0i32).as_ref(), false).unwrap_err(),
            Error::invalid_operation("element", Kind::Int)
        );
    }

    #[test]
    fn test_iterators() {
        let list = v(vec![1i32, 2, 3]);
        let list = list.as_ref();
        let mut it = list.begin().unwrap();
        let end = list.end().unwrap();
        let mut seen = Vec::new();
        while it != end {
            seen.push(it.get().unwrap().to_int().unwrap());
            it.advance();
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(it.get().is_none());
        it.advance();
        assert_eq!(it.position(), 3);
    }

    #[test]
    fn test_map_iteration_yields_entries() {
        let map = v(BTreeMap::from([(2i32, 20i32), (1, 10)]));
        let entries: Vec<(i32, i32)> = map
            .as_ref()
            .iter()
            .unwrap()
            .map(|e| e.to::<(i32, i32)>().unwrap())
            .collect();
        assert_eq!(entries, vec![(1, 10), (2, 20)]);
    }

    #[test]
    fn test_to_tuple() {
        let list = v(vec![1i32, 2]);
        let tuple = list.as_ref().to_tuple(true).unwrap();
        assert_eq!(tuple.kind(), Kind::Tuple);
        assert_eq!(tuple.as_ref().size().unwrap(), 2);
        assert!(matches!(list.as_ref().to_tuple(false), Err(Error::Type(_))));

        let dynamic = v(vec![v(1i32), v(String::from("s"))]);
        let tuple = dynamic.as_ref().to_tuple(false).unwrap();
        let members = tuple.ty().unwrap().as_tuple().unwrap().members().to_vec();
        assert_eq!(members, vec![crate::type_of::<i32>(), crate::type_of::<String>()]);

        assert!(matches!(v(1i32).as_ref().to_tuple(true), Err(Error::Type(_))));
    }

    #[test]
    fn test_dereference() {
        struct Thing;
        crate::object_type!(Thing);
        let ptr = v(crate::Obj::new(Thing));
        let target = ptr.as_ref().dereference().unwrap();
        assert_eq!(target.kind(), Kind::Object);
        assert!(v(1i32).as_ref().dereference().is_err());
    }
}
