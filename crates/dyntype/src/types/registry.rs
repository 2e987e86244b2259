// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide type registry.
//!
//! Lookups hit a `DashMap` and never block each other. A miss takes the
//! construction lock, re-checks, then builds and leaks the descriptor, so a
//! type is built at most once even under concurrent first access. The lock is
//! re-entrant because building a composite type registers its element types.

use super::descriptor::{
    InheritanceOffset, Kind, TypeDescriptor, TypeInfo, TypeKind, TypeRef,
};
use super::kinds::{IteratorDescriptor, TupleDescriptor};
use crate::error::{Error, Result};
use crate::function::FunctionType;
use crate::value::Storage;
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

/// A native type usable through generic values.
pub trait Reflect: Sized + 'static {
    /// Human readable name, also used in error messages.
    fn type_name() -> String;

    /// Capabilities of this type. Element types are obtained from `registry`.
    fn build_kind(registry: &TypeRegistry) -> TypeKind;

    /// Move the native value into generic storage.
    fn into_storage(self) -> Storage;
}

/// A native type that can be rebuilt from storage of its own shape.
pub trait FromStorage: Sized {
    /// `None` when `storage` does not have the expected shape.
    fn from_storage(storage: &Storage) -> Option<Self>;
}

static TYPE_REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

/// Descriptor of `T` from the global registry.
pub fn type_of<T: Reflect>() -> TypeRef {
    TypeRegistry::global().get::<T>()
}

/// Registry of type descriptors, function signatures and inheritance
/// relations.
pub struct TypeRegistry {
    native: DashMap<TypeId, TypeRef>,
    synthetic: DashMap<Arc<str>, TypeRef>,
    functions: DashMap<TypeId, Arc<FunctionType>>,
    iterators: DashMap<usize, TypeRef>,
    inheritance: DashMap<TypeInfo, Vec<(TypeRef, InheritanceOffset)>>,
    construction: ReentrantMutex<()>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            native: DashMap::new(),
            synthetic: DashMap::new(),
            functions: DashMap::new(),
            iterators: DashMap::new(),
            inheritance: DashMap::new(),
            construction: ReentrantMutex::new(()),
        }
    }

    pub fn global() -> &'static TypeRegistry {
        TYPE_REGISTRY.get_or_init(TypeRegistry::new)
    }

    /// Descriptor of native type `T`, built on first use.
    pub fn get<T: Reflect>(&self) -> TypeRef {
        let id = TypeId::of::<T>();
        if let Some(ty) = self.native.get(&id) {
            return *ty;
        }

        let _guard = self.construction.lock();
        if let Some(ty) = self.native.get(&id) {
            return *ty;
        }

        let kind = T::build_kind(self);
        let ty: TypeRef = Box::leak(Box::new(TypeDescriptor::new(
            TypeInfo::Native(id),
            T::type_name(),
            kind,
        )));
        self.native.insert(id, ty);
        log::debug!("type registry: registered '{}' ({})", ty.name(), ty.kind());
        ty
    }

    /// Number of registered native and synthetic descriptors.
    pub fn len(&self) -> usize {
        self.native.len() + self.synthetic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn synthetic_or_build<F>(&self, key: String, build: F) -> TypeRef
    where
        F: FnOnce(Arc<str>) -> TypeDescriptor,
    {
        if let Some(ty) = self.synthetic.get(key.as_str()) {
            return *ty;
        }

        let _guard = self.construction.lock();
        if let Some(ty) = self.synthetic.get(key.as_str()) {
            return *ty;
        }

        let key: Arc<str> = key.into();
        let ty: TypeRef = Box::leak(Box::new(build(Arc::clone(&key))));
        self.synthetic.insert(key, ty);
        log::debug!("type registry: registered synthetic '{}'", ty.name());
        ty
    }

    /// Tuple type assembled at runtime from `members`.
    ///
    /// Repeated calls with the same member descriptors return the same
    /// descriptor.
    pub fn tuple_type(&self, members: &[TypeRef]) -> TypeRef {
        let key = format!(
            "tuple<{}>",
            members
                .iter()
                .map(|m| format!("{:p}", *m))
                .collect::<Vec<_>>()
                .join(",")
        );
        self.synthetic_or_build(key, |info| {
            let name = format!(
                "({})",
                members
                    .iter()
                    .map(|m| m.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            TypeDescriptor::new(
                TypeInfo::Synthetic(info),
                name,
                TypeKind::Tuple(TupleDescriptor::new(members.to_vec())),
            )
        })
    }

    /// Iterator type over values of `container` type.
    ///
    /// Cached by descriptor address, so repeated calls skip building the
    /// synthetic key.
    pub fn iterator_type(&self, container: TypeRef) -> TypeRef {
        let address = container as *const TypeDescriptor as usize;
        if let Some(ty) = self.iterators.get(&address) {
            return *ty;
        }

        let key = format!("iter<{:p}>", container);
        let ty = self.synthetic_or_build(key, |info| {
            TypeDescriptor::new(
                TypeInfo::Synthetic(info),
                format!("Iterator<{}>", container.name()),
                TypeKind::Iterator(IteratorDescriptor::new(container)),
            )
        });
        self.iterators.insert(address, ty);
        ty
    }

    /// Signature of the callable type `S`, introspected once.
    pub fn function_type<S, F>(&self, build: F) -> Arc<FunctionType>
    where
        S: 'static,
        F: FnOnce(&TypeRegistry) -> FunctionType,
    {
        let id = TypeId::of::<S>();
        if let Some(ty) = self.functions.get(&id) {
            return Arc::clone(&ty);
        }

        let _guard = self.construction.lock();
        if let Some(ty) = self.functions.get(&id) {
            return Arc::clone(&ty);
        }

        let ty = Arc::new(build(self));
        self.functions.insert(id, Arc::clone(&ty));
        log::debug!("type registry: registered signature {}", ty.signature());
        ty
    }

    /// Declare that object type `D` contains a view of object type `B` at
    /// `offset`.
    pub fn declare_inheritance<D: Reflect, B: Reflect>(
        &self,
        offset: InheritanceOffset,
    ) -> Result<()> {
        self.declare_inheritance_of(self.get::<D>(), self.get::<B>(), offset)
    }

    pub fn declare_inheritance_of(
        &self,
        derived: TypeRef,
        base: TypeRef,
        offset: InheritanceOffset,
    ) -> Result<()> {
        for ty in [derived, base] {
            if ty.kind() != Kind::Object {
                return Err(Error::invalid_operation("declare_inheritance", ty.kind()));
            }
        }

        let mut bases = self.inheritance.entry(derived.info().clone()).or_default();
        match bases.iter_mut().find(|(b, _)| b.same_type(base)) {
            Some(entry) => entry.1 = offset,
            None => bases.push((base, offset)),
        }
        log::debug!(
            "type registry: '{}' inherits '{}' at offset {}",
            derived.name(),
            base.name(),
            offset.bytes()
        );
        Ok(())
    }

    /// Offset of the `base` view inside a `derived` object, if `derived`
    /// inherits from `base` directly or transitively.
    ///
    /// Every type inherits from itself at offset zero.
    pub fn inherits(&self, derived: &TypeDescriptor, base: &TypeDescriptor) -> Option<InheritanceOffset> {
        if derived.same_type(base) {
            return Some(InheritanceOffset::ZERO);
        }

        let mut visited = HashSet::new();
        let mut stack = vec![(derived.info().clone(), InheritanceOffset::ZERO)];
        while let Some((info, offset)) = stack.pop() {
            if !visited.insert(info.clone()) {
                continue;
            }
            // Snapshot so no shard lock is held while walking.
            let bases = match self.inheritance.get(&info) {
                Some(bases) => bases.clone(),
                None => continue,
            };
            for (b, delta) in bases {
                let total = offset + delta;
                if b.same_type(base) {
                    return Some(total);
                }
                stack.push((b.info().clone(), total));
            }
        }
        None
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntDescriptor;

    struct Animal;
    struct Dog;
    struct Puppy;
    crate::object_type!(Animal);
    crate::object_type!(Dog);
    crate::object_type!(Puppy);

    #[test]
    fn test_get_is_singleton() {
        let registry = TypeRegistry::new();
        let a = registry.get::<i32>();
        let b = registry.get::<i32>();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.as_int(), Some(&IntDescriptor::new(32, true)));
    }

    #[test]
    fn test_composite_registers_elements() {
        let registry = TypeRegistry::new();
        let list = registry.get::<Vec<Vec<u8>>>();
        assert_eq!(registry.len(), 3);
        let inner = list.as_list().unwrap().element_type();
        assert!(std::ptr::eq(inner, registry.get::<Vec<u8>>()));
    }

    #[test]
    fn test_tuple_type_is_cached() {
        let registry = TypeRegistry::new();
        let members = [registry.get::<i32>(), registry.get::<String>()];
        let a = registry.tuple_type(&members);
        let b = registry.tuple_type(&members);
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.name(), "(i32, String)");
        assert_eq!(a.as_tuple().unwrap().arity(), 2);
    }

    #[test]
    fn test_iterator_type_is_cached() {
        let registry = TypeRegistry::new();
        let list = registry.get::<Vec<u8>>();
        let a = registry.iterator_type(list);
        let before = registry.len();
        let b = registry.iterator_type(list);
        assert!(std::ptr::eq(a, b));
        assert_eq!(registry.len(), before);
        assert_eq!(a.kind(), Kind::Iterator);
        assert_eq!(a.name(), "Iterator<Vec<u8>>");
    }

    #[test]
    fn test_inherits_transitively() {
        let registry = TypeRegistry::new();
        registry
            .declare_inheritance::<Dog, Animal>(InheritanceOffset::new(8))
            .unwrap();
        registry
            .declare_inheritance::<Puppy, Dog>(InheritanceOffset::new(16))
            .unwrap();

        let puppy = registry.get::<Puppy>();
        let animal = registry.get::<Animal>();
        assert_eq!(registry.inherits(puppy, animal), Some(InheritanceOffset::new(24)));
        assert_eq!(registry.inherits(animal, puppy), None);
        assert_eq!(registry.inherits(puppy, puppy), Some(InheritanceOffset::ZERO));
    }

    #[test]
    fn test_inheritance_rejects_non_objects() {
        let registry = TypeRegistry::new();
        let err = registry
            .declare_inheritance::<i32, Animal>(InheritanceOffset::ZERO)
            .unwrap_err();
        assert_eq!(err, Error::invalid_operation("declare_inheritance", Kind::Int));
    }
}
