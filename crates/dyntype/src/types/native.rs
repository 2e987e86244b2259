// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptors for built-in native types.

use super::descriptor::{TypeKind, TypeRef};
use super::kinds::{
    FloatDescriptor, IntDescriptor, ListDescriptor, MapDescriptor, PointerDescriptor,
    TupleDescriptor,
};
use super::registry::{type_of, FromStorage, Reflect, TypeRegistry};
use crate::compare;
use crate::value::{ObjectRef, Storage, Value};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

// ============================================================================
// Scalars
// ============================================================================

impl Reflect for () {
    fn type_name() -> String {
        "()".to_string()
    }

    fn build_kind(_: &TypeRegistry) -> TypeKind {
        TypeKind::Void
    }

    fn into_storage(self) -> Storage {
        Storage::Void
    }
}

impl FromStorage for () {
    fn from_storage(storage: &Storage) -> Option<Self> {
        matches!(storage, Storage::Void).then_some(())
    }
}

impl Reflect for bool {
    fn type_name() -> String {
        "bool".to_string()
    }

    fn build_kind(_: &TypeRegistry) -> TypeKind {
        TypeKind::Int(IntDescriptor::BOOL)
    }

    fn into_storage(self) -> Storage {
        Storage::Int(u64::from(self))
    }
}

impl FromStorage for bool {
    fn from_storage(storage: &Storage) -> Option<Self> {
        match storage {
            Storage::Int(bits) => Some(*bits != 0),
            _ => None,
        }
    }
}

/// Implement Reflect/FromStorage for an integer type.
///
/// `$wide` is the 64-bit type of the same signedness, used to sign-extend.
macro_rules! impl_int {
    ($($ty:ty => $bits:expr, $signed:expr, $wide:ty);* $(;)?) => {
        $(
            impl Reflect for $ty {
                fn type_name() -> String {
                    stringify!($ty).to_string()
                }

                fn build_kind(_: &TypeRegistry) -> TypeKind {
                    TypeKind::Int(IntDescriptor::new($bits, $signed))
                }

                fn into_storage(self) -> Storage {
                    Storage::Int(self as $wide as u64)
                }
            }

            impl FromStorage for $ty {
                fn from_storage(storage: &Storage) -> Option<Self> {
                    match storage {
                        Storage::Int(bits) => Some(*bits as $wide as $ty),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_int! {
    i8 => 8, true, i64;
    i16 => 16, true, i64;
    i32 => 32, true, i64;
    i64 => 64, true, i64;
    u8 => 8, false, u64;
    u16 => 16, false, u64;
    u32 => 32, false, u64;
    u64 => 64, false, u64;
}

macro_rules! impl_float {
    ($($ty:ty => $bits:expr);* $(;)?) => {
        $(
            impl Reflect for $ty {
                fn type_name() -> String {
                    stringify!($ty).to_string()
                }

                fn build_kind(_: &TypeRegistry) -> TypeKind {
                    TypeKind::Float(FloatDescriptor::new($bits))
                }

                fn into_storage(self) -> Storage {
                    Storage::Float(f64::from(self))
                }
            }

            impl FromStorage for $ty {
                fn from_storage(storage: &Storage) -> Option<Self> {
                    match storage {
                        Storage::Float(v) => Some(*v as $ty),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_float! {
    f32 => 32;
    f64 => 64;
}

impl Reflect for String {
    fn type_name() -> String {
        "String".to_string()
    }

    fn build_kind(_: &TypeRegistry) -> TypeKind {
        TypeKind::String
    }

    fn into_storage(self) -> Storage {
        Storage::String(self.into_bytes())
    }
}

impl FromStorage for String {
    fn from_storage(storage: &Storage) -> Option<Self> {
        match storage {
            Storage::String(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }
}

/// Opaque byte buffer, the native type of kind Raw.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RawBuffer(pub Vec<u8>);

impl Reflect for RawBuffer {
    fn type_name() -> String {
        "RawBuffer".to_string()
    }

    fn build_kind(_: &TypeRegistry) -> TypeKind {
        TypeKind::Raw
    }

    fn into_storage(self) -> Storage {
        Storage::Raw(self.0)
    }
}

impl FromStorage for RawBuffer {
    fn from_storage(storage: &Storage) -> Option<Self> {
        match storage {
            Storage::Raw(bytes) => Some(RawBuffer(bytes.clone())),
            _ => None,
        }
    }
}

impl Reflect for Value {
    fn type_name() -> String {
        "Value".to_string()
    }

    fn build_kind(_: &TypeRegistry) -> TypeKind {
        TypeKind::Dynamic
    }

    fn into_storage(self) -> Storage {
        Storage::Dynamic(Box::new(self))
    }
}

impl FromStorage for Value {
    fn from_storage(storage: &Storage) -> Option<Self> {
        match storage {
            Storage::Dynamic(inner) => Some(Value::clone(inner)),
            _ => None,
        }
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<T: Reflect> Reflect for Vec<T> {
    fn type_name() -> String {
        format!("Vec<{}>", T::type_name())
    }

    fn build_kind(registry: &TypeRegistry) -> TypeKind {
        TypeKind::List(ListDescriptor::new(registry.get::<T>()))
    }

    fn into_storage(self) -> Storage {
        Storage::List(self.into_iter().map(Reflect::into_storage).collect())
    }
}

impl<T: FromStorage> FromStorage for Vec<T> {
    fn from_storage(storage: &Storage) -> Option<Self> {
        match storage {
            Storage::List(items) => items.iter().map(T::from_storage).collect(),
            _ => None,
        }
    }
}

fn map_kind<K: Reflect, V: Reflect>(registry: &TypeRegistry) -> TypeKind {
    TypeKind::Map(MapDescriptor::new(
        registry.get::<K>(),
        registry.get::<V>(),
        registry.get::<(K, V)>(),
    ))
}

/// Build map storage with entries sorted by the key type's comparator.
fn map_storage(key: TypeRef, pairs: impl Iterator<Item = (Storage, Storage)>) -> Storage {
    let mut entries: Vec<Storage> = pairs.map(|(k, v)| Storage::Tuple(vec![k, v])).collect();
    entries.sort_by(|a, b| compare::storage_cmp(key, entry_key(a), entry_key(b)));
    entries.dedup_by(|a, b| compare::storage_cmp(key, entry_key(a), entry_key(b)).is_eq());
    Storage::Map(entries)
}

fn entry_key(entry: &Storage) -> &Storage {
    match entry {
        Storage::Tuple(pair) => pair.first().unwrap_or(&Storage::Void),
        other => other,
    }
}

fn map_pairs<K: FromStorage, V: FromStorage>(
    storage: &Storage,
) -> Option<impl Iterator<Item = Option<(K, V)>> + '_> {
    match storage {
        Storage::Map(entries) => Some(entries.iter().map(|entry| match entry {
            Storage::Tuple(pair) if pair.len() == 2 => {
                Some((K::from_storage(&pair[0])?, V::from_storage(&pair[1])?))
            }
            _ => None,
        })),
        _ => None,
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_name() -> String {
        format!("BTreeMap<{}, {}>", K::type_name(), V::type_name())
    }

    fn build_kind(registry: &TypeRegistry) -> TypeKind {
        map_kind::<K, V>(registry)
    }

    fn into_storage(self) -> Storage {
        map_storage(
            type_of::<K>(),
            self.into_iter().map(|(k, v)| (k.into_storage(), v.into_storage())),
        )
    }
}

impl<K: FromStorage + Ord, V: FromStorage> FromStorage for BTreeMap<K, V> {
    fn from_storage(storage: &Storage) -> Option<Self> {
        map_pairs::<K, V>(storage)?.collect()
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn type_name() -> String {
        format!("HashMap<{}, {}>", K::type_name(), V::type_name())
    }

    fn build_kind(registry: &TypeRegistry) -> TypeKind {
        map_kind::<K, V>(registry)
    }

    fn into_storage(self) -> Storage {
        map_storage(
            type_of::<K>(),
            self.into_iter().map(|(k, v)| (k.into_storage(), v.into_storage())),
        )
    }
}

impl<K: FromStorage + Eq + Hash, V: FromStorage> FromStorage for HashMap<K, V> {
    fn from_storage(storage: &Storage) -> Option<Self> {
        map_pairs::<K, V>(storage)?.collect()
    }
}

macro_rules! impl_tuple {
    ($($len:expr => ($($name:ident $idx:tt),+));* $(;)?) => {
        $(
            impl<$($name: Reflect),+> Reflect for ($($name,)+) {
                fn type_name() -> String {
                    let names: Vec<String> = vec![$($name::type_name()),+];
                    format!("({})", names.join(", "))
                }

                fn build_kind(registry: &TypeRegistry) -> TypeKind {
                    TypeKind::Tuple(TupleDescriptor::new(vec![$(registry.get::<$name>()),+]))
                }

                fn into_storage(self) -> Storage {
                    Storage::Tuple(vec![$(self.$idx.into_storage()),+])
                }
            }

            impl<$($name: FromStorage),+> FromStorage for ($($name,)+) {
                fn from_storage(storage: &Storage) -> Option<Self> {
                    match storage {
                        Storage::Tuple(members) if members.len() == $len => {
                            Some(($($name::from_storage(&members[$idx])?,)+))
                        }
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_tuple! {
    1 => (A 0);
    2 => (A 0, B 1);
    3 => (A 0, B 1, C 2);
    4 => (A 0, B 1, C 2, D 3);
}

// ============================================================================
// Objects
// ============================================================================

/// Typed pointer to a shared object instance, the native type of a pointer
/// to an Object kind type.
///
/// Method receivers are declared as `Obj<T>`; conversion from a `T` value
/// re-wraps the instance without copying it.
#[derive(Debug)]
pub struct Obj<T>(Arc<T>);

impl<T> Obj<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn from_arc(value: Arc<T>) -> Self {
        Self(value)
    }

    pub fn into_arc(self) -> Arc<T> {
        self.0
    }
}

impl<T> Clone for Obj<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for Obj<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Reflect + Any + Send + Sync> Reflect for Obj<T> {
    fn type_name() -> String {
        format!("Obj<{}>", T::type_name())
    }

    fn build_kind(registry: &TypeRegistry) -> TypeKind {
        TypeKind::Pointer(PointerDescriptor::new(registry.get::<T>()))
    }

    fn into_storage(self) -> Storage {
        Storage::Pointer(Some(Box::new(Storage::Object(ObjectRef::from_arc(self.0)))))
    }
}

impl<T: Any + Send + Sync> FromStorage for Obj<T> {
    fn from_storage(storage: &Storage) -> Option<Self> {
        match storage {
            Storage::Pointer(Some(target)) => Self::from_storage(target),
            Storage::Object(object) => object.downcast_arc::<T>().map(Obj),
            _ => None,
        }
    }
}

/// Declare a native struct as an Object kind type.
///
/// ```rust
/// struct Counter {
///     start: i32,
/// }
/// dyntype::object_type!(Counter, "Counter");
///
/// let ty = dyntype::type_of::<Counter>();
/// assert_eq!(ty.kind(), dyntype::Kind::Object);
/// ```
#[macro_export]
macro_rules! object_type {
    ($ty:ty) => {
        $crate::object_type!($ty, stringify!($ty));
    };
    ($ty:ty, $name:expr) => {
        impl $crate::Reflect for $ty {
            fn type_name() -> ::std::string::String {
                ::std::string::String::from($name)
            }

            fn build_kind(_: &$crate::TypeRegistry) -> $crate::TypeKind {
                $crate::TypeKind::Object
            }

            fn into_storage(self) -> $crate::Storage {
                $crate::Storage::Object($crate::ObjectRef::new(self))
            }
        }
    };
}
