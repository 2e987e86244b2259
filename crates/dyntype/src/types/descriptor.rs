// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.

use super::kinds::{
    FloatDescriptor, IntDescriptor, IteratorDescriptor, ListDescriptor, MapDescriptor,
    PointerDescriptor, TupleDescriptor,
};
use crate::value::{Storage, Value};
use std::any::TypeId;
use std::fmt;
use std::ops::Add;
use std::sync::Arc;

/// Reference to a registered descriptor.
///
/// Descriptors are process-wide singletons that are never freed, so plain
/// `'static` references are shared freely between values and threads.
pub type TypeRef = &'static TypeDescriptor;

/// Coarse category of a native type.
///
/// The declaration order is the tie-break order used when comparing values
/// of unrelated kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Void,
    Int,
    Float,
    String,
    List,
    Map,
    Tuple,
    Pointer,
    Object,
    Dynamic,
    Raw,
    Iterator,
    Unknown,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Void => "Void",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::List => "List",
            Self::Map => "Map",
            Self::Tuple => "Tuple",
            Self::Pointer => "Pointer",
            Self::Object => "Object",
            Self::Dynamic => "Dynamic",
            Self::Raw => "Raw",
            Self::Iterator => "Iterator",
            Self::Unknown => "Unknown",
        }
    }

    /// List, Map and Tuple values hold elements.
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Map | Self::Tuple)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity key of a described type.
///
/// Two descriptors with equal `TypeInfo` describe the same native type even
/// if they are distinct instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    /// A native Rust type.
    Native(TypeId),
    /// A type assembled at runtime (tuples built from a list, iterators),
    /// keyed by its structural signature.
    Synthetic(Arc<str>),
}

/// Byte displacement from a derived object view to one of its base views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct InheritanceOffset(usize);

impl InheritanceOffset {
    pub const ZERO: Self = Self(0);

    pub const fn new(bytes: usize) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> usize {
        self.0
    }
}

impl Add for InheritanceOffset {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// Kind plus the kind-specific capabilities of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Void,
    Int(IntDescriptor),
    Float(FloatDescriptor),
    String,
    List(ListDescriptor),
    Map(MapDescriptor),
    Tuple(TupleDescriptor),
    Pointer(PointerDescriptor),
    /// Object instances; inheritance lives in the registry's relation table.
    Object,
    Dynamic,
    Raw,
    Iterator(IteratorDescriptor),
    Unknown,
}

impl TypeKind {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Void => Kind::Void,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::String => Kind::String,
            Self::List(_) => Kind::List,
            Self::Map(_) => Kind::Map,
            Self::Tuple(_) => Kind::Tuple,
            Self::Pointer(_) => Kind::Pointer,
            Self::Object => Kind::Object,
            Self::Dynamic => Kind::Dynamic,
            Self::Raw => Kind::Raw,
            Self::Iterator(_) => Kind::Iterator,
            Self::Unknown => Kind::Unknown,
        }
    }
}

/// A complete type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    info: TypeInfo,
    name: String,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(info: TypeInfo, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            info,
            name: name.into(),
            kind,
        }
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind.kind()
    }

    /// Kind-specific capabilities.
    pub fn type_kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Same instance, or same identity key.
    pub fn same_type(&self, other: &TypeDescriptor) -> bool {
        std::ptr::eq(self, other) || self.info == other.info
    }

    pub fn as_int(&self) -> Option<&IntDescriptor> {
        match &self.kind {
            TypeKind::Int(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&FloatDescriptor> {
        match &self.kind {
            TypeKind::Float(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListDescriptor> {
        match &self.kind {
            TypeKind::List(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapDescriptor> {
        match &self.kind {
            TypeKind::Map(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleDescriptor> {
        match &self.kind {
            TypeKind::Tuple(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerDescriptor> {
        match &self.kind {
            TypeKind::Pointer(d) => Some(d),
            _ => None,
        }
    }

    /// Pointer whose pointee is an Object type.
    pub fn is_object_pointer(&self) -> bool {
        self.as_pointer()
            .is_some_and(|p| p.pointee().kind() == Kind::Object)
    }

    /// Fresh storage holding this type's default value.
    ///
    /// Objects, iterators and unknown types have no default and yield `None`.
    pub fn default_storage(&self) -> Option<Storage> {
        match &self.kind {
            TypeKind::Void => Some(Storage::Void),
            TypeKind::Int(_) => Some(Storage::Int(0)),
            TypeKind::Float(_) => Some(Storage::Float(0.0)),
            TypeKind::String => Some(Storage::String(Vec::new())),
            TypeKind::List(_) => Some(Storage::List(Vec::new())),
            TypeKind::Map(_) => Some(Storage::Map(Vec::new())),
            TypeKind::Tuple(t) => t
                .members()
                .iter()
                .map(|m| m.default_storage())
                .collect::<Option<Vec<_>>>()
                .map(Storage::Tuple),
            TypeKind::Pointer(_) => Some(Storage::Pointer(None)),
            TypeKind::Dynamic => Some(Storage::Dynamic(Box::new(Value::invalid()))),
            TypeKind::Raw => Some(Storage::Raw(Vec::new())),
            TypeKind::Object | TypeKind::Iterator(_) | TypeKind::Unknown => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order() {
        assert!(Kind::Int < Kind::Float);
        assert!(Kind::Float < Kind::String);
        assert!(Kind::Void < Kind::Unknown);
    }

    #[test]
    fn test_offset_add() {
        let a = InheritanceOffset::new(8);
        let b = InheritanceOffset::new(4);
        assert_eq!((a + b).bytes(), 12);
        assert_eq!(InheritanceOffset::ZERO.bytes(), 0);
    }

    #[test]
    fn test_same_type_by_info() {
        let a = TypeDescriptor::new(TypeInfo::Synthetic("x".into()), "x", TypeKind::Raw);
        let b = TypeDescriptor::new(TypeInfo::Synthetic("x".into()), "x2", TypeKind::Raw);
        let c = TypeDescriptor::new(TypeInfo::Synthetic("y".into()), "x", TypeKind::Raw);
        assert!(a.same_type(&b));
        assert!(!a.same_type(&c));
    }

    #[test]
    fn test_default_storage() {
        let int = TypeDescriptor::new(
            TypeInfo::Synthetic("i".into()),
            "i",
            TypeKind::Int(IntDescriptor::new(32, true)),
        );
        assert_eq!(int.default_storage(), Some(Storage::Int(0)));

        let object = TypeDescriptor::new(TypeInfo::Synthetic("o".into()), "o", TypeKind::Object);
        assert!(object.default_storage().is_none());
    }
}
