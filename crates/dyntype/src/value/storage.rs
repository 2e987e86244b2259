// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Storage shapes behind generic values.
//!
//! A [`Storage`] carries no type information of its own; it is only
//! meaningful together with the descriptor it was built for.

use super::Value;
use crate::types::InheritanceOffset;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Value storage, one shape per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Void,
    /// 64-bit pattern: sign-extended for signed types.
    Int(u64),
    Float(f64),
    /// Byte string, not required to be UTF-8.
    String(Vec<u8>),
    List(Vec<Storage>),
    /// `(key, element)` tuple entries sorted by key.
    Map(Vec<Storage>),
    Tuple(Vec<Storage>),
    Pointer(Option<Box<Storage>>),
    Object(ObjectRef),
    Dynamic(Box<Value>),
    Raw(Vec<u8>),
    Iterator(Cursor),
}

impl Storage {
    /// Address identifying this storage.
    ///
    /// Objects report their instance address plus view offset; pointers the
    /// address of their target. Everything else reports where the storage
    /// itself lives.
    pub fn address(&self) -> usize {
        match self {
            Self::Object(object) => object.address(),
            Self::Pointer(Some(target)) => target.address(),
            Self::Pointer(None) => 0,
            other => other as *const Storage as usize,
        }
    }
}

/// Shared object instance seen through one of its type views.
///
/// Re-basing to a base type view keeps the same instance and accumulates the
/// inheritance offset, so `address()` moves by exactly that offset.
#[derive(Clone)]
pub struct ObjectRef {
    data: Arc<dyn Any + Send + Sync>,
    offset: InheritanceOffset,
}

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            data: value,
            offset: InheritanceOffset::ZERO,
        }
    }

    /// Instance address plus view offset.
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.data) as *const () as usize + self.offset.bytes()
    }

    pub fn offset(&self) -> InheritanceOffset {
        self.offset
    }

    /// The same instance viewed `by` bytes further.
    #[must_use]
    pub fn rebased(&self, by: InheritanceOffset) -> Self {
        Self {
            data: Arc::clone(&self.data),
            offset: self.offset + by,
        }
    }

    /// Typed access to the instance; requires its concrete type.
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.data).downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Both refer to the same instance, whatever their views.
    pub fn same_object(&self, other: &ObjectRef) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.data) as *const (),
            Arc::as_ptr(&other.data) as *const (),
        )
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_object(other) && self.offset == other.offset
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("offset", &self.offset.bytes())
            .finish()
    }
}

/// Iteration cursor: container address and element position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub container: usize,
    pub position: usize,
}
