// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type information.
//!
//! Every native type used through the generic value layer is described by a
//! single [`TypeDescriptor`], built lazily on first use and never freed.
//!
//! # Example
//!
//! ```rust
//! use dyntype::{type_of, Kind};
//!
//! let list = type_of::<Vec<i32>>();
//! assert_eq!(list.kind(), Kind::List);
//! assert_eq!(list.as_list().unwrap().element_type(), type_of::<i32>());
//! ```

mod descriptor;
mod kinds;
mod native;
mod registry;

pub use descriptor::{InheritanceOffset, Kind, TypeDescriptor, TypeInfo, TypeKind, TypeRef};
pub use kinds::{
    FloatDescriptor, IntDescriptor, IteratorDescriptor, ListDescriptor, MapDescriptor,
    PointerDescriptor, TupleDescriptor,
};
pub use native::{Obj, RawBuffer};
pub use registry::{type_of, FromStorage, Reflect, TypeRegistry};
