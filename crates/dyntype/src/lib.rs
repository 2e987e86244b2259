// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dyntype - runtime type layer for RPC middleware
//!
//! Values of arbitrary native types behind one uniform handle: introspect
//! them, convert them between compatible representations, order them, and
//! pass them to callables registered once and invoked later by name.
//!
//! ## Quick Start
//!
//! ```rust
//! use dyntype::{type_of, GenericFunction, Value};
//!
//! // Any native value behind a generic handle
//! let list = Value::from_native(vec![1i32, 2, 3]);
//!
//! // Convert through the runtime type system
//! let floats = list.as_ref().convert_copy(type_of::<Vec<f64>>()).unwrap();
//! assert_eq!(floats.to::<Vec<f64>>().unwrap(), vec![1.0, 2.0, 3.0]);
//!
//! // Call a native function with generic arguments
//! let add = GenericFunction::new(|a: i64, b: i64| a + b);
//! let sum = add
//!     .call(&[Value::from_native(3u8).as_ref(), Value::from_native(4i32).as_ref()])
//!     .unwrap();
//! assert_eq!(sum.to::<i64>().unwrap(), 7);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   GenericFunction / ObjectPtr / ObjectFactoryRegistry   (dispatch)  |
//! +---------------------------------------------------------------------+
//! |   Converter (+ ProxyRegistry)  |  compare  |  container protocol    |
//! +---------------------------------------------------------------------+
//! |   Value / ValueRef / ValueMut  over  Storage                        |
//! +---------------------------------------------------------------------+
//! |   TypeRegistry -> TypeDescriptor (Kind + capabilities)              |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TypeDescriptor`] | Per-type singleton: kind and kind-specific capabilities |
//! | [`Value`] | Owning generic value |
//! | [`ValueRef`] | Borrowed generic value |
//! | [`Converted`] | Conversion result tagged borrowed / alias / owned |
//! | [`GenericFunction`] | Type-erased callable |
//! | [`ObjectPtr`] | Generic object with a method table |
//!
//! ## Modules Overview
//!
//! - [`types`] - descriptors, the type registry and built-in native types
//! - [`value`] - handles, storage and the container protocol
//! - [`convert`] - conversion engine
//! - [`compare`] - ordering of heterogeneous values
//! - [`proxy`] - proxy factories for remote objects
//! - [`function`] - callable erasure and receiver binding
//! - [`object`] / [`factory`] - generic objects and named factories
//! - [`config`] - runtime configuration

pub mod compare;
pub mod config;
pub mod convert;
pub mod error;
pub mod factory;
pub mod function;
pub mod object;
pub mod proxy;
pub mod types;
pub mod value;

pub use config::{ConversionConfig, ListFailurePolicy, RuntimeConfig};
pub use convert::{Converted, Converter};
pub use error::{Error, Result};
pub use factory::{ModuleLoader, ObjectFactory, ObjectFactoryRegistry};
pub use function::{FunctionType, GenericFunction, IntoGenericFunction};
pub use object::{GenericObject, ObjectBuilder, ObjectPtr};
pub use proxy::{ProxyFactory, ProxyRegistry};
pub use types::{
    type_of, FromStorage, InheritanceOffset, Kind, Obj, RawBuffer, Reflect, TypeDescriptor,
    TypeInfo, TypeKind, TypeRef, TypeRegistry,
};
pub use value::{Cursor, GenericIterator, ObjectRef, Storage, Value, ValueMut, ValueRef};

/// dyntype version string.
pub const VERSION: &str = "0.3.0";
