// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic values: type-erased `(type, storage)` pairs.
//!
//! # Example
//!
//! ```rust
//! use dyntype::{type_of, Value};
//!
//! let mut list = Value::from_native(vec![1i32, 2]);
//! list.as_mut().append(Value::from_native(3.0f64).as_ref()).unwrap();
//!
//! let floats = list.as_ref().convert_copy(type_of::<Vec<f64>>()).unwrap();
//! assert_eq!(floats.to::<Vec<f64>>().unwrap(), vec![1.0, 2.0, 3.0]);
//! ```

mod container;
mod handle;
mod storage;

pub use container::GenericIterator;
pub use handle::{Value, ValueMut, ValueRef};
pub use storage::{Cursor, ObjectRef, Storage};
