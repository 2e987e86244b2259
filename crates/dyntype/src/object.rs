// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic objects: a type name plus a table of erased methods.
//!
//! Methods are published by binding a native method to a receiver, which
//! leaves an ordinary callable in the dispatch table.
//!
//! # Example
//!
//! ```rust
//! use dyntype::{Obj, ObjectBuilder, Value};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//! dyntype::object_type!(Greeter);
//!
//! let greeter = Value::from_native(Greeter { greeting: "hello".into() });
//! let object = ObjectBuilder::new("Greeter")
//!     .bound_method("greet", greeter, |this: Obj<Greeter>, name: String| {
//!         format!("{} {}", this.greeting, name)
//!     })
//!     .unwrap()
//!     .build();
//!
//! let reply = object
//!     .call("greet", &[Value::from_native(String::from("bob")).as_ref()])
//!     .unwrap();
//! assert_eq!(reply.to::<String>().unwrap(), "hello bob");
//! ```

use crate::error::{Error, Result};
use crate::function::{GenericFunction, IntoGenericFunction};
use crate::types::{FromStorage, Reflect, TypeKind, TypeRegistry};
use crate::value::{ObjectRef, Storage, Value, ValueRef};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

struct MethodEntry {
    name: String,
    function: GenericFunction,
}

/// Object exposing its methods through generic values.
pub struct GenericObject {
    type_name: String,
    methods: Vec<MethodEntry>,
}

impl GenericObject {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Method names in registration order, one entry per overload, so an
    /// overloaded name repeats.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }

    /// Method `name` taking `arity` arguments.
    pub fn method(&self, name: &str, arity: usize) -> Option<&GenericFunction> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.function.arity() == arity)
            .map(|m| &m.function)
    }

    /// Dispatch `name` by name and argument count.
    pub fn call(&self, name: &str, args: &[ValueRef<'_>]) -> Result<Value> {
        if let Some(function) = self.method(name, args.len()) {
            return function.call(args);
        }
        match self.methods.iter().find(|m| m.name == name) {
            Some(m) => Err(Error::Arity {
                expected: m.function.arity(),
                got: args.len(),
            }),
            None => Err(Error::MethodNotFound(format!("{}.{}", self.type_name, name))),
        }
    }
}

impl fmt::Debug for GenericObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericObject")
            .field("type_name", &self.type_name)
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Shared handle to a [`GenericObject`].
#[derive(Clone, Debug)]
pub struct ObjectPtr(Arc<GenericObject>);

impl ObjectPtr {
    pub fn new(object: GenericObject) -> Self {
        Self(Arc::new(object))
    }

    /// Same object instance.
    pub fn ptr_eq(&self, other: &ObjectPtr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ObjectPtr {
    type Target = GenericObject;

    fn deref(&self) -> &GenericObject {
        &self.0
    }
}

impl Reflect for ObjectPtr {
    fn type_name() -> String {
        "ObjectPtr".to_string()
    }

    fn build_kind(_: &TypeRegistry) -> TypeKind {
        TypeKind::Object
    }

    fn into_storage(self) -> Storage {
        Storage::Object(ObjectRef::from_arc(self.0))
    }
}

impl FromStorage for ObjectPtr {
    fn from_storage(storage: &Storage) -> Option<Self> {
        match storage {
            Storage::Object(object) => object.downcast_arc::<GenericObject>().map(ObjectPtr),
            _ => None,
        }
    }
}

/// Assembles the method table of a [`GenericObject`].
pub struct ObjectBuilder {
    type_name: String,
    methods: Vec<MethodEntry>,
}

impl ObjectBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            methods: Vec::new(),
        }
    }

    /// Add an already erased callable.
    #[must_use]
    pub fn function(mut self, name: impl Into<String>, function: GenericFunction) -> Self {
        self.methods.push(MethodEntry {
            name: name.into(),
            function,
        });
        self
    }

    /// Add a free function as a method.
    #[must_use]
    pub fn method<F, Args>(self, name: impl Into<String>, f: F) -> Self
    where
        F: IntoGenericFunction<Args>,
    {
        self.function(name, GenericFunction::new(f))
    }

    /// Add `f` with its first argument bound to `receiver`.
    pub fn bound_method<F, Args>(
        self,
        name: impl Into<String>,
        receiver: Value,
        f: F,
    ) -> Result<Self>
    where
        F: IntoGenericFunction<Args>,
    {
        let bound = GenericFunction::new(f).bind(receiver)?;
        Ok(self.function(name, bound))
    }

    pub fn build(self) -> ObjectPtr {
        log::debug!(
            "object '{}' built with {} method(s)",
            self.type_name,
            self.methods.len()
        );
        ObjectPtr::new(GenericObject {
            type_name: self.type_name,
            methods: self.methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{type_of, Kind};

    fn v<T: Reflect>(value: T) -> Value {
        Value::from_native(value)
    }

    #[test]
    fn test_dispatch_by_name_and_arity() {
        let object = ObjectBuilder::new("Math")
            .method("neg", |x: i64| -x)
            .method("add", |a: i64, b: i64| a + b)
            .method("add", |a: i64, b: i64, c: i64| a + b + c)
            .build();

        assert_eq!(object.method_names(), vec!["neg", "add", "add"]);
        let two = object.call("add", &[v(1i32).as_ref(), v(1i32).as_ref()]).unwrap();
        assert_eq!(two.to::<i64>().unwrap(), 2);
        let three = object
            .call("add", &[v(1i32).as_ref(), v(1i32).as_ref(), v(1i32).as_ref()])
            .unwrap();
        assert_eq!(three.to::<i64>().unwrap(), 3);
    }

    #[test]
    fn test_dispatch_errors() {
        let object = ObjectBuilder::new("Math").method("neg", |x: i64| -x).build();
        assert_eq!(
            object.call("sqrt", &[]).unwrap_err(),
            Error::MethodNotFound("Math.sqrt".to_string())
        );
        assert_eq!(
            object.call("neg", &[]).unwrap_err(),
            Error::Arity { expected: 1, got: 0 }
        );
    }

    #[test]
    fn test_object_ptr_round_trip() {
        let object = ObjectBuilder::new("Empty").build();
        let value = v(object.clone());
        assert_eq!(value.ty(), Some(type_of::<ObjectPtr>()));
        assert_eq!(value.kind(), Kind::Object);
        let back = value.to::<ObjectPtr>().unwrap();
        assert!(back.ptr_eq(&object));
        assert_eq!(back.type_name(), "Empty");
    }
}
