// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased callables.
//!
//! Any `Fn(A1, ..., An) -> R` with up to six arguments becomes a
//! [`GenericFunction`] taking generic values. Each argument is converted to
//! its declared type before the call, and the return value comes back as a
//! fresh [`Value`].
//!
//! # Example
//!
//! ```rust
//! use dyntype::{GenericFunction, Value};
//!
//! let add = GenericFunction::new(|a: i32, b: i32| a + b);
//! assert_eq!(add.argument_types().len(), 2);
//!
//! let sum = add
//!     .call(&[Value::from_native(3i32).as_ref(), Value::from_native(4i64).as_ref()])
//!     .unwrap();
//! assert_eq!(sum.to::<i32>().unwrap(), 7);
//! ```

use crate::error::{Error, Result};
use crate::types::{FromStorage, Reflect, TypeRef, TypeRegistry};
use crate::value::{Value, ValueRef};
use std::fmt;
use std::sync::Arc;

/// Result and argument types of a callable.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    result: TypeRef,
    arguments: Vec<TypeRef>,
    signature: String,
}

impl FunctionType {
    pub fn new(result: TypeRef, arguments: Vec<TypeRef>) -> Self {
        let names: Vec<&str> = arguments.iter().map(|a| a.name()).collect();
        let signature = format!("fn({}) -> {}", names.join(", "), result.name());
        Self {
            result,
            arguments,
            signature,
        }
    }

    pub fn result_type(&self) -> TypeRef {
        self.result
    }

    pub fn argument_types(&self) -> &[TypeRef] {
        &self.arguments
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// Printable signature, e.g. `fn(i32, i32) -> i32`.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

type Invoke = dyn Fn(&[ValueRef<'_>]) -> Result<Value> + Send + Sync;

/// A callable invoked through generic values.
#[derive(Clone)]
pub struct GenericFunction {
    ty: Arc<FunctionType>,
    invoke: Arc<Invoke>,
}

impl GenericFunction {
    /// Erase a native callable.
    pub fn new<F, Args>(f: F) -> Self
    where
        F: IntoGenericFunction<Args>,
    {
        f.into_generic()
    }

    pub fn function_type(&self) -> &FunctionType {
        &self.ty
    }

    pub fn result_type(&self) -> TypeRef {
        self.ty.result_type()
    }

    pub fn argument_types(&self) -> &[TypeRef] {
        self.ty.argument_types()
    }

    pub fn arity(&self) -> usize {
        self.ty.arity()
    }

    /// Invoke with one value per declared argument.
    pub fn call(&self, args: &[ValueRef<'_>]) -> Result<Value> {
        if args.len() != self.arity() {
            return Err(Error::Arity {
                expected: self.arity(),
                got: args.len(),
            });
        }
        (self.invoke)(args)
    }

    /// [`call`](Self::call) over owning values.
    pub fn call_values(&self, args: &[Value]) -> Result<Value> {
        let args: Vec<ValueRef<'_>> = args.iter().map(Value::as_ref).collect();
        self.call(&args)
    }

    /// Fix the first argument to `receiver`.
    ///
    /// The receiver is converted to the first argument type once, here; the
    /// returned callable takes the remaining arguments.
    pub fn bind(&self, receiver: Value) -> Result<GenericFunction> {
        let (first, rest) = match self.argument_types().split_first() {
            Some(split) => split,
            None => return Err(Error::Arity { expected: 1, got: 0 }),
        };
        let receiver = receiver.as_ref().convert_copy(*first)?;
        let ty = Arc::new(FunctionType::new(self.result_type(), rest.to_vec()));
        let inner = Arc::clone(&self.invoke);
        log::trace!("bound receiver '{}' -> {}", first.name(), ty.signature());

        let invoke = erase(move |args: &[ValueRef<'_>]| {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(receiver.as_ref());
            full.extend_from_slice(args);
            inner(&full)
        });
        Ok(GenericFunction { ty, invoke })
    }
}

impl fmt::Debug for GenericFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericFunction")
            .field("signature", &self.ty.signature())
            .finish()
    }
}

/// Native callables that can be erased into a [`GenericFunction`].
///
/// `Args` is the argument tuple; it only disambiguates the arity impls.
pub trait IntoGenericFunction<Args> {
    fn into_generic(self) -> GenericFunction;
}

fn erase<F>(f: F) -> Arc<Invoke>
where
    F: Fn(&[ValueRef<'_>]) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn unpack<T: Reflect + FromStorage>(value: Option<&ValueRef<'_>>) -> Result<T> {
    match value {
        Some(v) => v.to::<T>(),
        None => Err(Error::Arity {
            expected: 1,
            got: 0,
        }),
    }
}

macro_rules! impl_into_generic {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<F, R, $($arg,)*> IntoGenericFunction<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Reflect,
            $($arg: Reflect + FromStorage,)*
        {
            fn into_generic(self) -> GenericFunction {
                let ty = TypeRegistry::global().function_type::<fn($($arg),*) -> R, _>(|registry| {
                    FunctionType::new(registry.get::<R>(), vec![$(registry.get::<$arg>()),*])
                });
                let f = self;
                let invoke = erase(move |args: &[ValueRef<'_>]| {
                    let mut args = args.iter();
                    $(let $arg = unpack::<$arg>(args.next())?;)*
                    Ok(Value::from_native(f($($arg),*)))
                });
                GenericFunction { ty, invoke }
            }
        }
    };
}

impl_into_generic!();
impl_into_generic!(A1);
impl_into_generic!(A1, A2);
impl_into_generic!(A1, A2, A3);
impl_into_generic!(A1, A2, A3, A4);
impl_into_generic!(A1, A2, A3, A4, A5);
impl_into_generic!(A1, A2, A3, A4, A5, A6);
