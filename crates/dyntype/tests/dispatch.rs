// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Erased callables, generic objects, proxies and registries used together,
//! including from several threads.

#![allow(clippy::float_cmp)] // Exact conversions
#![allow(clippy::needless_pass_by_value)] // Test callables take ownership

use dyntype::{
    type_of, Error, GenericFunction, ModuleLoader, Obj, ObjectBuilder, ObjectFactoryRegistry,
    ObjectPtr, ProxyRegistry, TypeRegistry, TypeRef, Value,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn v<T: dyntype::Reflect>(value: T) -> Value {
    Value::from_native(value)
}

struct Accumulator {
    base: i64,
}
dyntype::object_type!(Accumulator);

struct Thermostat {
    remote: ObjectPtr,
}
dyntype::object_type!(Thermostat);

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_call_converts_arguments() {
    let add = GenericFunction::new(|a: i32, b: i32| a + b);
    let sum = add.call(&[v(3u8).as_ref(), v(4.0f64).as_ref()]).unwrap();
    assert_eq!(sum.ty(), Some(type_of::<i32>()));
    assert_eq!(sum.to::<i32>().unwrap(), 7);
}

#[test]
fn test_call_with_containers() {
    let join = GenericFunction::new(|parts: Vec<String>, sep: String| parts.join(&sep));
    let out = join
        .call(&[
            v(vec![String::from("a"), String::from("b")]).as_ref(),
            v(String::from("-")).as_ref(),
        ])
        .unwrap();
    assert_eq!(out.to::<String>().unwrap(), "a-b");

    let count = GenericFunction::new(|m: BTreeMap<String, i64>| m.len() as u32);
    let map = v(BTreeMap::from([(String::from("x"), 1u8)]));
    assert_eq!(count.call(&[map.as_ref()]).unwrap().to::<u32>().unwrap(), 1);
}

#[test]
fn test_call_errors() {
    let add = GenericFunction::new(|a: i32, b: i32| a + b);
    assert_eq!(
        add.call(&[v(1i32).as_ref()]).unwrap_err(),
        Error::Arity {
            expected: 2,
            got: 1
        }
    );
    assert!(add
        .call(&[v(1i32).as_ref(), v(String::from("2")).as_ref()])
        .is_err());
}

#[test]
fn test_bind_receiver() {
    let method = GenericFunction::new(|this: Obj<Accumulator>, x: i64| this.base + x);
    let receiver = v(Accumulator { base: 10 });
    let bound = method.bind(receiver.clone()).unwrap();

    assert_eq!(bound.arity(), method.arity() - 1);
    assert_eq!(bound.argument_types(), &method.argument_types()[1..]);

    let via_bound = bound.call(&[v(5i32).as_ref()]).unwrap();
    let via_method = method
        .call(&[receiver.as_ref(), v(5i32).as_ref()])
        .unwrap();
    assert_eq!(via_bound.to::<i64>().unwrap(), 15);
    assert_eq!(via_bound, via_method);
}

#[test]
fn test_bind_rejects_wrong_receiver() {
    let method = GenericFunction::new(|this: Obj<Accumulator>| this.base);
    assert!(method.bind(v(String::from("not an object"))).is_err());
}

// ============================================================================
// Objects and proxies
// ============================================================================

#[test]
fn test_generic_object_dispatch() {
    let receiver = v(Accumulator { base: 100 });
    let object = ObjectBuilder::new("Accumulator")
        .bound_method("add", receiver, |this: Obj<Accumulator>, x: i64| {
            this.base + x
        })
        .unwrap()
        .method("version", || String::from("1.0"))
        .build();

    assert_eq!(
        object.call("add", &[v(1u8).as_ref()]).unwrap().to::<i64>().unwrap(),
        101
    );
    assert_eq!(
        object.call("version", &[]).unwrap().to::<String>().unwrap(),
        "1.0"
    );
    assert!(matches!(
        object.call("reset", &[]).unwrap_err(),
        Error::MethodNotFound(_)
    ));
}

#[test]
fn test_proxy_substitution_through_function_call() {
    ProxyRegistry::global()
        .register_for::<Thermostat, _>(|object| {
            v(Obj::new(Thermostat {
                remote: object.clone(),
            }))
        })
        .unwrap();

    let remote = ObjectBuilder::new("thermostat")
        .method("read", || 21.5f64)
        .build();
    let read = GenericFunction::new(|proxy: Obj<Thermostat>| {
        proxy
            .remote
            .call("read", &[])
            .and_then(|r| r.to::<f64>())
            .unwrap_or(f64::NAN)
    });

    let out = read.call(&[v(remote).as_ref()]).unwrap();
    assert_eq!(out.to::<f64>().unwrap(), 21.5);
}

// ============================================================================
// Factories
// ============================================================================

struct SensorModule {
    loads: AtomicUsize,
}

impl ModuleLoader for SensorModule {
    fn load(&self, module: &str, registry: &ObjectFactoryRegistry) -> Result<(), String> {
        if module != "sensors" {
            return Err(format!("unknown module {}", module));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        registry.register("thermometer", |name| {
            ObjectBuilder::new(name).method("read", || 20i32).build()
        });
        registry.register("barometer", |name| {
            ObjectBuilder::new(name).method("read", || 1013i32).build()
        });
        Ok(())
    }
}

#[test]
fn test_module_factories() {
    let registry = ObjectFactoryRegistry::new();
    let module = SensorModule {
        loads: AtomicUsize::new(0),
    };

    let names = registry.load_module("sensors", &module).unwrap();
    assert_eq!(names, vec!["thermometer", "barometer"]);
    assert_eq!(registry.load_module("sensors", &module).unwrap(), names);
    assert_eq!(module.loads.load(Ordering::SeqCst), 1);

    let barometer = registry.try_create("barometer").unwrap();
    let reading = barometer.call("read", &[]).unwrap();
    assert_eq!(reading.to::<i32>().unwrap(), 1013);

    assert!(matches!(
        registry.load_module("cameras", &module).unwrap_err(),
        Error::ModuleLoad { .. }
    ));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_type_lookup_yields_one_descriptor() {
    const THREADS: usize = 8;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let ty: TypeRef = type_of::<BTreeMap<u16, Vec<(i8, String)>>>();
                ty as *const _ as usize
            })
        })
        .collect();

    let addresses: Vec<usize> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(
        addresses[0],
        TypeRegistry::global().get::<BTreeMap<u16, Vec<(i8, String)>>>() as *const _ as usize
    );
}

#[test]
fn test_concurrent_calls_share_function() {
    let scale = GenericFunction::new(|x: i64, factor: f64| x as f64 * factor);
    let handles: Vec<_> = (0..4i64)
        .map(|i| {
            let scale = scale.clone();
            thread::spawn(move || {
                (0..100i64)
                    .map(|n| {
                        scale
                            .call(&[v(n + i).as_ref(), v(0.5f32).as_ref()])
                            .and_then(|r| r.to::<f64>())
                            .unwrap_or(f64::NAN)
                    })
                    .sum::<f64>()
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        let expected: f64 = (0..100).map(|n| (n + i) as f64 * 0.5).sum();
        assert_eq!(h.join().expect("thread panicked"), expected);
    }
}
