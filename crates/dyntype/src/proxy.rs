// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Proxy factories for remote objects.
//!
//! A module that knows how to present a generic [`ObjectPtr`] as a typed
//! object registers a factory for that object type. When a generic object
//! handle is converted to a pointer to that type, the conversion engine
//! calls the factory instead of failing.

use crate::error::{Error, Result};
use crate::object::ObjectPtr;
use crate::types::{type_of, Kind, Reflect, TypeInfo, TypeRef};
use crate::value::Value;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

/// Builds a specialized value from a generic object handle.
pub type ProxyFactory = Arc<dyn Fn(&ObjectPtr) -> Value + Send + Sync>;

static PROXY_REGISTRY: OnceLock<ProxyRegistry> = OnceLock::new();

/// Object type identity to proxy factory.
///
/// Registration may happen from any thread while conversions run; each
/// lookup clones the factory handle so no map lock is held while it runs.
pub struct ProxyRegistry {
    factories: DashMap<TypeInfo, ProxyFactory>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
        }
    }

    /// Registry consulted by the global converter.
    pub fn global() -> &'static ProxyRegistry {
        PROXY_REGISTRY.get_or_init(ProxyRegistry::new)
    }

    /// Register `factory` for object type `target`, replacing any previous
    /// one.
    pub fn register<F>(&self, target: TypeRef, factory: F) -> Result<()>
    where
        F: Fn(&ObjectPtr) -> Value + Send + Sync + 'static,
    {
        if target.kind() != Kind::Object {
            return Err(Error::invalid_operation("register proxy", target.kind()));
        }
        if self
            .factories
            .insert(target.info().clone(), Arc::new(factory))
            .is_some()
        {
            log::warn!("proxy registry: factory for '{}' replaced", target.name());
        } else {
            log::debug!("proxy registry: registered '{}'", target.name());
        }
        Ok(())
    }

    /// Register `factory` for native object type `T`.
    pub fn register_for<T, F>(&self, factory: F) -> Result<()>
    where
        T: Reflect,
        F: Fn(&ObjectPtr) -> Value + Send + Sync + 'static,
    {
        self.register(type_of::<T>(), factory)
    }

    pub fn lookup(&self, info: &TypeInfo) -> Option<ProxyFactory> {
        self.factories.get(info).map(|f| Arc::clone(&f))
    }

    pub fn contains(&self, target: TypeRef) -> bool {
        self.factories.contains_key(target.info())
    }

    pub fn unregister(&self, target: TypeRef) -> bool {
        self.factories.remove(target.info()).is_some()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Drop every factory (process teardown).
    pub fn clear(&self) {
        self.factories.clear();
    }
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
