// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named object factories and module loading.
//!
//! Modules publish object constructors under a name; clients create
//! objects by name without linking against the module. Loading a module
//! reports which factories it registered, and each module is loaded once.

use crate::error::{Error, Result};
use crate::object::ObjectPtr;
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Builds an object; receives the name it was registered under.
pub type ObjectFactory = Arc<dyn Fn(&str) -> ObjectPtr + Send + Sync>;

/// Loads a module, which registers its factories into `registry`.
///
/// Registration must be finished when `load` returns.
pub trait ModuleLoader {
    fn load(&self, module: &str, registry: &ObjectFactoryRegistry) -> core::result::Result<(), String>;
}

#[derive(Default)]
struct FactoryTable {
    factories: HashMap<String, ObjectFactory>,
    /// Names in first-registration order.
    keys: Vec<String>,
}

static OBJECT_FACTORIES: OnceLock<ObjectFactoryRegistry> = OnceLock::new();

/// Registry of object factories.
pub struct ObjectFactoryRegistry {
    table: RwLock<FactoryTable>,
    // Re-entrant: a module may load its own dependencies while loading.
    loaded: ReentrantMutex<RefCell<HashMap<String, Vec<String>>>>,
}

impl ObjectFactoryRegistry {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(FactoryTable::default()),
            loaded: ReentrantMutex::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn global() -> &'static ObjectFactoryRegistry {
        OBJECT_FACTORIES.get_or_init(ObjectFactoryRegistry::new)
    }

    /// Register `factory` under `name`; an existing factory is replaced.
    pub fn register<F>(&self, name: &str, factory: F) -> bool
    where
        F: Fn(&str) -> ObjectPtr + Send + Sync + 'static,
    {
        log::debug!("object factory: registering '{}'", name);
        let mut table = self.table.write();
        if table.factories.contains_key(name) {
            log::warn!("object factory: overriding factory for '{}'", name);
        } else {
            table.keys.push(name.to_string());
        }
        table.factories.insert(name.to_string(), Arc::new(factory));
        true
    }

    /// New object from the factory registered under `name`.
    pub fn create(&self, name: &str) -> Option<ObjectPtr> {
        // Clone the factory so it runs without the table lock.
        let factory = self.table.read().factories.get(name).cloned()?;
        Some(factory(name))
    }

    /// Like [`create`](Self::create), with a missing factory as an error.
    pub fn try_create(&self, name: &str) -> Result<ObjectPtr> {
        self.create(name)
            .ok_or_else(|| Error::FactoryNotFound(name.to_string()))
    }

    /// Registered names in registration order.
    pub fn list(&self) -> Vec<String> {
        self.table.read().keys.clone()
    }

    /// Load `module` through `loader` unless already loaded, and return the
    /// factory names it registered.
    ///
    /// The factory table lock is not held while the loader runs.
    pub fn load_module(&self, module: &str, loader: &dyn ModuleLoader) -> Result<Vec<String>> {
        let loaded = self.loaded.lock();
        if let Some(names) = loaded.borrow().get(module) {
            log::debug!("object factory: module '{}' already loaded", module);
            return Ok(names.clone());
        }

        let before = self.table.read().keys.len();
        log::debug!("object factory: {} factories before loading '{}'", before, module);
        loader
            .load(module, self)
            .map_err(|reason| Error::ModuleLoad {
                module: module.to_string(),
                reason,
            })?;

        let names: Vec<String> = self
            .table
            .read()
            .keys
            .get(before..)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        log::debug!(
            "object factory: module '{}' registered {} factories",
            module,
            names.len()
        );
        loaded
            .borrow_mut()
            .insert(module.to_string(), names.clone());
        Ok(names)
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.loaded.lock().borrow().contains_key(module)
    }
}

impl Default for ObjectFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
        names: Vec<&'static str>,
    }

    impl ModuleLoader for CountingLoader {
        fn load(&self, _module: &str, registry: &ObjectFactoryRegistry) -> core::result::Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for name in &self.names {
                registry.register(name, |n| ObjectBuilder::new(n).build());
            }
            Ok(())
        }
    }

    struct FailingLoader;

    impl ModuleLoader for FailingLoader {
        fn load(&self, module: &str, _: &ObjectFactoryRegistry) -> core::result::Result<(), String> {
            Err(format!("{} not found", module))
        }
    }

    #[test]
    fn test_register_create_list() {
        let registry = ObjectFactoryRegistry::new();
        assert!(registry.register("b", |n| ObjectBuilder::new(n).build()));
        assert!(registry.register("a", |n| ObjectBuilder::new(n).build()));
        assert!(registry.register("b", |_| ObjectBuilder::new("b2").build()));

        assert_eq!(registry.list(), vec!["b", "a"]);
        assert_eq!(registry.create("b").unwrap().type_name(), "b2");
        assert!(registry.create("missing").is_none());
        assert_eq!(
            registry.try_create("missing").unwrap_err(),
            Error::FactoryNotFound("missing".to_string())
        );
    }

    #[test]
    fn test_load_module_once() {
        let registry = ObjectFactoryRegistry::new();
        registry.register("core", |n| ObjectBuilder::new(n).build());
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
            names: vec!["camera", "motion"],
        };

        let names = registry.load_module("vision", &loader).unwrap();
        assert_eq!(names, vec!["camera", "motion"]);
        assert!(registry.is_loaded("vision"));

        let again = registry.load_module("vision", &loader).unwrap();
        assert_eq!(again, names);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.list(), vec!["core", "camera", "motion"]);
    }

    #[test]
    fn test_load_module_failure() {
        let registry = ObjectFactoryRegistry::new();
        let err = registry.load_module("audio", &FailingLoader).unwrap_err();
        assert_eq!(
            err,
            Error::ModuleLoad {
                module: "audio".to_string(),
                reason: "audio not found".to_string(),
            }
        );
        assert!(!registry.is_loaded("audio"));
    }
}
