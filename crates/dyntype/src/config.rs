// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime configuration for the type layer.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time defaults
//! - **Level 2 (Dynamic)**: `RuntimeConfig`, swapped atomically at runtime
//!
//! The conversion engine reads its settings on every call, so they sit in an
//! `ArcSwap`: readers never take a lock, writers replace the whole snapshot.
//!
//! # Example
//!
//! ```
//! use dyntype::config::{ListFailurePolicy, RuntimeConfig};
//!
//! let config = RuntimeConfig::new();
//! config.update_conversion(|c| c.with_list_failure(ListFailurePolicy::Skip));
//! assert_eq!(config.conversion().list_failure, ListFailurePolicy::Skip);
//! ```

use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

/// Maximum nesting depth followed by a single conversion.
///
/// Dynamic values may wrap dynamic values; past this depth the conversion
/// fails instead of recursing further.
pub const DEFAULT_MAX_CONVERSION_DEPTH: usize = 64;

/// What a list conversion does when one element fails to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFailurePolicy {
    /// Abort the whole list conversion with the element's error.
    #[default]
    FailFast,
    /// Drop the element and keep converting the rest.
    Skip,
}

/// Settings consulted by [`crate::Converter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Recursion limit (see [`DEFAULT_MAX_CONVERSION_DEPTH`]).
    pub max_depth: usize,
    /// Per-element failure handling for List conversions.
    pub list_failure: ListFailurePolicy,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_CONVERSION_DEPTH,
            list_failure: ListFailurePolicy::FailFast,
        }
    }
}

impl ConversionConfig {
    /// Set the recursion limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the list failure policy.
    #[must_use]
    pub fn with_list_failure(mut self, policy: ListFailurePolicy) -> Self {
        self.list_failure = policy;
        self
    }
}

static RUNTIME_CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Process-wide dynamic configuration.
pub struct RuntimeConfig {
    conversion: ArcSwap<ConversionConfig>,
}

impl RuntimeConfig {
    /// Create a configuration holding the defaults.
    pub fn new() -> Self {
        Self {
            conversion: ArcSwap::from_pointee(ConversionConfig::default()),
        }
    }

    /// The configuration used by the global converter.
    pub fn global() -> &'static RuntimeConfig {
        RUNTIME_CONFIG.get_or_init(RuntimeConfig::new)
    }

    /// Current conversion settings (lock-free snapshot).
    pub fn conversion(&self) -> Arc<ConversionConfig> {
        self.conversion.load_full()
    }

    /// Replace the conversion settings.
    pub fn set_conversion(&self, config: ConversionConfig) {
        log::debug!("conversion config replaced: {:?}", config);
        self.conversion.store(Arc::new(config));
    }

    /// Derive new conversion settings from the current ones.
    pub fn update_conversion<F>(&self, f: F)
    where
        F: Fn(ConversionConfig) -> ConversionConfig,
    {
        self.conversion.rcu(|current| f(ConversionConfig::clone(current)));
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
