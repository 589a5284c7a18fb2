use alloc::sync::Arc;
use core::fmt;

use crate::error::ArgumentError;
use crate::naming::{DeclaredNames, NamingStrategy};

/// Options shared by every plan an [`Engine`](crate::Engine) builds.
#[derive(Clone)]
pub struct EngineOptions {
    /// How record members are named (default: [`DeclaredNames`])
    pub naming: Arc<dyn NamingStrategy>,

    /// Deepest container nesting accepted on read and produced on write
    /// (default: 128)
    pub max_depth: usize,

    /// Idle contexts kept per thread-safe serializer or deserializer
    /// (default: 16)
    pub pool_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            naming: Arc::new(DeclaredNames),
            max_depth: 128,
            pool_capacity: 16,
        }
    }
}

impl EngineOptions {
    /// The defaults: depth 128, pool of 16, declared names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another naming strategy.
    pub fn naming(mut self, naming: impl NamingStrategy + 'static) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    /// Use a naming strategy that is already shared.
    pub fn shared_naming(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = naming;
        self
    }

    /// Set the nesting limit.
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set how many idle contexts a thread-safe instance keeps.
    pub const fn pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Check the options before an engine is built from them.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.max_depth == 0 {
            return Err(ArgumentError::new("max_depth", "must be at least 1"));
        }
        if self.pool_capacity == 0 {
            return Err(ArgumentError::new("pool_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("max_depth", &self.max_depth)
            .field("pool_capacity", &self.pool_capacity)
            .finish_non_exhaustive()
    }
}
