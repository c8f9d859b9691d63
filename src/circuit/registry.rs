use crate::circuit::breaker::{BreakerConfig, CircuitBreaker};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("processor '{0}' not found")]
    UnknownProcessor(String),
}

/// One breaker per processor, seeded at startup and shared by every in-flight
/// transaction for the process lifetime.
pub struct BreakerRegistry {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>, config: BreakerConfig) -> Self {
        let breakers = names
            .into_iter()
            .map(|name| (name.to_string(), Arc::new(CircuitBreaker::new(name, config.clone()))))
            .collect();
        Self { breakers }
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).cloned()
    }

    pub fn list(&self) -> impl Iterator<Item = &Arc<CircuitBreaker>> {
        self.breakers.values()
    }

    pub fn reset(&self, name: &str) -> Result<(), RegistryError> {
        let breaker = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownProcessor(name.to_string()))?;
        breaker.reset();
        Ok(())
    }

    pub fn inject(&self, name: &str, count: usize) -> Result<Arc<CircuitBreaker>, RegistryError> {
        let breaker = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownProcessor(name.to_string()))?;
        breaker.inject_failures(count, Instant::now());
        Ok(breaker)
    }
}
