/// Service container
///
/// A minimal service locator: factories registered under string tokens,
/// instances created lazily on first resolution and cached. The container
/// is an owned value; construct one per application (or per test) rather
/// than holding it as process-global state, so initialization order stays
/// visible.
///
/// # Singleton semantics
///
/// Registering with `singleton: false` evicts the cached instance so the
/// *next* resolution reruns the factory, but that run's result is cached
/// again until the next `register` call. This "reset once" behavior is the
/// contract callers rely on and is kept as-is.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use folio_domain::container::ServiceContainer;
///
/// let container = ServiceContainer::new();
/// container.register(
///     "greeting",
///     |_| -> Arc<dyn Any + Send + Sync> { Arc::new("hello".to_string()) },
///     true,
/// );
///
/// let greeting = container.resolve::<String>("greeting").unwrap();
/// assert_eq!(greeting.as_str(), "hello");
/// ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A type-erased stored instance
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&ServiceContainer) -> AnyInstance + Send + Sync>;

/// Container error type
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// No factory registered under the token
    #[error("No registration for token '{0}'")]
    Unregistered(String),

    /// The registered instance has a different type than requested
    #[error("Registration for token '{0}' has a different type")]
    TypeMismatch(String),
}

/// Token-indexed service registry
#[derive(Default)]
pub struct ServiceContainer {
    factories: Mutex<HashMap<String, Factory>>,
    instances: Mutex<HashMap<String, AnyInstance>>,
}

impl ServiceContainer {
    /// Creates an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a token
    ///
    /// `singleton: false` additionally evicts any cached instance for the
    /// token (see the module docs for the exact semantics).
    pub fn register<F>(&self, token: &str, factory: F, singleton: bool)
    where
        F: Fn(&ServiceContainer) -> AnyInstance + Send + Sync + 'static,
    {
        self.factories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string(), Arc::new(factory));

        if !singleton {
            self.instances
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(token);
        }
    }

    /// Resolves an instance, creating and caching it on first use
    ///
    /// # Errors
    ///
    /// Returns an error for an unregistered token or when the stored
    /// instance is not of type `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self, token: &str) -> Result<Arc<T>, ContainerError> {
        let cached = self
            .instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned();
        if let Some(instance) = cached {
            return downcast::<T>(token, instance);
        }

        let factory = self
            .factories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or_else(|| ContainerError::Unregistered(token.to_string()))?;

        // Locks are released here: a factory may resolve its own
        // dependencies from the container.
        let instance = factory(self);

        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string(), instance.clone());

        downcast::<T>(token, instance)
    }

    /// Whether a factory is registered under the token
    pub fn is_registered(&self, token: &str) -> bool {
        self.factories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(token)
    }

    /// Clears all factories and cached instances
    pub fn reset(&self) {
        self.factories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn downcast<T: Send + Sync + 'static>(
    token: &str,
    instance: AnyInstance,
) -> Result<Arc<T>, ContainerError> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch(token.to_string()))
}
