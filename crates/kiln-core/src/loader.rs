//! Implementation discovery decoupled from construction.
//!
//! [`ImplementationLoader`] is the seam through which the configuration
//! context finds collaborator implementations at runtime: zero-or-one via
//! [`any_instance_of`](LoaderExt::any_instance_of), zero-or-more via
//! [`all_instances_of`](LoaderExt::all_instances_of). The loader is injected
//! into the context's constructor, so there is no hidden global discovery
//! state; the context caches each lookup per slot, so repeated discovery
//! never happens after first resolution.
//!
//! # Example
//!
//! ```rust,ignore
//! let loader = TypeMapLoader::new()
//!     .bind::<dyn Serializer>(Arc::new(MsgpackSerializer));
//! let context = MutableKilnContext::new(Arc::new(loader));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Type alias for the heterogeneous instance values stored by a loader.
///
/// The inner `dyn Any` is an `Arc<T>` upcast to `Any`; [`LoaderExt`]
/// downcasts it back to `Arc<T>` for the caller.
pub type InstanceArc = Arc<dyn Any + Send + Sync>;

/// Object-safe discovery contract.
///
/// Implementations may re-trigger discovery on every call; callers that need
/// stability must cache, as the configuration context does.
pub trait ImplementationLoader: Send + Sync {
    /// Returns the first known instance registered for `type_id`, if any.
    fn any_instance(&self, type_id: TypeId) -> Option<InstanceArc>;

    /// Returns every known instance registered for `type_id`, in
    /// registration order.
    fn all_instances(&self, type_id: TypeId) -> Vec<InstanceArc>;
}

/// Typed convenience methods over [`ImplementationLoader`].
///
/// Blanket-implemented, so these are callable on `Arc<dyn ImplementationLoader>`.
pub trait LoaderExt: ImplementationLoader {
    /// Looks up zero-or-one instance of `T`.
    fn any_instance_of<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.any_instance(TypeId::of::<T>())
            .and_then(|instance| instance.downcast_ref::<Arc<T>>().map(Arc::clone))
    }

    /// Looks up all registered instances of `T`, in registration order.
    fn all_instances_of<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.all_instances(TypeId::of::<T>())
            .iter()
            .filter_map(|instance| instance.downcast_ref::<Arc<T>>().map(Arc::clone))
            .collect()
    }
}

impl<L: ImplementationLoader + ?Sized> LoaderExt for L {}

/// An explicit, in-memory loader built by binding instances per type.
///
/// Registration order is preserved per type; [`any_instance`] returns the
/// first binding.
///
/// [`any_instance`]: ImplementationLoader::any_instance
#[derive(Default)]
pub struct TypeMapLoader {
    instances: HashMap<TypeId, Vec<InstanceArc>>,
}

impl TypeMapLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an instance as an implementation of `T`.
    ///
    /// `T` is usually a trait object (`dyn Serializer`); binding the same `T`
    /// repeatedly accumulates instances.
    pub fn bind<T>(mut self, instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.instances
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Arc::new(instance) as InstanceArc);
        self
    }
}

impl ImplementationLoader for TypeMapLoader {
    fn any_instance(&self, type_id: TypeId) -> Option<InstanceArc> {
        self.instances
            .get(&type_id)
            .and_then(|v| v.first())
            .cloned()
    }

    fn all_instances(&self, type_id: TypeId) -> Vec<InstanceArc> {
        self.instances.get(&type_id).cloned().unwrap_or_default()
    }
}
