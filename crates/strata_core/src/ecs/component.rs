// component.rs - Component types and their per-store ids
//
// Ids are small integers handed out in registration order by the registry
// that lives inside each World. Two worlds never share id assignments.

use crate::ecs::StoreError;
use std::any::TypeId;
use std::collections::HashMap;

/// Small integer identifying a component type within one store.
pub type ComponentId = u8;

/// Plain data record that can be attached to an entity.
pub trait Component: 'static + Sized {
    /// Human-readable name used in logs and errors.
    const NAME: &'static str;
}

/// Implement [`Component`] for a type.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy, Default)]
/// struct Position { x: f32, y: f32 }
///
/// define_component!(Position);
/// define_component!(Velocity, "vel");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty) => {
        $crate::define_component!($ty, stringify!($ty));
    };
    ($ty:ty, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const NAME: &'static str = $name;
        }
    };
}

/// Assigns sequential component ids, bounded by a fixed capacity.
pub struct ComponentRegistry {
    capacity: usize,
    ids: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ids: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Id for the storage type `S`, registering it on first request.
    ///
    /// Fails once `capacity` ids have been issued; the failure is permanent
    /// for any type that did not get an id before that point.
    pub fn id_of<S: 'static>(&mut self, name: &'static str) -> Result<ComponentId, StoreError> {
        let key = TypeId::of::<S>();
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        if self.names.len() >= self.capacity {
            tracing::warn!(
                component = name,
                capacity = self.capacity,
                "component id capacity exhausted"
            );
            return Err(StoreError::CapacityExceeded {
                component: name,
                capacity: self.capacity,
            });
        }
        let id = self.names.len() as ComponentId;
        self.ids.insert(key, id);
        self.names.push(name);
        tracing::debug!(component = name, id, "registered component type");
        Ok(id)
    }

    /// Id for `S` if it has already been registered.
    #[inline]
    pub fn lookup<S: 'static>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<S>()).copied()
    }

    pub fn name_of(&self, id: ComponentId) -> Option<&'static str> {
        self.names.get(id as usize).copied()
    }

    /// Number of ids issued so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;
    struct C;

    #[test]
    fn ids_are_sequential_and_memoized() {
        let mut registry = ComponentRegistry::new(4);
        assert_eq!(registry.id_of::<A>("A").unwrap(), 0);
        assert_eq!(registry.id_of::<B>("B").unwrap(), 1);
        assert_eq!(registry.id_of::<A>("A").unwrap(), 0);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name_of(1), Some("B"));
        assert_eq!(registry.lookup::<C>(), None);
    }

    #[test]
    fn exhausted_registry_fails_closed() {
        let mut registry = ComponentRegistry::new(2);
        registry.id_of::<A>("A").unwrap();
        registry.id_of::<B>("B").unwrap();

        let err = registry.id_of::<C>("C").unwrap_err();
        assert!(matches!(
            err,
            StoreError::CapacityExceeded { component: "C", capacity: 2 }
        ));
        // Still refused on retry, while known types keep resolving.
        assert!(registry.id_of::<C>("C").is_err());
        assert_eq!(registry.id_of::<B>("B").unwrap(), 1);
    }
}
