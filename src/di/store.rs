use crate::di::component::SharedComponent;
use crate::di::definition::{ComponentDefinition, Role};
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Definitions keyed by name, remembering registration order.
///
/// Clones share the same storage, so hooks that outlive a borrow of the
/// container (the chain sentinels) can still consult definitions.
#[derive(Clone, Default)]
pub struct DefinitionStore {
    definitions: Arc<DashMap<String, ComponentDefinition>>,
    names: Arc<RwLock<Vec<String>>>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous definition.
    pub(crate) fn insert(&self, name: &str, definition: ComponentDefinition) -> Option<ComponentDefinition> {
        let previous = self.definitions.insert(name.to_string(), definition);
        if previous.is_none() {
            self.names
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(name.to_string());
        }
        previous
    }

    pub(crate) fn remove(&self, name: &str) -> Option<ComponentDefinition> {
        let (_, removed) = self.definitions.remove(name)?;
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|n| n != name);
        Some(removed)
    }

    /// Apply `edit` to the stored definition in place.
    pub(crate) fn modify(&self, name: &str, edit: &mut dyn FnMut(&mut ComponentDefinition)) -> bool {
        match self.definitions.get_mut(name) {
            Some(mut entry) => {
                edit(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<ComponentDefinition> {
        self.definitions.get(name).map(|d| d.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn role(&self, name: &str) -> Option<Role> {
        self.definitions.get(name).map(|d| d.role())
    }

    pub fn is_singleton(&self, name: &str) -> Option<bool> {
        self.definitions.get(name).map(|d| d.is_singleton())
    }
}

/// The ordered instance hooks applied to every created component.
///
/// Adding a hook that is already present moves it to the tail.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Arc<RwLock<Vec<SharedComponent>>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, hook: SharedComponent) {
        let mut hooks = self.hooks.write().unwrap_or_else(PoisonError::into_inner);
        hooks.retain(|existing| !Arc::ptr_eq(existing, &hook));
        hooks.push(hook);
    }

    pub fn add_all(&self, hooks: &[SharedComponent]) {
        for hook in hooks {
            self.add(Arc::clone(hook));
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current chain; callers never hold the lock while hooks run.
    pub fn snapshot(&self) -> Vec<SharedComponent> {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn position_of(&self, hook: &SharedComponent) -> Option<usize> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .position(|existing| Arc::ptr_eq(existing, hook))
    }
}
