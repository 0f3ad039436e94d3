use crate::di::capability::Capability;
use crate::di::component::{SharedComponent, capabilities_of, instance_post_processor_of};
use crate::di::definition::ComponentDefinition;
use crate::di::registry::{
    ComponentComparator, ComponentFactory, DefinitionRegistry, DefinitionSource,
};
use crate::di::store::{DefinitionStore, HookChain};
use crate::error::{ContextError, Result};
use dashmap::DashMap;
use std::sync::Arc;

type CapabilityKey = (Capability, bool, bool);

/// Definition registry and component factory in one.
///
/// Definitions are looked up by name, merged with their parent on first
/// use, and instantiated through the active [`HookChain`].
pub struct Container {
    store: DefinitionStore,
    merged: DashMap<String, Arc<ComponentDefinition>>,
    names_by_capability: DashMap<CapabilityKey, Vec<String>>,
    singletons: DashMap<String, SharedComponent>,
    hooks: HookChain,
    comparator: Option<ComponentComparator>,
    allow_definition_overriding: bool,
    configuration_frozen: bool,
}

impl Container {
    pub fn new() -> Self {
        Self {
            store: DefinitionStore::new(),
            merged: DashMap::new(),
            names_by_capability: DashMap::new(),
            singletons: DashMap::new(),
            hooks: HookChain::new(),
            comparator: None,
            allow_definition_overriding: true,
            configuration_frozen: false,
        }
    }

    pub fn set_allow_definition_overriding(&mut self, allow: bool) -> &mut Self {
        self.allow_definition_overriding = allow;
        self
    }

    pub fn set_dependency_comparator(&mut self, comparator: ComponentComparator) -> &mut Self {
        self.comparator = Some(comparator);
        self
    }

    /// Definitions are not expected to change from here on; capability
    /// lookups start being cached.
    pub fn freeze_configuration(&mut self) {
        self.configuration_frozen = true;
    }

    pub fn is_configuration_frozen(&self) -> bool {
        self.configuration_frozen
    }

    /// The definition with its parent chain flattened, cached per name.
    pub fn merged_definition(&self, name: &str) -> Result<Arc<ComponentDefinition>> {
        self.merge_chain(name, &mut Vec::new())
    }

    fn merge_chain(&self, name: &str, chain: &mut Vec<String>) -> Result<Arc<ComponentDefinition>> {
        if let Some(cached) = self.merged.get(name) {
            return Ok(Arc::clone(cached.value()));
        }
        if chain.iter().any(|seen| seen == name) {
            chain.push(name.to_string());
            return Err(ContextError::config(format!(
                "circular parent chain: {}",
                chain.join(" -> ")
            )));
        }
        chain.push(name.to_string());

        let definition = self.store.get(name).ok_or_else(|| ContextError::not_found(name))?;
        let merged = match definition.parent() {
            None => definition.clone(),
            Some(parent) => {
                let parent_merged = self.merge_chain(parent, chain).map_err(|e| match e {
                    ContextError::DefinitionNotFound { .. } => ContextError::ParentNotFound {
                        name: name.to_string(),
                        parent: parent.to_string(),
                    },
                    other => other,
                })?;
                definition.merged_onto(&parent_merged)
            }
        };

        let merged = Arc::new(merged);
        self.merged.insert(name.to_string(), Arc::clone(&merged));
        Ok(merged)
    }

    /// Get or create the named component.
    pub fn get(&self, name: &str) -> Result<SharedComponent> {
        if let Some(existing) = self.singletons.get(name) {
            return Ok(Arc::clone(existing.value()));
        }

        let merged = self.merged_definition(name)?;
        if merged.is_abstract() {
            return Err(ContextError::AbstractDefinition {
                name: name.to_string(),
            });
        }

        tracing::trace!(component = name, "Creating component");
        let instance = self
            .create(name, &merged)
            .map_err(|e| ContextError::creation(name, e))?;

        if merged.is_singleton() {
            let shared = self
                .singletons
                .entry(name.to_string())
                .or_insert(instance);
            return Ok(Arc::clone(shared.value()));
        }
        Ok(instance)
    }

    fn create(&self, name: &str, merged: &ComponentDefinition) -> Result<SharedComponent> {
        let hooks = self.hooks.snapshot();

        let mut definition = merged.clone();
        for hook in &hooks {
            if let Some(processor) = hook.as_merged_definition_post_processor() {
                processor.post_process_merged_definition(&mut definition, name)?;
            }
        }

        let supplier = definition.supplier().cloned().ok_or_else(|| {
            ContextError::AbstractDefinition {
                name: name.to_string(),
            }
        })?;
        let mut instance = supplier(self, &definition)?;

        for hook in &hooks {
            if let Some(processor) = instance_post_processor_of(hook.as_ref()) {
                instance = processor.before_initialization(instance, name)?;
            }
        }
        instance.initialize()?;
        for hook in &hooks {
            if let Some(processor) = instance_post_processor_of(hook.as_ref()) {
                instance = processor.after_initialization(instance, name)?;
            }
        }
        Ok(instance)
    }

    fn matches(&self, name: &str, capability: Capability, allow_eager_init: bool) -> Result<bool> {
        let cached = self.singletons.get(name).map(|s| Arc::clone(s.value()));
        if let Some(instance) = cached {
            return Ok(capabilities_of(instance.as_ref()).provides(capability));
        }

        let merged = self.merged_definition(name)?;
        match merged.capabilities() {
            Some(declared) => Ok(declared.provides(capability)),
            None if allow_eager_init && !merged.is_abstract() => {
                let instance = self.get(name)?;
                Ok(capabilities_of(instance.as_ref()).provides(capability))
            }
            None => Ok(false),
        }
    }

    /// Create every non-lazy singleton that does not exist yet.
    pub fn preinstantiate_singletons(&self) -> Result<()> {
        tracing::debug!("Pre-instantiating singletons");
        for name in self.store.names() {
            let merged = self.merged_definition(&name)?;
            if !merged.is_abstract() && merged.is_singleton() && !merged.is_lazy_init() {
                self.get(&name)?;
            }
        }
        Ok(())
    }

    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.contains_key(name)
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    pub fn destroy_singletons(&self) {
        tracing::debug!(count = self.singletons.len(), "Dropping singletons");
        self.singletons.clear();
    }

    /// Forget cached views of `name` and every definition inheriting from it.
    fn reset_definition(&self, name: &str) {
        let mut pending = vec![name.to_string()];
        let mut reset: Vec<String> = Vec::new();
        while let Some(current) = pending.pop() {
            if reset.contains(&current) {
                continue;
            }
            self.merged.remove(&current);
            self.singletons.remove(&current);
            for child in self.store.names() {
                let inherits = self
                    .store
                    .get(&child)
                    .is_some_and(|d| d.parent() == Some(current.as_str()));
                if inherits {
                    pending.push(child);
                }
            }
            reset.push(current);
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionSource for Container {
    fn definition_names(&self) -> Vec<String> {
        self.store.names()
    }

    fn definition(&self, name: &str) -> Result<ComponentDefinition> {
        self.store.get(name).ok_or_else(|| ContextError::not_found(name))
    }

    fn contains_definition(&self, name: &str) -> bool {
        self.store.contains(name)
    }

    fn definition_count(&self) -> usize {
        self.store.len()
    }
}

impl DefinitionRegistry for Container {
    fn register_definition(&mut self, name: &str, definition: ComponentDefinition) -> Result<()> {
        if self.store.contains(name) {
            if !self.allow_definition_overriding {
                return Err(ContextError::DefinitionOverride {
                    name: name.to_string(),
                });
            }
            tracing::info!(component = name, "Overriding component definition");
        }
        self.store.insert(name, definition);
        self.reset_definition(name);
        self.names_by_capability.clear();
        Ok(())
    }

    fn remove_definition(&mut self, name: &str) -> Result<ComponentDefinition> {
        let removed = self
            .store
            .remove(name)
            .ok_or_else(|| ContextError::not_found(name))?;
        self.reset_definition(name);
        self.names_by_capability.clear();
        Ok(removed)
    }
}

impl ComponentFactory for Container {
    fn names_for_capability(
        &self,
        capability: Capability,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Result<Vec<String>> {
        let key = (capability, include_non_singletons, allow_eager_init);
        if self.configuration_frozen {
            if let Some(cached) = self.names_by_capability.get(&key) {
                return Ok(cached.clone());
            }
        }

        let mut names = Vec::new();
        for name in self.store.names() {
            let merged = match self.merged_definition(&name) {
                Ok(merged) => merged,
                Err(ContextError::ParentNotFound { parent, .. }) if !allow_eager_init => {
                    tracing::trace!(component = %name, parent = %parent, "Skipping definition with unregistered parent");
                    continue;
                }
                Err(ContextError::DefinitionNotFound { .. }) if !allow_eager_init => continue,
                Err(e) => return Err(e),
            };
            if merged.is_abstract() {
                continue;
            }
            if !include_non_singletons && !merged.is_singleton() {
                continue;
            }
            if self.matches(&name, capability, allow_eager_init)? {
                names.push(name);
            }
        }

        if self.configuration_frozen {
            self.names_by_capability.insert(key, names.clone());
        }
        Ok(names)
    }

    fn is_type_match(&self, name: &str, capability: Capability) -> Result<bool> {
        self.matches(name, capability, false)
    }

    fn get_component(&self, name: &str, capability: Capability) -> Result<SharedComponent> {
        let component = self.get(name)?;
        if !capabilities_of(component.as_ref()).provides(capability) {
            return Err(ContextError::CapabilityMismatch {
                name: name.to_string(),
                required: capability.to_string(),
            });
        }
        Ok(component)
    }

    fn modify_definition(
        &mut self,
        name: &str,
        edit: &mut dyn FnMut(&mut ComponentDefinition),
    ) -> Result<()> {
        if self.store.modify(name, edit) {
            Ok(())
        } else {
            Err(ContextError::not_found(name))
        }
    }

    fn dependency_comparator(&self) -> Option<ComponentComparator> {
        self.comparator.clone()
    }

    fn hook_chain(&self) -> HookChain {
        self.hooks.clone()
    }

    fn definition_store(&self) -> DefinitionStore {
        self.store.clone()
    }

    fn clear_metadata_cache(&mut self) {
        let singletons = &self.singletons;
        self.merged.retain(|name, _| singletons.contains_key(name));
        self.names_by_capability.clear();
    }

    fn as_registry_mut(&mut self) -> Option<&mut dyn DefinitionRegistry> {
        Some(self)
    }
}
