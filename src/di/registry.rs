//! Collaborator interfaces consumed by the bootstrap orchestration.

use crate::di::capability::Capability;
use crate::di::component::{Component, SharedComponent};
use crate::di::definition::ComponentDefinition;
use crate::di::store::{DefinitionStore, HookChain};
use crate::error::Result;
use std::cmp::Ordering;
use std::sync::Arc;

/// Custom ordering installed on a factory; replaces the default comparator.
pub type ComponentComparator =
    Arc<dyn Fn(&dyn Component, &dyn Component) -> Ordering + Send + Sync>;

/// Read access to definitions.
pub trait DefinitionSource {
    /// Names in registration order.
    fn definition_names(&self) -> Vec<String>;

    fn definition(&self, name: &str) -> Result<ComponentDefinition>;

    fn contains_definition(&self, name: &str) -> bool;

    fn definition_count(&self) -> usize {
        self.definition_names().len()
    }
}

/// A store that accepts new definitions while hooks run.
pub trait DefinitionRegistry: DefinitionSource {
    fn register_definition(&mut self, name: &str, definition: ComponentDefinition) -> Result<()>;

    fn remove_definition(&mut self, name: &str) -> Result<ComponentDefinition>;
}

/// Lookup-by-capability plus get-or-create, as consumed by the orchestrators.
pub trait ComponentFactory: DefinitionSource {
    /// Names whose definitions provide `capability`, in registration order.
    ///
    /// With `include_non_singletons` false, prototype definitions are skipped.
    /// With `allow_eager_init` true, definitions that do not declare their
    /// capabilities are instantiated to find out.
    fn names_for_capability(
        &self,
        capability: Capability,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Result<Vec<String>>;

    /// Whether `name` provides `capability`, without instantiating it.
    fn is_type_match(&self, name: &str, capability: Capability) -> Result<bool>;

    /// Get or create the component, failing if it lacks `capability`.
    fn get_component(&self, name: &str, capability: Capability) -> Result<SharedComponent>;

    /// Edit a stored definition in place; cached merged views are not reset.
    fn modify_definition(
        &mut self,
        name: &str,
        edit: &mut dyn FnMut(&mut ComponentDefinition),
    ) -> Result<()>;

    fn dependency_comparator(&self) -> Option<ComponentComparator> {
        None
    }

    fn hook_chain(&self) -> HookChain;

    fn definition_store(&self) -> DefinitionStore;

    fn instance_hook_count(&self) -> usize {
        self.hook_chain().len()
    }

    fn add_instance_hook(&mut self, hook: SharedComponent) {
        self.hook_chain().add(hook);
    }

    fn add_instance_hooks(&mut self, hooks: &[SharedComponent]) {
        self.hook_chain().add_all(hooks);
    }

    /// Drop cached merged definitions and capability lookups.
    fn clear_metadata_cache(&mut self);

    /// Registry view, or `None` when this factory cannot accept new
    /// definitions.
    fn as_registry_mut(&mut self) -> Option<&mut dyn DefinitionRegistry> {
        None
    }
}
