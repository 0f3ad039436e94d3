use crate::di::{
    Component, DefinitionStore, HookChain, InstancePostProcessor, Role, SharedComponent,
    instance_post_processor_of,
};
use crate::error::Result;

/// Reports components created before the full hook chain was installed.
///
/// Purely diagnostic: it never alters or rejects a component.
pub struct HookChainChecker {
    chain: HookChain,
    definitions: DefinitionStore,
    target_count: usize,
}

impl HookChainChecker {
    pub fn new(chain: HookChain, definitions: DefinitionStore, target_count: usize) -> Self {
        Self {
            chain,
            definitions,
            target_count,
        }
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    fn is_infrastructure(&self, name: &str) -> bool {
        self.definitions.role(name) == Some(Role::Infrastructure)
    }
}

impl InstancePostProcessor for HookChainChecker {
    fn after_initialization(&self, component: SharedComponent, name: &str) -> Result<SharedComponent> {
        let current = self.chain.len();
        if instance_post_processor_of(component.as_ref()).is_none()
            && !self.is_infrastructure(name)
            && current < self.target_count
        {
            tracing::info!(
                component = name,
                kind = component.type_name(),
                registered = current,
                expected = self.target_count,
                "Component '{}' is not eligible for processing by all instance hooks \
                 (created before the hook chain was complete)",
                name
            );
        }
        Ok(component)
    }
}

impl Component for HookChainChecker {
    fn as_instance_post_processor(&self) -> Option<&dyn InstancePostProcessor> {
        Some(self)
    }
}
