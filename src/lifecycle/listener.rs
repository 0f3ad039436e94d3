use crate::di::{Component, DefinitionStore, InstancePostProcessor, SharedComponent};
use crate::error::Result;
use crate::lifecycle::events::EventMulticaster;

/// Last hook in the chain: hands finished singleton listeners to the
/// multicaster.
///
/// Sitting at the tail means it sees the final form of each component,
/// including any wrapper produced by earlier hooks.
pub struct ListenerDetector {
    multicaster: EventMulticaster,
    definitions: DefinitionStore,
}

impl ListenerDetector {
    pub fn new(multicaster: EventMulticaster, definitions: DefinitionStore) -> Self {
        Self {
            multicaster,
            definitions,
        }
    }
}

impl InstancePostProcessor for ListenerDetector {
    fn after_initialization(&self, component: SharedComponent, name: &str) -> Result<SharedComponent> {
        if component.as_event_listener().is_none() {
            return Ok(component);
        }
        match self.definitions.is_singleton(name) {
            Some(true) => {
                tracing::debug!("Registering event listener '{}'", name);
                self.multicaster.add_listener(name, SharedComponent::clone(&component))?;
            }
            Some(false) => {
                tracing::warn!(
                    "Component '{}' is an event listener but not a singleton; it will not receive context events",
                    name
                );
                self.multicaster.remove_listener(name);
            }
            None => {}
        }
        Ok(component)
    }
}

impl Component for ListenerDetector {
    fn as_instance_post_processor(&self) -> Option<&dyn InstancePostProcessor> {
        Some(self)
    }
}
