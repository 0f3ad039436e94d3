use crate::config::Environment;
use crate::di::capability::{Capability, CapabilitySet};
use crate::di::definition::ComponentDefinition;
use crate::di::registry::{ComponentFactory, DefinitionRegistry};
use crate::error::Result;
use crate::lifecycle::{ContextEvent, EventMulticaster};
use std::any::Any;
use std::sync::Arc;

/// A component instance as held by the container.
pub type SharedComponent = Arc<dyn Component>;

/// Anything the container can create and hand out.
///
/// Hook behavior is exposed through the `as_*` accessors rather than runtime
/// type inspection: a component provides a capability exactly when the
/// matching accessor returns `Some`.
///
/// # Example
///
/// ```
/// use meshestra_context::di::{Component, ComponentFactory, FactoryPostProcessor};
/// use meshestra_context::Result;
///
/// struct AuditHook;
///
/// impl FactoryPostProcessor for AuditHook {
///     fn post_process_factory(&self, factory: &mut dyn ComponentFactory) -> Result<()> {
///         tracing::debug!(hooks = factory.instance_hook_count(), "audit");
///         Ok(())
///     }
/// }
///
/// impl Component for AuditHook {
///     fn order(&self) -> Option<i32> {
///         Some(10)
///     }
///
///     fn as_factory_post_processor(&self) -> Option<&dyn FactoryPostProcessor> {
///         Some(self)
///     }
/// }
/// ```
pub trait Component: Any + Send + Sync {
    /// Human readable type name, used in logs.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Explicit order key; `Some` places the component in the ordered class.
    fn order(&self) -> Option<i32> {
        None
    }

    /// Places the component in the top-priority class.
    fn is_priority_ordered(&self) -> bool {
        false
    }

    /// Called once the before-initialization hooks have run.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn as_factory_post_processor(&self) -> Option<&dyn FactoryPostProcessor> {
        None
    }

    fn as_registry_post_processor(&self) -> Option<&dyn RegistryPostProcessor> {
        None
    }

    fn as_instance_post_processor(&self) -> Option<&dyn InstancePostProcessor> {
        None
    }

    fn as_merged_definition_post_processor(&self) -> Option<&dyn MergedDefinitionPostProcessor> {
        None
    }

    fn as_event_listener(&self) -> Option<&dyn EventListener> {
        None
    }

    fn as_environment_aware(&self) -> Option<&dyn EnvironmentAware> {
        None
    }

    fn as_event_publisher_aware(&self) -> Option<&dyn EventPublisherAware> {
        None
    }
}

/// Capabilities actually provided by an instance.
pub fn capabilities_of(component: &dyn Component) -> CapabilitySet {
    let mut set = CapabilitySet::empty();
    if component.as_registry_post_processor().is_some() {
        set |= Capability::RegistryPostProcessor.into();
    }
    if factory_post_processor_of(component).is_some() {
        set |= Capability::FactoryPostProcessor.into();
    }
    if component.as_merged_definition_post_processor().is_some() {
        set |= Capability::MergedDefinitionPostProcessor.into();
    }
    if instance_post_processor_of(component).is_some() {
        set |= Capability::InstancePostProcessor.into();
    }
    if component.is_priority_ordered() {
        set |= Capability::PriorityOrdered.into();
    } else if component.order().is_some() {
        set |= Capability::Ordered.into();
    }
    if component.as_event_listener().is_some() {
        set |= Capability::EventListener.into();
    }
    if component.as_environment_aware().is_some() {
        set |= Capability::EnvironmentAware.into();
    }
    if component.as_event_publisher_aware().is_some() {
        set |= Capability::EventPublisherAware.into();
    }
    set
}

/// Downcast a shared component to its concrete type.
pub fn downcast_ref<T: Component>(component: &SharedComponent) -> Option<&T> {
    let any: &dyn Any = &**component;
    any.downcast_ref::<T>()
}

/// Observes and adjusts the finalized definition set.
pub trait FactoryPostProcessor: Send + Sync {
    fn post_process_factory(&self, factory: &mut dyn ComponentFactory) -> Result<()>;
}

/// Mutates the registry before the definition set is finalized.
///
/// Invoked during the registry phase, then again through
/// [`FactoryPostProcessor::post_process_factory`] once the phase settles.
pub trait RegistryPostProcessor: FactoryPostProcessor {
    fn post_process_registry(&self, registry: &mut dyn DefinitionRegistry) -> Result<()>;
}

/// Intercepts every component around its initialization.
///
/// Either callback may return a different instance (a wrapper, for example),
/// which then replaces the original for the rest of the chain.
pub trait InstancePostProcessor: Send + Sync {
    fn before_initialization(&self, component: SharedComponent, _name: &str) -> Result<SharedComponent> {
        Ok(component)
    }

    fn after_initialization(&self, component: SharedComponent, _name: &str) -> Result<SharedComponent> {
        Ok(component)
    }
}

/// Sees a working copy of the merged definition before each instantiation.
pub trait MergedDefinitionPostProcessor: InstancePostProcessor {
    fn post_process_merged_definition(
        &self,
        definition: &mut ComponentDefinition,
        name: &str,
    ) -> Result<()>;
}

pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &ContextEvent) -> Result<()>;
}

pub trait EnvironmentAware: Send + Sync {
    fn set_environment(&self, environment: Environment);
}

pub trait EventPublisherAware: Send + Sync {
    fn set_event_publisher(&self, publisher: EventMulticaster);
}

/// Factory-phase view of a component, whether it declared the capability
/// directly or through [`RegistryPostProcessor`].
pub(crate) fn factory_post_processor_of(component: &dyn Component) -> Option<&dyn FactoryPostProcessor> {
    component.as_factory_post_processor().or_else(|| {
        component
            .as_registry_post_processor()
            .map(|processor| processor as &dyn FactoryPostProcessor)
    })
}

/// Chain view of a component, whether it declared the capability directly or
/// through [`MergedDefinitionPostProcessor`].
pub(crate) fn instance_post_processor_of(component: &dyn Component) -> Option<&dyn InstancePostProcessor> {
    component.as_instance_post_processor().or_else(|| {
        component
            .as_merged_definition_post_processor()
            .map(|processor| processor as &dyn InstancePostProcessor)
    })
}
