//! Component definitions, the container and the hook contracts.

mod builder;
mod capability;
mod component;
mod container;
mod definition;
mod registry;
mod store;

pub use builder::ContainerBuilder;
pub use capability::{Capability, CapabilitySet};
pub use component::{
    Component, EnvironmentAware, EventListener, EventPublisherAware, FactoryPostProcessor,
    InstancePostProcessor, MergedDefinitionPostProcessor, RegistryPostProcessor, SharedComponent,
    capabilities_of, downcast_ref,
};
pub(crate) use component::{factory_post_processor_of, instance_post_processor_of};
pub use container::Container;
pub use definition::{ComponentDefinition, InstanceSupplier, Role, Scope};
pub use registry::{ComponentComparator, ComponentFactory, DefinitionRegistry, DefinitionSource};
pub use store::{DefinitionStore, HookChain};
