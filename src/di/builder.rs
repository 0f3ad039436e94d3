use crate::config::ContextConfig;
use crate::di::container::Container;
use crate::di::definition::ComponentDefinition;
use crate::di::registry::{ComponentComparator, DefinitionRegistry};
use crate::error::Result;

/// Builder for a [`Container`] with its initial definitions.
///
/// Registration errors (an override when overriding is disabled, for
/// example) surface from [`build`](Self::build).
///
/// # Example
/// ```
/// use meshestra_context::di::{Component, ComponentDefinition, ContainerBuilder, DefinitionSource};
///
/// struct Database;
/// impl Component for Database {}
///
/// let container = ContainerBuilder::new()
///     .register("database", ComponentDefinition::new(|_, _| Ok(Database)))
///     .allow_definition_overriding(false)
///     .build()
///     .unwrap();
/// assert!(container.contains_definition("database"));
/// ```
pub struct ContainerBuilder {
    definitions: Vec<(String, ComponentDefinition)>,
    allow_definition_overriding: bool,
    comparator: Option<ComponentComparator>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            allow_definition_overriding: true,
            comparator: None,
        }
    }

    /// Start from the settings of a loaded configuration.
    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new().allow_definition_overriding(config.allow_definition_overriding)
    }

    pub fn register(mut self, name: impl Into<String>, definition: ComponentDefinition) -> Self {
        self.definitions.push((name.into(), definition));
        self
    }

    pub fn allow_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_definition_overriding = allow;
        self
    }

    /// Replace the default hook ordering.
    pub fn dependency_comparator(mut self, comparator: ComponentComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn build(self) -> Result<Container> {
        let mut container = Container::new();
        container.set_allow_definition_overriding(self.allow_definition_overriding);
        if let Some(comparator) = self.comparator {
            container.set_dependency_comparator(comparator);
        }
        for (name, definition) in self.definitions {
            container.register_definition(&name, definition)?;
        }
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
