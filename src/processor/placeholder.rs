use crate::config::{ContextConfig, Environment, PlaceholderHelper};
use crate::di::{
    Component, ComponentDefinition, ComponentFactory, DefinitionSource, FactoryPostProcessor,
};
use crate::error::Result;
use crate::order::LOWEST_PRECEDENCE;

/// Rewrites `${...}` placeholders in every definition property from an
/// [`Environment`].
///
/// Runs with the top-priority factory hooks so later hooks see resolved
/// values. Definitions are edited in place; merged views pick the new values
/// up once the metadata cache is cleared at the end of the phase.
pub struct PlaceholderConfigurer {
    environment: Environment,
    helper: PlaceholderHelper,
    order: i32,
}

impl PlaceholderConfigurer {
    pub fn new(environment: Environment, helper: PlaceholderHelper) -> Self {
        Self {
            environment,
            helper,
            order: LOWEST_PRECEDENCE,
        }
    }

    pub fn from_config(environment: Environment, config: &ContextConfig) -> Self {
        Self::new(environment, config.placeholder_helper())
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl FactoryPostProcessor for PlaceholderConfigurer {
    fn post_process_factory(&self, factory: &mut dyn ComponentFactory) -> Result<()> {
        let mut rewritten = 0usize;
        for name in factory.definition_names() {
            let definition = factory.definition(&name)?;
            let mut resolved = Vec::new();
            for (key, value) in definition.properties() {
                let replaced = self
                    .helper
                    .replace_placeholders(value, |placeholder| self.environment.get(placeholder))?;
                if replaced != *value {
                    resolved.push((key.clone(), replaced));
                }
            }
            if resolved.is_empty() {
                continue;
            }

            rewritten += resolved.len();
            factory.modify_definition(&name, &mut |definition: &mut ComponentDefinition| {
                for (key, value) in &resolved {
                    definition.set_property(key.as_str(), value.as_str());
                }
            })?;
        }
        tracing::debug!(rewritten, "Resolved definition placeholders");
        Ok(())
    }
}

impl Component for PlaceholderConfigurer {
    fn order(&self) -> Option<i32> {
        Some(self.order)
    }

    fn is_priority_ordered(&self) -> bool {
        true
    }

    fn as_factory_post_processor(&self) -> Option<&dyn FactoryPostProcessor> {
        Some(self)
    }
}
