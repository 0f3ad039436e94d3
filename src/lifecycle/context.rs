use crate::config::{ContextConfig, Environment};
use crate::di::{
    Capability, ComponentDefinition, ComponentFactory, Container, DefinitionRegistry,
    DefinitionSource, Role, SharedComponent, factory_post_processor_of,
};
use crate::error::{ContextError, Result};
use crate::lifecycle::aware::AwareProcessor;
use crate::lifecycle::events::{ContextEvent, EventMulticaster};
use crate::module::Module;
use crate::processor::{PlaceholderConfigurer, register_instance_hooks, run_definition_mutation_phase};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Name under which [`ApplicationContext::register_placeholder_configurer`]
/// registers its hook.
pub const PLACEHOLDER_CONFIGURER_NAME: &str = "placeholderConfigurer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ContextState {
    Created,
    Refreshing,
    Active,
    Failed,
    Closed,
}

/// Owns a [`Container`] and drives its bootstrap.
///
/// # Example
///
/// ```
/// use meshestra_context::di::{Component, ComponentDefinition};
/// use meshestra_context::lifecycle::{ApplicationContext, ContextState};
///
/// struct Greeter;
/// impl Component for Greeter {}
///
/// let mut context = ApplicationContext::default();
/// context
///     .register_definition("greeter", ComponentDefinition::new(|_, _| Ok(Greeter)))
///     .unwrap();
/// context.refresh().unwrap();
/// assert_eq!(context.state(), ContextState::Active);
/// assert!(context.get("greeter").is_ok());
/// context.close();
/// ```
pub struct ApplicationContext {
    id: Uuid,
    config: ContextConfig,
    environment: Environment,
    container: Container,
    factory_hooks: Vec<SharedComponent>,
    multicaster: EventMulticaster,
    state: ContextState,
    started_at: Option<DateTime<Utc>>,
}

impl ApplicationContext {
    pub fn new(config: ContextConfig, environment: Environment) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config, environment))
    }

    /// Context configured from the `MESHESTRA_*` keys of `environment`.
    pub fn from_environment(environment: Environment) -> Result<Self> {
        let config = ContextConfig::from_environment(&environment)?;
        Ok(Self::with_valid_config(config, environment))
    }

    fn with_valid_config(config: ContextConfig, environment: Environment) -> Self {
        let mut container = Container::new();
        container.set_allow_definition_overriding(config.allow_definition_overriding);
        Self {
            id: Uuid::new_v4(),
            config,
            environment,
            container,
            factory_hooks: Vec::new(),
            multicaster: EventMulticaster::new(),
            state: ContextState::Created,
            started_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.config.display_name
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ContextState::Active
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    pub fn multicaster(&self) -> &EventMulticaster {
        &self.multicaster
    }

    pub fn register_definition(&mut self, name: &str, definition: ComponentDefinition) -> Result<()> {
        self.container.register_definition(name, definition)
    }

    pub fn register_module<M: Module>(&mut self) -> Result<()> {
        M::register(&mut self.container)
    }

    /// Add a pre-built definition hook, run ahead of any registered ones.
    pub fn add_factory_post_processor(&mut self, hook: SharedComponent) -> Result<()> {
        if factory_post_processor_of(hook.as_ref()).is_none() {
            return Err(ContextError::CapabilityMismatch {
                name: hook.type_name().to_string(),
                required: Capability::FactoryPostProcessor.to_string(),
            });
        }
        self.factory_hooks.push(hook);
        Ok(())
    }

    pub fn factory_post_processors(&self) -> &[SharedComponent] {
        &self.factory_hooks
    }

    /// Register a [`PlaceholderConfigurer`] bound to this context's
    /// environment and placeholder settings.
    pub fn register_placeholder_configurer(&mut self) -> Result<()> {
        let configurer: SharedComponent = Arc::new(PlaceholderConfigurer::from_config(
            self.environment.clone(),
            &self.config,
        ));
        self.container.register_definition(
            PLACEHOLDER_CONFIGURER_NAME,
            ComponentDefinition::from_shared(configurer).with_role(Role::Infrastructure),
        )
    }

    /// Get or create a component of an active context.
    pub fn get(&self, name: &str) -> Result<SharedComponent> {
        if self.state != ContextState::Active {
            return Err(ContextError::illegal_state(format!(
                "context '{}' is {}, not active",
                self.config.display_name, self.state
            )));
        }
        self.container.get(name)
    }

    /// Run every definition hook, install the instance hooks and create the
    /// non-lazy singletons.
    ///
    /// A context refreshes once. On failure the singletons created so far
    /// are dropped and the context is left `Failed`.
    pub fn refresh(&mut self) -> Result<()> {
        if self.state != ContextState::Created {
            return Err(ContextError::illegal_state(format!(
                "cannot refresh context '{}' in state {}",
                self.config.display_name, self.state
            )));
        }
        self.state = ContextState::Refreshing;
        tracing::info!("Refreshing context '{}' ({})", self.config.display_name, self.id);

        match self.run_refresh() {
            Ok(()) => {
                self.state = ContextState::Active;
                tracing::info!(
                    "Context '{}' active ({} definitions, {} instance hooks)",
                    self.config.display_name,
                    self.container.definition_count(),
                    self.container.instance_hook_count()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Context '{}' refresh failed: {}", self.config.display_name, e);
                self.container.destroy_singletons();
                self.state = ContextState::Failed;
                Err(e)
            }
        }
    }

    fn run_refresh(&mut self) -> Result<()> {
        let aware: SharedComponent = Arc::new(AwareProcessor::new(
            self.environment.clone(),
            self.multicaster.clone(),
        ));
        self.container.add_instance_hook(aware);

        run_definition_mutation_phase(&mut self.container, &self.factory_hooks)?;
        register_instance_hooks(&mut self.container, &self.multicaster)?;

        self.container.freeze_configuration();
        self.container.preinstantiate_singletons()?;

        self.started_at = Some(Utc::now());
        self.multicaster.multicast(&ContextEvent::refreshed(self.id))
    }

    /// Publish `Closed` and drop the singletons. Closing twice is a no-op.
    pub fn close(&mut self) {
        match self.state {
            ContextState::Closed => return,
            ContextState::Active => {
                if let Err(e) = self.multicaster.multicast(&ContextEvent::closed(self.id)) {
                    tracing::warn!("Close event delivery failed for '{}': {}", self.config.display_name, e);
                }
            }
            _ => {}
        }
        tracing::info!("Closing context '{}'", self.config.display_name);
        self.container.destroy_singletons();
        self.state = ContextState::Closed;
    }
}

impl Default for ApplicationContext {
    fn default() -> Self {
        Self::with_valid_config(ContextConfig::default(), Environment::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Component, FactoryPostProcessor, downcast_ref};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Service;
    impl Component for Service {}

    struct CountingHook {
        calls: Arc<AtomicUsize>,
    }

    impl FactoryPostProcessor for CountingHook {
        fn post_process_factory(&self, _factory: &mut dyn ComponentFactory) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Component for CountingHook {
        fn as_factory_post_processor(&self) -> Option<&dyn FactoryPostProcessor> {
            Some(self)
        }
    }

    #[test]
    fn test_refresh_only_once() {
        let mut context = ApplicationContext::default();
        context.refresh().unwrap();
        assert!(context.is_active());
        assert!(context.started_at().is_some());

        let err = context.refresh().unwrap_err();
        assert!(matches!(err, ContextError::IllegalState { .. }));
    }

    #[test]
    fn test_get_requires_active_context() {
        let mut context = ApplicationContext::default();
        context
            .register_definition("svc", ComponentDefinition::new(|_, _| Ok(Service)))
            .unwrap();
        assert!(context.get("svc").is_err());

        context.refresh().unwrap();
        let svc = context.get("svc").unwrap();
        assert!(downcast_ref::<Service>(&svc).is_some());

        context.close();
        assert_eq!(context.state(), ContextState::Closed);
        assert!(context.get("svc").is_err());
        context.close();
        assert_eq!(context.container().singleton_count(), 0);
    }

    #[test]
    fn test_external_factory_hooks_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut context = ApplicationContext::default();
        context
            .add_factory_post_processor(Arc::new(CountingHook {
                calls: Arc::clone(&calls),
            }))
            .unwrap();
        context.refresh().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_factory_post_processor_rejects_plain_components() {
        let mut context = ApplicationContext::default();
        let err = context.add_factory_post_processor(Arc::new(Service)).unwrap_err();
        assert!(matches!(err, ContextError::CapabilityMismatch { .. }));
        assert!(context.factory_post_processors().is_empty());
    }

    #[test]
    fn test_failed_refresh_drops_singletons() {
        let mut context = ApplicationContext::default();
        context
            .register_definition("ok", ComponentDefinition::new(|_, _| Ok(Service)))
            .unwrap();
        context
            .register_definition(
                "broken",
                ComponentDefinition::new(|_, _| -> Result<Service> {
                    Err(ContextError::config("missing connection string"))
                }),
            )
            .unwrap();

        assert!(context.refresh().is_err());
        assert_eq!(context.state(), ContextState::Failed);
        assert_eq!(context.container().singleton_count(), 0);
    }

    #[test]
    fn test_module_and_overriding_config() {
        struct ServiceModule;
        impl Module for ServiceModule {
            fn register(registry: &mut dyn DefinitionRegistry) -> Result<()> {
                registry.register_definition("svc", ComponentDefinition::new(|_, _| Ok(Service)))
            }
        }

        let config = ContextConfig {
            allow_definition_overriding: false,
            ..ContextConfig::default()
        };
        let mut context = ApplicationContext::new(config, Environment::new()).unwrap();
        context.register_module::<ServiceModule>().unwrap();
        assert!(context.container().contains_definition("svc"));
        assert!(matches!(
            context.register_module::<ServiceModule>(),
            Err(ContextError::DefinitionOverride { .. })
        ));
    }
}
