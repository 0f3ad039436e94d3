use crate::di::{
    Capability, ComponentFactory, SharedComponent, factory_post_processor_of,
};
use crate::error::{ContextError, Result};
use crate::order::{PriorityClass, classify_definition, sort_components};
use std::collections::HashSet;

/// Names of registry hooks already invoked during one bootstrap.
#[derive(Debug, Default)]
struct ProcessedSet {
    names: HashSet<String>,
}

impl ProcessedSet {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn mark(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }
}

/// Run the registry phase to its fixpoint, then the factory phase.
///
/// `external_hooks` are pre-built definition-mutating hooks handed in by the
/// caller; they run before anything registered in the factory. When the
/// factory cannot accept new definitions, external hooks only see the
/// factory phase.
///
/// Cached merged definitions are dropped at the end, since hooks may have
/// rewritten raw definition values.
pub fn run_definition_mutation_phase(
    factory: &mut dyn ComponentFactory,
    external_hooks: &[SharedComponent],
) -> Result<()> {
    let mut processed = ProcessedSet::default();

    if factory.as_registry_mut().is_some() {
        let mut regular: Vec<SharedComponent> = Vec::new();
        let mut registry_processors: Vec<SharedComponent> = Vec::new();

        for hook in external_hooks {
            if hook.as_registry_post_processor().is_some() {
                invoke_registry_processors(std::slice::from_ref(hook), factory)?;
                registry_processors.push(SharedComponent::clone(hook));
            } else if factory_post_processor_of(hook.as_ref()).is_some() {
                regular.push(SharedComponent::clone(hook));
            } else {
                return Err(not_a_factory_hook(hook));
            }
        }

        // Top-priority hooks first.
        let names = factory.names_for_capability(Capability::RegistryPostProcessor, true, false)?;
        let mut current = Vec::new();
        for name in &names {
            if !processed.contains(name) && factory.is_type_match(name, Capability::PriorityOrdered)? {
                current.push(factory.get_component(name, Capability::RegistryPostProcessor)?);
                processed.mark(name);
            }
        }
        sort_components(&mut current, factory);
        invoke_registry_processors(&current, factory)?;
        registry_processors.append(&mut current);

        // Then ordered ones; the lookup may have grown.
        let names = factory.names_for_capability(Capability::RegistryPostProcessor, true, false)?;
        for name in &names {
            if !processed.contains(name) && factory.is_type_match(name, Capability::Ordered)? {
                current.push(factory.get_component(name, Capability::RegistryPostProcessor)?);
                processed.mark(name);
            }
        }
        sort_components(&mut current, factory);
        invoke_registry_processors(&current, factory)?;
        registry_processors.append(&mut current);

        // Everything else, until a pass finds nothing new.
        let mut pass = 0usize;
        loop {
            let names =
                factory.names_for_capability(Capability::RegistryPostProcessor, true, false)?;
            for name in &names {
                if !processed.contains(name) {
                    current.push(factory.get_component(name, Capability::RegistryPostProcessor)?);
                    processed.mark(name);
                }
            }
            if current.is_empty() {
                break;
            }
            pass += 1;
            tracing::debug!(pass, discovered = current.len(), "Registry hook fixpoint pass");
            sort_components(&mut current, factory);
            invoke_registry_processors(&current, factory)?;
            registry_processors.append(&mut current);
        }

        invoke_factory_processors(&registry_processors, factory)?;
        invoke_factory_processors(&regular, factory)?;
    } else {
        tracing::debug!("Factory does not accept definitions, skipping registry phase");
        for hook in external_hooks {
            if factory_post_processor_of(hook.as_ref()).is_none() {
                return Err(not_a_factory_hook(hook));
            }
        }
        invoke_factory_processors(external_hooks, factory)?;
    }

    run_factory_phase(factory, &processed)?;

    factory.clear_metadata_cache();
    Ok(())
}

fn run_factory_phase(factory: &mut dyn ComponentFactory, processed: &ProcessedSet) -> Result<()> {
    let names = factory.names_for_capability(Capability::FactoryPostProcessor, true, false)?;

    let mut top = Vec::new();
    let mut ordered_names = Vec::new();
    let mut plain_names = Vec::new();
    for name in names {
        if processed.contains(&name) {
            continue;
        }
        match classify_definition(factory, &name)? {
            PriorityClass::Top => {
                top.push(factory.get_component(&name, Capability::FactoryPostProcessor)?)
            }
            PriorityClass::Ordered => ordered_names.push(name),
            PriorityClass::Plain => plain_names.push(name),
        }
    }

    sort_components(&mut top, factory);
    invoke_factory_processors(&top, factory)?;

    let mut ordered = Vec::with_capacity(ordered_names.len());
    for name in &ordered_names {
        ordered.push(factory.get_component(name, Capability::FactoryPostProcessor)?);
    }
    sort_components(&mut ordered, factory);
    invoke_factory_processors(&ordered, factory)?;

    let mut plain = Vec::with_capacity(plain_names.len());
    for name in &plain_names {
        plain.push(factory.get_component(name, Capability::FactoryPostProcessor)?);
    }
    invoke_factory_processors(&plain, factory)?;

    tracing::debug!(
        top = top.len(),
        ordered = ordered.len(),
        plain = plain.len(),
        "Factory phase complete"
    );
    Ok(())
}

fn invoke_registry_processors(
    hooks: &[SharedComponent],
    factory: &mut dyn ComponentFactory,
) -> Result<()> {
    for hook in hooks {
        let Some(processor) = hook.as_registry_post_processor() else {
            continue;
        };
        let registry = factory.as_registry_mut().ok_or_else(|| {
            ContextError::illegal_state("factory stopped accepting definitions")
        })?;
        let _span = tracing::debug_span!("post_process_registry", hook = hook.type_name()).entered();
        processor.post_process_registry(registry)?;
    }
    Ok(())
}

fn invoke_factory_processors(
    hooks: &[SharedComponent],
    factory: &mut dyn ComponentFactory,
) -> Result<()> {
    for hook in hooks {
        let Some(processor) = factory_post_processor_of(hook.as_ref()) else {
            continue;
        };
        let _span = tracing::debug_span!("post_process_factory", hook = hook.type_name()).entered();
        processor.post_process_factory(factory)?;
    }
    Ok(())
}

fn not_a_factory_hook(hook: &SharedComponent) -> ContextError {
    ContextError::CapabilityMismatch {
        name: hook.type_name().to_string(),
        required: Capability::FactoryPostProcessor.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{
        Component, ComponentDefinition, Container, DefinitionRegistry, FactoryPostProcessor,
        RegistryPostProcessor,
    };
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        id: String,
        log: Log,
    }

    impl FactoryPostProcessor for Recorder {
        fn post_process_factory(&self, _factory: &mut dyn ComponentFactory) -> Result<()> {
            self.log.lock().unwrap().push(format!("factory:{}", self.id));
            Ok(())
        }
    }

    impl RegistryPostProcessor for Recorder {
        fn post_process_registry(&self, _registry: &mut dyn DefinitionRegistry) -> Result<()> {
            self.log.lock().unwrap().push(format!("registry:{}", self.id));
            Ok(())
        }
    }

    impl Component for Recorder {
        fn as_registry_post_processor(&self) -> Option<&dyn RegistryPostProcessor> {
            Some(self)
        }
    }

    fn registry_hook(id: &str, log: &Log) -> ComponentDefinition {
        let id = id.to_string();
        let log = Arc::clone(log);
        ComponentDefinition::new(move |_, _| {
            Ok(Recorder {
                id: id.clone(),
                log: Arc::clone(&log),
            })
        })
        .with_capability(Capability::RegistryPostProcessor)
    }

    #[test]
    fn test_registry_hooks_run_registry_then_factory_callbacks() {
        let log: Log = Arc::default();
        let mut container = Container::new();
        container.register_definition("a", registry_hook("a", &log)).unwrap();
        container.register_definition("b", registry_hook("b", &log)).unwrap();

        run_definition_mutation_phase(&mut container, &[]).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["registry:a", "registry:b", "factory:a", "factory:b"]
        );
    }

    #[test]
    fn test_rejects_external_hook_without_factory_capability() {
        struct NotAHook;
        impl Component for NotAHook {}

        let hook: SharedComponent = Arc::new(NotAHook);
        let mut container = Container::new();
        let err = run_definition_mutation_phase(&mut container, &[hook]).unwrap_err();
        assert!(matches!(err, ContextError::CapabilityMismatch { .. }));
    }

    #[test]
    fn test_creation_failure_aborts_phase() {
        let log: Log = Arc::default();
        let mut container = Container::new();
        container.register_definition("a", registry_hook("a", &log)).unwrap();
        container
            .register_definition(
                "broken",
                ComponentDefinition::new(|_, _| -> Result<Recorder> {
                    Err(anyhow::anyhow!("boom").into())
                })
                .with_capability(Capability::RegistryPostProcessor),
            )
            .unwrap();

        let err = run_definition_mutation_phase(&mut container, &[]).unwrap_err();
        assert!(matches!(err, ContextError::Creation { ref name, .. } if name == "broken"));
        assert!(log.lock().unwrap().iter().all(|entry| !entry.starts_with("factory:")));
    }
}
