use crate::di::{Capability, ComponentFactory, SharedComponent};
use crate::error::Result;
use crate::lifecycle::{EventMulticaster, ListenerDetector};
use crate::order::{PriorityClass, classify_definition, sort_components};
use crate::processor::checker::HookChainChecker;
use std::sync::Arc;

/// Install every registered instance hook into the factory's chain.
///
/// The chain ends up as: hooks already present, the diagnostic checker,
/// top-priority hooks, ordered hooks, plain hooks, the merged-definition
/// hooks once more, and finally the listener detector feeding `multicaster`.
pub fn register_instance_hooks(
    factory: &mut dyn ComponentFactory,
    multicaster: &EventMulticaster,
) -> Result<()> {
    let names = factory.names_for_capability(Capability::InstancePostProcessor, true, false)?;

    let target_count = factory.instance_hook_count() + 1 + names.len();
    let checker: SharedComponent = Arc::new(HookChainChecker::new(
        factory.hook_chain(),
        factory.definition_store(),
        target_count,
    ));
    factory.add_instance_hook(checker);

    let mut top = Vec::new();
    let mut internal = Vec::new();
    let mut ordered_names = Vec::new();
    let mut plain_names = Vec::new();
    for name in &names {
        match classify_definition(factory, name)? {
            PriorityClass::Top => {
                let hook = factory.get_component(name, Capability::InstancePostProcessor)?;
                collect_internal(&hook, &mut internal);
                top.push(hook);
            }
            PriorityClass::Ordered => ordered_names.push(name.as_str()),
            PriorityClass::Plain => plain_names.push(name.as_str()),
        }
    }

    sort_components(&mut top, factory);
    factory.add_instance_hooks(&top);

    let mut ordered = Vec::with_capacity(ordered_names.len());
    for name in ordered_names {
        let hook = factory.get_component(name, Capability::InstancePostProcessor)?;
        collect_internal(&hook, &mut internal);
        ordered.push(hook);
    }
    sort_components(&mut ordered, factory);
    factory.add_instance_hooks(&ordered);

    let mut plain = Vec::with_capacity(plain_names.len());
    for name in plain_names {
        let hook = factory.get_component(name, Capability::InstancePostProcessor)?;
        collect_internal(&hook, &mut internal);
        plain.push(hook);
    }
    factory.add_instance_hooks(&plain);

    // Merged-definition hooks move behind everything registered above.
    sort_components(&mut internal, factory);
    factory.add_instance_hooks(&internal);

    let detector: SharedComponent = Arc::new(ListenerDetector::new(
        multicaster.clone(),
        factory.definition_store(),
    ));
    factory.add_instance_hook(detector);

    tracing::debug!(
        discovered = names.len(),
        internal = internal.len(),
        chain = factory.instance_hook_count(),
        "Instance hooks registered"
    );
    Ok(())
}

fn collect_internal(hook: &SharedComponent, internal: &mut Vec<SharedComponent>) {
    if hook.as_merged_definition_post_processor().is_some() {
        internal.push(Arc::clone(hook));
    }
}
