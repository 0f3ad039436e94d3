//! Priority classes and the default hook ordering.
//!
//! Every hook falls into exactly one of three classes. `Top` sorts before
//! `Ordered`, which sorts before `Plain`; within a class lower order keys come
//! first and ties keep discovery order.

use crate::di::{Capability, Component, ComponentFactory, SharedComponent};
use crate::error::Result;
use std::cmp::Ordering;

pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PriorityClass {
    Top,
    Ordered,
    Plain,
}

/// Class of an existing instance.
pub fn classify(component: &dyn Component) -> PriorityClass {
    if component.is_priority_ordered() {
        PriorityClass::Top
    } else if component.order().is_some() {
        PriorityClass::Ordered
    } else {
        PriorityClass::Plain
    }
}

/// Class of a named definition, without creating it.
pub fn classify_definition(factory: &dyn ComponentFactory, name: &str) -> Result<PriorityClass> {
    if factory.is_type_match(name, Capability::PriorityOrdered)? {
        Ok(PriorityClass::Top)
    } else if factory.is_type_match(name, Capability::Ordered)? {
        Ok(PriorityClass::Ordered)
    } else {
        Ok(PriorityClass::Plain)
    }
}

/// Order key; components without one sort last.
pub fn order_key(component: &dyn Component) -> Option<i32> {
    component.order()
}

/// The default comparator.
///
/// `Top` wins over everything else; otherwise components compare by order
/// key, with unkeyed components at [`LOWEST_PRECEDENCE`].
pub fn compare(a: &dyn Component, b: &dyn Component) -> Ordering {
    let top_a = a.is_priority_ordered();
    let top_b = b.is_priority_ordered();
    match (top_a, top_b) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    let key_a = order_key(a).unwrap_or(LOWEST_PRECEDENCE);
    let key_b = order_key(b).unwrap_or(LOWEST_PRECEDENCE);
    key_a.cmp(&key_b)
}

/// Stable sort with the factory's comparator, or [`compare`] when it has none.
pub fn sort_components(components: &mut [SharedComponent], factory: &dyn ComponentFactory) {
    if components.len() <= 1 {
        return;
    }
    match factory.dependency_comparator() {
        Some(comparator) => components.sort_by(|a, b| comparator(a.as_ref(), b.as_ref())),
        None => components.sort_by(|a, b| compare(a.as_ref(), b.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{ComponentDefinition, Container, DefinitionRegistry};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct Hook {
        id: &'static str,
        order: Option<i32>,
        top: bool,
    }

    impl Component for Hook {
        fn order(&self) -> Option<i32> {
            self.order
        }

        fn is_priority_ordered(&self) -> bool {
            self.top
        }
    }

    fn hook(id: &'static str, order: Option<i32>, top: bool) -> SharedComponent {
        Arc::new(Hook { id, order, top })
    }

    fn ids(components: &[SharedComponent]) -> Vec<&'static str> {
        components
            .iter()
            .map(|c| crate::di::downcast_ref::<Hook>(c).unwrap().id)
            .collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&Hook { id: "a", order: Some(1), top: true }), PriorityClass::Top);
        assert_eq!(classify(&Hook { id: "b", order: Some(1), top: false }), PriorityClass::Ordered);
        assert_eq!(classify(&Hook { id: "c", order: None, top: false }), PriorityClass::Plain);
        assert_eq!(PriorityClass::Top.to_string(), "top");
    }

    #[test]
    fn test_classes_then_keys_then_discovery_order() {
        let container = Container::new();
        let mut hooks = vec![
            hook("plain", None, false),
            hook("ordered-5", Some(5), false),
            hook("top-2", Some(2), true),
            hook("ordered-1", Some(1), false),
            hook("ordered-1b", Some(1), false),
            hook("top-1", Some(1), true),
        ];
        sort_components(&mut hooks, &container);
        assert_eq!(
            ids(&hooks),
            vec!["top-1", "top-2", "ordered-1", "ordered-1b", "ordered-5", "plain"]
        );
    }

    #[test]
    fn test_top_without_key_still_precedes_ordered() {
        let container = Container::new();
        let mut hooks = vec![hook("ordered", Some(HIGHEST_PRECEDENCE), false), hook("top", None, true)];
        sort_components(&mut hooks, &container);
        assert_eq!(ids(&hooks), vec!["top", "ordered"]);
    }

    #[test]
    fn test_custom_comparator_wins_and_singletons_skip_sorting() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut container = Container::new();
        container.set_dependency_comparator(Arc::new(move |a: &dyn Component, b: &dyn Component| {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
            compare(b, a)
        }));

        let mut single = vec![hook("only", Some(1), false)];
        sort_components(&mut single, &container);
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);

        let mut hooks = vec![hook("first", Some(1), false), hook("second", Some(2), false)];
        sort_components(&mut hooks, &container);
        assert!(calls.load(AtomicOrdering::SeqCst) > 0);
        assert_eq!(ids(&hooks), vec!["second", "first"]);
    }

    #[test]
    fn test_classify_definition_uses_declared_capabilities() {
        let mut container = Container::new();
        container
            .register_definition(
                "top",
                ComponentDefinition::new(|_, _| Ok(Hook { id: "top", order: None, top: true }))
                    .with_capability(Capability::PriorityOrdered),
            )
            .unwrap();
        container
            .register_definition(
                "ordered",
                ComponentDefinition::new(|_, _| Ok(Hook { id: "ordered", order: Some(3), top: false }))
                    .with_capability(Capability::Ordered),
            )
            .unwrap();
        container
            .register_definition(
                "plain",
                ComponentDefinition::new(|_, _| Ok(Hook { id: "plain", order: None, top: false })),
            )
            .unwrap();

        assert_eq!(classify_definition(&container, "top").unwrap(), PriorityClass::Top);
        assert_eq!(classify_definition(&container, "ordered").unwrap(), PriorityClass::Ordered);
        assert_eq!(classify_definition(&container, "plain").unwrap(), PriorityClass::Plain);
        assert!(!container.contains_singleton("top"));
    }
}
