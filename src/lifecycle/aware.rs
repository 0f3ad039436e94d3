use crate::config::Environment;
use crate::di::{Component, InstancePostProcessor, SharedComponent};
use crate::error::Result;
use crate::lifecycle::events::EventMulticaster;

/// Injects the context environment and event publisher into components that
/// ask for them, before their own initialization runs.
pub struct AwareProcessor {
    environment: Environment,
    publisher: EventMulticaster,
}

impl AwareProcessor {
    pub fn new(environment: Environment, publisher: EventMulticaster) -> Self {
        Self {
            environment,
            publisher,
        }
    }
}

impl InstancePostProcessor for AwareProcessor {
    fn before_initialization(&self, component: SharedComponent, _name: &str) -> Result<SharedComponent> {
        if let Some(aware) = component.as_environment_aware() {
            aware.set_environment(self.environment.clone());
        }
        if let Some(aware) = component.as_event_publisher_aware() {
            aware.set_event_publisher(self.publisher.clone());
        }
        Ok(component)
    }
}

impl Component for AwareProcessor {
    fn as_instance_post_processor(&self) -> Option<&dyn InstancePostProcessor> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{EnvironmentAware, EventPublisherAware};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Consumer {
        environment: Mutex<Option<Environment>>,
        publisher: Mutex<Option<EventMulticaster>>,
    }

    impl EnvironmentAware for Consumer {
        fn set_environment(&self, environment: Environment) {
            *self.environment.lock().unwrap() = Some(environment);
        }
    }

    impl EventPublisherAware for Consumer {
        fn set_event_publisher(&self, publisher: EventMulticaster) {
            *self.publisher.lock().unwrap() = Some(publisher);
        }
    }

    impl Component for Consumer {
        fn as_environment_aware(&self) -> Option<&dyn EnvironmentAware> {
            Some(self)
        }

        fn as_event_publisher_aware(&self) -> Option<&dyn EventPublisherAware> {
            Some(self)
        }
    }

    #[test]
    fn test_injects_environment_and_publisher() {
        let environment = Environment::new().with_property("region", "eu-west-1");
        let processor = AwareProcessor::new(environment, EventMulticaster::new());
        let consumer = Arc::new(Consumer::default());

        processor.before_initialization(consumer.clone(), "consumer").unwrap();

        let injected = consumer.environment.lock().unwrap().clone().unwrap();
        assert_eq!(injected.get("region").as_deref(), Some("eu-west-1"));
        assert!(consumer.publisher.lock().unwrap().is_some());
    }
}
