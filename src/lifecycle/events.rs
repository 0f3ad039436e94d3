use crate::di::{Capability, SharedComponent};
use crate::error::{ContextError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Events published by an [`ApplicationContext`](super::ApplicationContext).
#[derive(Debug, Clone, PartialEq, Serialize, strum_macros::Display)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContextEvent {
    Refreshed {
        context_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    Closed {
        context_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl ContextEvent {
    pub fn refreshed(context_id: Uuid) -> Self {
        Self::Refreshed {
            context_id,
            timestamp: Utc::now(),
        }
    }

    pub fn closed(context_id: Uuid) -> Self {
        Self::Closed {
            context_id,
            timestamp: Utc::now(),
        }
    }

    pub fn context_id(&self) -> Uuid {
        match self {
            Self::Refreshed { context_id, .. } | Self::Closed { context_id, .. } => *context_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Refreshed { timestamp, .. } | Self::Closed { timestamp, .. } => *timestamp,
        }
    }
}

struct RegisteredListener {
    name: String,
    component: SharedComponent,
}

/// Delivers context events to registered listeners, in registration order.
///
/// Clones share the same listener list.
#[derive(Clone, Default)]
pub struct EventMulticaster {
    listeners: Arc<RwLock<Vec<RegisteredListener>>>,
}

impl EventMulticaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component` under `name`; a listener already registered
    /// under that name is replaced in place.
    pub fn add_listener(&self, name: &str, component: SharedComponent) -> Result<()> {
        if component.as_event_listener().is_none() {
            return Err(ContextError::CapabilityMismatch {
                name: name.to_string(),
                required: Capability::EventListener.to_string(),
            });
        }
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        match listeners.iter_mut().find(|l| l.name == name) {
            Some(existing) => existing.component = component,
            None => listeners.push(RegisteredListener {
                name: name.to_string(),
                component,
            }),
        }
        Ok(())
    }

    pub fn remove_listener(&self, name: &str) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| l.name != name);
        listeners.len() != before
    }

    pub fn listener_names(&self) -> Vec<String> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener; the first failure stops delivery.
    pub fn multicast(&self, event: &ContextEvent) -> Result<()> {
        let snapshot: Vec<(String, SharedComponent)> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|l| (l.name.clone(), Arc::clone(&l.component)))
            .collect();

        tracing::debug!(event = %event, listeners = snapshot.len(), "Multicasting context event");
        for (name, component) in snapshot {
            if let Some(listener) = component.as_event_listener() {
                listener.on_event(event).map_err(|e| {
                    tracing::error!("Listener '{}' failed on {}: {}", name, event, e);
                    e
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Component, EventListener};
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl EventListener for Recorder {
        fn on_event(&self, event: &ContextEvent) -> Result<()> {
            self.seen.lock().unwrap().push(event.to_string());
            Ok(())
        }
    }

    impl Component for Recorder {
        fn as_event_listener(&self) -> Option<&dyn EventListener> {
            Some(self)
        }
    }

    struct Failing;

    impl EventListener for Failing {
        fn on_event(&self, _event: &ContextEvent) -> Result<()> {
            Err(anyhow::anyhow!("listener down").into())
        }
    }

    impl Component for Failing {
        fn as_event_listener(&self) -> Option<&dyn EventListener> {
            Some(self)
        }
    }

    struct Silent;
    impl Component for Silent {}

    #[test]
    fn test_multicast_in_registration_order() {
        let multicaster = EventMulticaster::new();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        multicaster.add_listener("recorder", recorder.clone()).unwrap();

        let id = Uuid::new_v4();
        multicaster.multicast(&ContextEvent::refreshed(id)).unwrap();
        multicaster.multicast(&ContextEvent::closed(id)).unwrap();

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["refreshed", "closed"]);
    }

    #[test]
    fn test_rejects_non_listener_and_replaces_by_name() {
        let multicaster = EventMulticaster::new();
        assert!(multicaster.add_listener("silent", Arc::new(Silent)).is_err());

        let first = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let second = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        multicaster.add_listener("audit", first.clone()).unwrap();
        multicaster.add_listener("audit", second.clone()).unwrap();
        assert_eq!(multicaster.len(), 1);

        multicaster.multicast(&ContextEvent::refreshed(Uuid::new_v4())).unwrap();
        assert!(first.seen.lock().unwrap().is_empty());
        assert_eq!(second.seen.lock().unwrap().len(), 1);

        assert!(multicaster.remove_listener("audit"));
        assert!(multicaster.is_empty());
    }

    #[test]
    fn test_listener_failure_propagates() {
        let multicaster = EventMulticaster::new();
        multicaster.add_listener("failing", Arc::new(Failing)).unwrap();
        assert!(multicaster.multicast(&ContextEvent::closed(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ContextEvent::refreshed(Uuid::nil());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "refreshed");
        assert_eq!(json["context_id"], Uuid::nil().to_string());
        assert_eq!(event.context_id(), Uuid::nil());
    }
}
