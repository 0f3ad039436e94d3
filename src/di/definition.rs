use crate::di::capability::{Capability, CapabilitySet};
use crate::di::component::{Component, SharedComponent};
use crate::di::container::Container;
use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Creates the raw instance for a definition.
///
/// Receives the container (to resolve collaborators) and the merged,
/// post-processed definition being instantiated.
pub type InstanceSupplier =
    Arc<dyn Fn(&Container, &ComponentDefinition) -> Result<SharedComponent> + Send + Sync>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Scope {
    #[default]
    Singleton,
    Prototype,
}

/// What a definition is for; infrastructure components are not expected to
/// be processed by every instance hook.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    #[default]
    Application,
    Support,
    Infrastructure,
}

/// How to construct a named component.
///
/// # Example
///
/// ```
/// use meshestra_context::di::{Capability, Component, ComponentDefinition, Role};
///
/// struct Repository;
/// impl Component for Repository {}
///
/// let definition = ComponentDefinition::new(|_, _| Ok(Repository))
///     .with_role(Role::Support)
///     .with_property("url", "${db.url}");
/// assert_eq!(definition.property("url"), Some("${db.url}"));
/// assert!(!definition.declares(Capability::FactoryPostProcessor));
/// ```
#[derive(Clone, Default)]
pub struct ComponentDefinition {
    supplier: Option<InstanceSupplier>,
    parent: Option<String>,
    scope: Scope,
    role: Role,
    lazy_init: bool,
    is_abstract: bool,
    capabilities: Option<CapabilitySet>,
    properties: BTreeMap<String, String>,
    description: Option<String>,
}

impl ComponentDefinition {
    /// Definition whose instances come from `supplier`.
    ///
    /// Capabilities start out declared as empty; use
    /// [`with_capabilities`](Self::with_capabilities) for hooks, or
    /// [`with_undeclared_capabilities`](Self::with_undeclared_capabilities) to
    /// have lookups inspect an instance instead.
    pub fn new<T, F>(supplier: F) -> Self
    where
        T: Component,
        F: Fn(&Container, &ComponentDefinition) -> Result<T> + Send + Sync + 'static,
    {
        let supplier: InstanceSupplier = Arc::new(
            move |container: &Container, definition: &ComponentDefinition| -> Result<SharedComponent> {
                let instance = supplier(container, definition)?;
                Ok(Arc::new(instance))
            },
        );
        Self {
            supplier: Some(supplier),
            capabilities: Some(CapabilitySet::empty()),
            ..Self::default()
        }
    }

    /// Definition handing out clones of an existing shared instance.
    pub fn from_shared(instance: SharedComponent) -> Self {
        let capabilities = crate::di::component::capabilities_of(instance.as_ref());
        let supplier: InstanceSupplier = Arc::new(
            move |_: &Container, _: &ComponentDefinition| -> Result<SharedComponent> {
                Ok(Arc::clone(&instance))
            },
        );
        Self {
            supplier: Some(supplier),
            capabilities: Some(capabilities),
            ..Self::default()
        }
    }

    /// Abstract template holding shared properties for child definitions.
    pub fn template() -> Self {
        Self {
            is_abstract: true,
            capabilities: Some(CapabilitySet::empty()),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = lazy_init;
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl Into<CapabilitySet>) -> Self {
        self.capabilities = Some(capabilities.into());
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        let current = self.capabilities.unwrap_or_default();
        self.capabilities = Some(current | capability.as_set());
        self
    }

    /// Capabilities are only known once an instance exists.
    pub fn with_undeclared_capabilities(mut self) -> Self {
        self.capabilities = None;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn supplier(&self) -> Option<&InstanceSupplier> {
        self.supplier.as_ref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn capabilities(&self) -> Option<CapabilitySet> {
        self.capabilities
    }

    pub fn declares(&self, capability: Capability) -> bool {
        self.capabilities.is_some_and(|set| set.provides(capability))
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.properties
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    pub fn set_lazy_init(&mut self, lazy_init: bool) {
        self.lazy_init = lazy_init;
    }

    /// Flatten this child onto its parent: the child's own settings win and
    /// its properties overlay the parent's. Declared capabilities are the
    /// union of both sides.
    pub(crate) fn merged_onto(&self, parent: &ComponentDefinition) -> ComponentDefinition {
        let mut properties = parent.properties.clone();
        properties.extend(self.properties.clone());
        ComponentDefinition {
            supplier: self.supplier.clone().or_else(|| parent.supplier.clone()),
            parent: None,
            scope: self.scope,
            role: self.role,
            lazy_init: self.lazy_init,
            is_abstract: self.is_abstract,
            capabilities: match (self.capabilities, parent.capabilities) {
                (Some(own), Some(inherited)) => Some(own | inherited),
                (own, inherited) => own.or(inherited),
            },
            properties,
            description: self.description.clone().or_else(|| parent.description.clone()),
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("parent", &self.parent)
            .field("scope", &self.scope)
            .field("role", &self.role)
            .field("lazy_init", &self.lazy_init)
            .field("abstract", &self.is_abstract)
            .field("capabilities", &self.capabilities)
            .field("properties", &self.properties)
            .field("has_supplier", &self.supplier.is_some())
            .finish()
    }
}
