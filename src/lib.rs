//! # Meshestra Context
//!
//! Bootstrap orchestration for the Meshestra component container.
//!
//! A context owns a [`Container`] of named [`ComponentDefinition`]s. On
//! refresh it runs every definition hook (hooks that may register further
//! definitions and further hooks while they run), installs the instance hooks
//! that wrap every component's creation, and then creates the eager
//! singletons.
//!
//! ## Features
//!
//! - **Priority classes**: hooks run top-priority first, then by order key,
//!   then in discovery order
//! - **Self-registering hooks**: registry hooks are re-discovered until no
//!   new ones appear, and each runs exactly once
//! - **Instance hook chain**: ordered interception around every component's
//!   initialization, with diagnostics for components created too early
//! - **Placeholders**: `${name:default}` substitution in definition
//!   properties from an [`Environment`]
//! - **Context events**: listeners registered automatically and notified on
//!   refresh and close
//!
//! ## Quick Start
//!
//! ```rust
//! use meshestra_context::prelude::*;
//!
//! struct Repository {
//!     url: String,
//! }
//! impl Component for Repository {}
//!
//! let environment = Environment::new().with_property("db.url", "postgres://db");
//! let mut context = ApplicationContext::new(ContextConfig::default(), environment).unwrap();
//! context.register_placeholder_configurer().unwrap();
//! context
//!     .register_definition(
//!         "repository",
//!         ComponentDefinition::new(|_, definition| {
//!             Ok(Repository {
//!                 url: definition.property("url").unwrap_or_default().to_string(),
//!             })
//!         })
//!         .with_property("url", "${db.url}"),
//!     )
//!     .unwrap();
//!
//! context.refresh().unwrap();
//! let repository = context.get("repository").unwrap();
//! assert_eq!(downcast_ref::<Repository>(&repository).unwrap().url, "postgres://db");
//! ```

pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod module;
pub mod order;
pub mod processor;

// Re-export core types
pub use config::{ContextConfig, Environment};
pub use di::{
    Capability, Component, ComponentDefinition, ComponentFactory, Container, ContainerBuilder,
    DefinitionRegistry, SharedComponent,
};
pub use error::{ContextError, Result};
pub use lifecycle::{ApplicationContext, ContextEvent, ContextState};
pub use module::Module;

/// Prelude module for convenient imports
///
/// ```
/// use meshestra_context::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ContextConfig, Environment, PlaceholderHelper};
    pub use crate::di::{
        Capability, CapabilitySet, Component, ComponentDefinition, ComponentFactory, Container,
        ContainerBuilder, DefinitionRegistry, DefinitionSource, EnvironmentAware, EventListener,
        EventPublisherAware, FactoryPostProcessor, InstancePostProcessor,
        MergedDefinitionPostProcessor, RegistryPostProcessor, Role, Scope, SharedComponent,
        downcast_ref,
    };
    pub use crate::error::{ContextError, Result};
    pub use crate::lifecycle::{ApplicationContext, ContextEvent, ContextState, EventMulticaster};
    pub use crate::module::Module;
    pub use crate::processor::PlaceholderConfigurer;
    pub use std::sync::Arc;
}
