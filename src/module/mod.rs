use crate::di::DefinitionRegistry;
use crate::error::Result;

/// A group of definitions registered together.
///
/// # Example
/// ```
/// use meshestra_context::di::{Component, ComponentDefinition, DefinitionRegistry};
/// use meshestra_context::{Module, Result};
///
/// struct UserRepository;
/// impl Component for UserRepository {}
///
/// struct UserModule;
///
/// impl Module for UserModule {
///     fn register(registry: &mut dyn DefinitionRegistry) -> Result<()> {
///         registry.register_definition(
///             "userRepository",
///             ComponentDefinition::new(|_, _| Ok(UserRepository)),
///         )
///     }
/// }
/// ```
pub trait Module {
    /// Register this module's definitions.
    fn register(registry: &mut dyn DefinitionRegistry) -> Result<()>;
}
