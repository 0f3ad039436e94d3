//! Bootstrap orchestration of definition and instance hooks.
//!
//! ```text
//! run_definition_mutation_phase
//!   external registry hooks
//!   top / ordered registry hooks
//!   fixpoint over newly registered registry hooks
//!   factory callbacks of all registry hooks, then external plain hooks
//!   top / ordered / plain factory hooks
//!   clear merged-definition cache
//!
//! register_instance_hooks
//!   checker ─ top ─ ordered ─ plain ─ merged-definition hooks ─ listener detector
//! ```

mod checker;
mod instance_hooks;
mod phases;
mod placeholder;

pub use checker::HookChainChecker;
pub use instance_hooks::register_instance_hooks;
pub use phases::run_definition_mutation_phase;
pub use placeholder::PlaceholderConfigurer;
