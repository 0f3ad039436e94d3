//! Context lifecycle
//!
//! ```text
//! Created
//!    ↓ refresh()
//! Refreshing
//!    1. aware hook installed
//!    2. definition hooks (registry phase, factory phase)
//!    3. instance hooks installed
//!    4. configuration frozen, non-lazy singletons created
//!    5. Refreshed published
//!    ↓                      ↘ on error
//! Active                     Failed
//!    ↓ close()
//! Closed  (Closed published, singletons dropped)
//! ```

mod aware;
mod context;
mod events;
mod listener;

pub use aware::AwareProcessor;
pub use context::{ApplicationContext, ContextState, PLACEHOLDER_CONFIGURER_NAME};
pub use events::{ContextEvent, EventMulticaster};
pub use listener::ListenerDetector;
