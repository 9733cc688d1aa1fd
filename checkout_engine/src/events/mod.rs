//! Order lifecycle events.
//!
//! The APIs publish an event after each committed state change. Hooks are registered on [`EventHooks`], turned into
//! running handlers with [`EventHandlers`], and the APIs are handed the matching [`EventProducers`].
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers, HookFuture};
