#![forbid(unsafe_code)]

//! Reactive runtime for ktui.
//!
//! Provides the binding primitives ([`Property`], [`Signal`], operators),
//! subscription lifecycle ([`Subscription`], [`CancelBag`]), execution
//! contexts and the timers that drive time-based operators.

pub mod config;
pub mod executor;
pub mod loadable;
pub mod reactive;
mod sync;
pub mod timer;

pub use config::{DEFAULT_SELECTION_DEBOUNCE, DEFAULT_TAP_THROTTLE, InteractionConfig};
#[cfg(feature = "policy-config")]
pub use config::ConfigError;
pub use executor::{ExecutionContext, Executor, MainQueue, Task};
pub use loadable::LoadableState;
pub use reactive::{
    AnyBinding, Binding, BindingExt, CancelBag, Handler, Property, Signal, Subscription,
    combine_latest, combine_latest_all, just,
};
pub use timer::{ManualScheduler, Scheduler, TimerHandle, TimerThread};
