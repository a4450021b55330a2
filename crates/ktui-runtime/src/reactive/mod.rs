#![forbid(unsafe_code)]

//! Reactive bindings for ktui.
//!
//! This module provides the change-propagation primitives that keep list
//! sections in sync with application state:
//!
//! - [`Property`]: a thread-safe value cell that replays its current value
//!   to new subscribers.
//! - [`Signal`]: a stateless broadcast channel.
//! - [`Binding`] / [`AnyBinding`]: the observable abstraction and its
//!   type-erased form.
//! - [`BindingExt`]: operators (`map`, `filter`, `scan`, `debounce`, ...).
//! - [`Subscription`] and [`CancelBag`]: RAII lifecycle tokens.
//!
//! # Architecture
//!
//! `Property<T>` and `Signal<T>` keep their subscribers behind an
//! `Arc<Mutex<..>>`. Notification copies the subscriber list, releases the
//! lock, then dispatches each delivery onto the subscriber's
//! [`ExecutionContext`](crate::ExecutionContext). Every delivery re-checks a
//! per-subscriber liveness flag, so a cancelled subscription never receives a
//! value, even one already queued on the main context.
//!
//! Derived bindings are closures over their upstream. Each `observe` on a
//! derived binding subscribes upstream anew with fresh operator state.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. For a given subscriber, values arrive in send order.
//! 3. Cancelling a [`Subscription`] is idempotent and takes effect before the
//!    next delivery.

pub mod binding;
mod fanout;
pub mod lifecycle;
pub mod operators;
pub mod property;
pub mod signal;
mod timing;

pub use binding::{AnyBinding, Binding, Handler, just};
pub use lifecycle::{CancelBag, Subscription};
pub use operators::{BindingExt, combine_latest, combine_latest_all};
pub use property::Property;
pub use signal::Signal;
