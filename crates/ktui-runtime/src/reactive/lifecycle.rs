#![forbid(unsafe_code)]

//! Subscription lifecycle: cancellable tokens and the bag that owns them.
//!
//! Every `observe` returns a [`Subscription`]. The token is an RAII guard:
//! dropping it cancels the underlying registration. A [`CancelBag`] collects
//! tokens for a logical owner (a screen, a list controller) so that dropping
//! the owner tears down every binding it created.
//!
//! # Usage
//!
//! ```ignore
//! let mut bag = CancelBag::new();
//! let title = Property::new(String::from("Inbox"));
//!
//! title
//!     .observe(ExecutionContext::Main, |t| println!("title: {t}"))
//!     .store_in(&mut bag);
//!
//! // Dropping `bag` cancels the observation.
//! ```
//!
//! # Invariants
//!
//! 1. `Subscription::cancel()` runs its teardown at most once.
//! 2. A bag cancels its tokens in insertion order, on `cancel()` and on drop.
//! 3. After `cancel()` the bag is empty and reusable.

use std::fmt;

/// Cancellable handle for an active observation.
///
/// Dropping the token cancels it. Use [`Subscription::store_in`] to hand it to
/// a [`CancelBag`] instead of keeping it in a local.
#[must_use = "dropping a Subscription cancels the observation immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// A token that runs `teardown` when cancelled.
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A token with nothing to cancel.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// A token that cancels every token in `parts`, in order.
    pub fn compound(parts: impl IntoIterator<Item = Subscription>) -> Self {
        let mut parts: Vec<Subscription> = parts.into_iter().collect();
        if parts.is_empty() {
            return Self::empty();
        }
        Self::new(move || {
            for part in &mut parts {
                part.cancel();
            }
        })
    }

    /// Stop delivery. Calling this more than once is a no-op.
    pub fn cancel(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    /// Whether this token still has a registration to cancel.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    /// Move this token into `bag`.
    pub fn store_in(self, bag: &mut CancelBag) {
        bag.insert(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Ordered collection of [`Subscription`]s released together.
#[derive(Default)]
pub struct CancelBag {
    tokens: Vec<Subscription>,
}

impl CancelBag {
    /// An empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Hold `token` until the bag is cancelled or dropped.
    pub fn insert(&mut self, token: Subscription) {
        self.tokens.push(token);
    }

    /// Cancel every held token in insertion order. The bag stays usable.
    pub fn cancel(&mut self) {
        for mut token in self.tokens.drain(..) {
            token.cancel();
        }
    }

    /// Number of held tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the bag holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Extend<Subscription> for CancelBag {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.tokens.extend(iter);
    }
}

impl Drop for CancelBag {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for CancelBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelBag")
            .field("len", &self.tokens.len())
            .finish()
    }
}
