#![forbid(unsafe_code)]

//! Test harness for ktui lists.
//!
//! [`RecordingHost`] stands in for a native list widget. It keeps its own
//! copy of the displayed item ids and updates it only from what the engine
//! sends (wholesale replacements and batch changesets), the way a real
//! widget would. Comparing that copy with the engine's snapshot checks that
//! changesets are sufficient to converge.
//!
//! [`fixtures`] provides a small movie catalogue to build sections from.

pub mod fixtures;
mod recording;

pub use recording::{HostEvent, MockLayout, MockView, RecordingHost, replay};
