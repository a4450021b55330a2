#![forbid(unsafe_code)]

//! Interaction timing policy.
//!
//! [`InteractionConfig`] carries the user-facing timing defaults of the list
//! toolkit: how long item selection is debounced and how long repeated taps
//! are throttled. Both are plain values with builder setters.
//!
//! With the `policy-config` feature the struct also derives `serde` and can be
//! loaded from TOML or JSON. Durations are written in milliseconds:
//!
//! ```toml
//! selection_debounce_ms = 250
//! tap_throttle_ms = 300
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::reactive::{AnyBinding, Binding, BindingExt};
use crate::timer::Scheduler;

/// Default selection debounce.
pub const DEFAULT_SELECTION_DEBOUNCE: Duration = Duration::from_millis(500);
/// Default tap throttle window.
pub const DEFAULT_TAP_THROTTLE: Duration = Duration::from_millis(300);

/// Timing policy for user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct InteractionConfig {
    /// Quiet period before a selection is delivered. Zero delivers at once.
    #[cfg_attr(
        feature = "policy-config",
        serde(rename = "selection_debounce_ms", with = "millis")
    )]
    pub selection_debounce: Duration,
    /// Window during which repeated taps are dropped.
    #[cfg_attr(
        feature = "policy-config",
        serde(rename = "tap_throttle_ms", with = "millis")
    )]
    pub tap_throttle: Duration,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            selection_debounce: DEFAULT_SELECTION_DEBOUNCE,
            tap_throttle: DEFAULT_TAP_THROTTLE,
        }
    }
}

impl InteractionConfig {
    /// Set the selection debounce.
    #[must_use]
    pub fn with_selection_debounce(mut self, debounce: Duration) -> Self {
        self.selection_debounce = debounce;
        self
    }

    /// Set the tap throttle window.
    #[must_use]
    pub fn with_tap_throttle(mut self, throttle: Duration) -> Self {
        self.tap_throttle = throttle;
        self
    }

    /// Gate a stream of taps: the first tap of each window passes, the rest
    /// are dropped.
    pub fn gate_taps<B>(&self, taps: B) -> AnyBinding<B::Value>
    where
        B: Binding,
        B::Value: Send,
    {
        taps.throttle(self.tap_throttle, false)
    }

    /// [`gate_taps`](Self::gate_taps) measured on an explicit scheduler clock.
    pub fn gate_taps_on<B>(&self, taps: B, scheduler: Arc<dyn Scheduler>) -> AnyBinding<B::Value>
    where
        B: Binding,
        B::Value: Send,
    {
        taps.throttle_on(self.tap_throttle, false, scheduler)
    }

    /// Parse a config from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] if the document is malformed or a value has the
    /// wrong type.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        toml::from_str(src).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    /// Parse a config from JSON. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] if the document is malformed or a value has the
    /// wrong type.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(src).map_err(|e| ConfigError::Json(e.to_string()))
    }
}

/// Error type for config loading.
#[cfg(feature = "policy-config")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The TOML source could not be parsed.
    Toml(String),
    /// The JSON source could not be parsed.
    Json(String),
}

#[cfg(feature = "policy-config")]
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toml(msg) => write!(f, "invalid interaction config (toml): {msg}"),
            Self::Json(msg) => write!(f, "invalid interaction config (json): {msg}"),
        }
    }
}

#[cfg(feature = "policy-config")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "policy-config")]
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InteractionConfig::default();
        assert_eq!(config.selection_debounce, Duration::from_millis(500));
        assert_eq!(config.tap_throttle, Duration::from_millis(300));
    }

    #[test]
    fn builder_setters() {
        let config = InteractionConfig::default()
            .with_selection_debounce(Duration::ZERO)
            .with_tap_throttle(Duration::from_millis(50));
        assert_eq!(config.selection_debounce, Duration::ZERO);
        assert_eq!(config.tap_throttle, Duration::from_millis(50));
    }

    #[test]
    fn gate_taps_drops_taps_inside_window() {
        use crate::executor::ExecutionContext;
        use crate::reactive::Signal;
        use crate::timer::ManualScheduler;
        use std::sync::Mutex;

        let clock = Arc::new(ManualScheduler::new());
        let taps = Signal::<u32>::new();
        let gated = InteractionConfig::default().gate_taps_on(taps.clone(), clock.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = gated.observe(ExecutionContext::Immediate, move |n| s.lock().unwrap().push(n));

        taps.send(1);
        taps.send(2);
        clock.advance(Duration::from_millis(300));
        taps.send(3);
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_partial_keeps_defaults() {
        let config = InteractionConfig::from_toml_str("selection_debounce_ms = 120").unwrap();
        assert_eq!(config.selection_debounce, Duration::from_millis(120));
        assert_eq!(config.tap_throttle, DEFAULT_TAP_THROTTLE);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn json_round_values() {
        let config =
            InteractionConfig::from_json_str(r#"{"selection_debounce_ms":0,"tap_throttle_ms":10}"#)
                .unwrap();
        assert_eq!(config.selection_debounce, Duration::ZERO);
        assert_eq!(config.tap_throttle, Duration::from_millis(10));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn malformed_sources_report_errors() {
        let err = InteractionConfig::from_toml_str("selection_debounce_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(err.to_string().starts_with("invalid interaction config (toml)"));

        let err = InteractionConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
