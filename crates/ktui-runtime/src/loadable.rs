#![forbid(unsafe_code)]

//! Load lifecycle of a remote resource, as a value.
//!
//! Screens keep a `Property<LoadableState<T>>` and derive their sections from
//! it; failures travel through the same channel as data instead of through a
//! separate error path.

/// Where a fetch currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadableState<T> {
    /// Nothing requested yet.
    #[default]
    Initial,
    /// A request is in flight.
    Loading,
    /// Data arrived.
    Loaded(T),
    /// The request succeeded with nothing to show.
    Empty(String),
    /// The request failed.
    Error(String),
}

impl<T> LoadableState<T> {
    /// Identifier of the variant, ignoring any payload.
    ///
    /// Useful as a reuse or cache key when only the shape of the state matters.
    #[must_use]
    pub fn cache_key(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Loading => "loading",
            Self::Loaded(_) => "loaded",
            Self::Empty(_) => "empty",
            Self::Error(_) => "error",
        }
    }

    /// True when both `self` and `previous` are loaded, i.e. the change only
    /// replaces data and can be applied incrementally.
    #[must_use]
    pub fn is_modification_of(&self, previous: &Self) -> bool {
        matches!((previous, self), (Self::Loaded(_), Self::Loaded(_)))
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The loaded data, if any.
    #[must_use]
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Map the loaded payload, keeping every other variant.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadableState<U> {
        match self {
            Self::Initial => LoadableState::Initial,
            Self::Loading => LoadableState::Loading,
            Self::Loaded(value) => LoadableState::Loaded(f(value)),
            Self::Empty(msg) => LoadableState::Empty(msg),
            Self::Error(msg) => LoadableState::Error(msg),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for LoadableState<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(err) => Self::Error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_payload() {
        assert_eq!(LoadableState::Loaded(1).cache_key(), "loaded");
        assert_eq!(LoadableState::Loaded(2).cache_key(), "loaded");
        assert_eq!(LoadableState::<u8>::Error("x".into()).cache_key(), "error");
        assert_eq!(LoadableState::<u8>::default().cache_key(), "initial");
    }

    #[test]
    fn modification_only_between_loaded_states() {
        let a = LoadableState::Loaded(vec![1]);
        let b = LoadableState::Loaded(vec![1, 2]);
        assert!(b.is_modification_of(&a));
        assert!(!b.is_modification_of(&LoadableState::Loading));
        assert!(!LoadableState::<Vec<u8>>::Loading.is_modification_of(&a));
        assert!(!LoadableState::<Vec<u8>>::Empty("none".into()).is_modification_of(&a));
    }

    #[test]
    fn from_result() {
        let ok: LoadableState<u8> = Ok::<u8, std::fmt::Error>(3).into();
        assert_eq!(ok.loaded(), Some(&3));
        let err: LoadableState<u8> = Err::<u8, std::fmt::Error>(std::fmt::Error).into();
        assert!(matches!(err, LoadableState::Error(_)));
    }

    #[test]
    fn map_keeps_shape() {
        assert_eq!(LoadableState::Loaded(2).map(|n| n * 10), LoadableState::Loaded(20));
        assert_eq!(
            LoadableState::<u8>::Loading.map(|n| n * 10),
            LoadableState::<u8>::Loading
        );
        assert!(LoadableState::<u8>::Loading.is_loading());
    }
}
