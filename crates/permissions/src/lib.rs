use serde::{Deserialize, Serialize};

/// Session storage key used by the browser store.
pub const DEFAULT_CHOICE_KEY: &str = "courtmap.location-choice";

/// The user's answer to the location prompt, remembered for the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationChoice {
    #[default]
    Unset,
    Allowed,
    Denied,
}

impl LocationChoice {
    pub fn is_set(self) -> bool {
        self != LocationChoice::Unset
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A choice was already recorded this session.
    AlreadySet(LocationChoice),
    /// `Unset` is the absence of a choice and cannot be written.
    InvalidChoice,
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::AlreadySet(c) => write!(f, "location choice already set to {c:?}"),
            StoreError::InvalidChoice => write!(f, "cannot store an unset location choice"),
            StoreError::StorageUnavailable => write!(f, "session storage unavailable"),
            StoreError::Corrupt(msg) => write!(f, "stored location choice corrupt: {msg}"),
            StoreError::Io(msg) => write!(f, "session storage error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Session-scoped home of the [`LocationChoice`].
///
/// Read once at session start; written at most once, by explicit user action.
pub trait ChoiceStore {
    fn load(&self) -> Result<LocationChoice, StoreError>;
    fn save(&mut self, choice: LocationChoice) -> Result<(), StoreError>;
}

impl<S: ChoiceStore + ?Sized> ChoiceStore for Box<S> {
    fn load(&self) -> Result<LocationChoice, StoreError> {
        (**self).load()
    }

    fn save(&mut self, choice: LocationChoice) -> Result<(), StoreError> {
        (**self).save(choice)
    }
}

fn check_writable(current: LocationChoice, next: LocationChoice) -> Result<(), StoreError> {
    if next == LocationChoice::Unset {
        return Err(StoreError::InvalidChoice);
    }
    if current.is_set() {
        return Err(StoreError::AlreadySet(current));
    }
    Ok(())
}

/// Reads the stored choice, treating an unavailable or corrupt store as
/// `Unset` so the session falls back to prompting.
pub fn load_or_unset<S: ChoiceStore + ?Sized>(store: &S) -> LocationChoice {
    match store.load() {
        Ok(choice) => choice,
        Err(err) => {
            tracing::warn!("location choice unreadable, prompting again: {err}");
            LocationChoice::Unset
        }
    }
}

pub fn encode_choice(choice: LocationChoice) -> Result<String, StoreError> {
    serde_json::to_string(&choice).map_err(|e| StoreError::Io(e.to_string()))
}

pub fn decode_choice(raw: &str) -> Result<LocationChoice, StoreError> {
    if raw.trim().is_empty() {
        return Ok(LocationChoice::Unset);
    }
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[derive(Debug, Default)]
pub struct InMemoryChoiceStore {
    choice: LocationChoice,
}

impl InMemoryChoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_choice(choice: LocationChoice) -> Self {
        Self { choice }
    }
}

impl ChoiceStore for InMemoryChoiceStore {
    fn load(&self) -> Result<LocationChoice, StoreError> {
        Ok(self.choice)
    }

    fn save(&mut self, choice: LocationChoice) -> Result<(), StoreError> {
        check_writable(self.choice, choice)?;
        self.choice = choice;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{ChoiceStore, LocationChoice, StoreError, check_writable, decode_choice, encode_choice};

    /// `window.sessionStorage`-backed store; cleared by the browser when the
    /// tab session ends.
    #[derive(Debug)]
    pub struct SessionStorageChoiceStore {
        key: String,
    }

    impl SessionStorageChoiceStore {
        pub fn new(key: impl Into<String>) -> Result<Self, StoreError> {
            // Fail early if the storage is blocked.
            window_session_storage()?;
            Ok(Self { key: key.into() })
        }
    }

    impl ChoiceStore for SessionStorageChoiceStore {
        fn load(&self) -> Result<LocationChoice, StoreError> {
            let storage = window_session_storage()?;
            let raw = storage
                .get_item(&self.key)
                .map_err(|e| StoreError::Io(format!("get_item failed: {:?}", e)))?;
            match raw {
                Some(raw) => decode_choice(&raw),
                None => Ok(LocationChoice::Unset),
            }
        }

        fn save(&mut self, choice: LocationChoice) -> Result<(), StoreError> {
            check_writable(self.load()?, choice)?;
            let storage = window_session_storage()?;
            storage
                .set_item(&self.key, &encode_choice(choice)?)
                .map_err(|e| StoreError::Io(format!("set_item failed: {:?}", e)))
        }
    }

    fn window_session_storage() -> Result<web_sys::Storage, StoreError> {
        let win = web_sys::window().ok_or(StoreError::StorageUnavailable)?;
        win.session_storage()
            .map_err(|e| StoreError::Io(format!("sessionStorage error: {:?}", e)))?
            .ok_or(StoreError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::SessionStorageChoiceStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct SessionStorageChoiceStore;

#[cfg(not(target_arch = "wasm32"))]
impl SessionStorageChoiceStore {
    pub fn new(_key: impl Into<String>) -> Result<Self, StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ChoiceStore for SessionStorageChoiceStore {
    fn load(&self) -> Result<LocationChoice, StoreError> {
        Err(StoreError::StorageUnavailable)
    }

    fn save(&mut self, _choice: LocationChoice) -> Result<(), StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_unset() {
        let store = InMemoryChoiceStore::new();
        assert_eq!(store.load(), Ok(LocationChoice::Unset));
    }

    #[test]
    fn choice_is_written_once() {
        let mut store = InMemoryChoiceStore::new();
        store.save(LocationChoice::Denied).expect("first save");
        assert_eq!(
            store.save(LocationChoice::Allowed),
            Err(StoreError::AlreadySet(LocationChoice::Denied))
        );
        assert_eq!(store.load(), Ok(LocationChoice::Denied));
    }

    #[test]
    fn unset_cannot_be_written() {
        let mut store = InMemoryChoiceStore::new();
        assert_eq!(store.save(LocationChoice::Unset), Err(StoreError::InvalidChoice));
    }

    #[test]
    fn encoding_is_lowercase_json() {
        assert_eq!(encode_choice(LocationChoice::Allowed).as_deref(), Ok("\"allowed\""));
        assert_eq!(decode_choice("\"denied\""), Ok(LocationChoice::Denied));
        assert_eq!(decode_choice(""), Ok(LocationChoice::Unset));
        assert!(matches!(decode_choice("maybe"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn unavailable_store_reads_as_unset() {
        struct Broken;
        impl ChoiceStore for Broken {
            fn load(&self) -> Result<LocationChoice, StoreError> {
                Err(StoreError::StorageUnavailable)
            }
            fn save(&mut self, _choice: LocationChoice) -> Result<(), StoreError> {
                Err(StoreError::StorageUnavailable)
            }
        }
        assert_eq!(load_or_unset(&Broken), LocationChoice::Unset);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_session_storage_is_unavailable() {
        assert!(matches!(
            SessionStorageChoiceStore::new(DEFAULT_CHOICE_KEY),
            Err(StoreError::StorageUnavailable)
        ));
    }
}
