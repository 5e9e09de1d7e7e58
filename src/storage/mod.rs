//! Key/value persistence for UI preferences.
//!
//! Behaviors never talk to browser storage directly: they hold a
//! [`Preference`] bound to one key on one [`StoragePort`]. The port returns
//! errors; `Preference` turns them into warnings and safe defaults.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{BehaviorError, Result};

/// Storage backend for one persistence scope.
pub trait StoragePort {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// How long a stored preference lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceScope {
    /// Survives browser restarts (`localStorage`).
    #[default]
    Permanent,
    /// Lives for the tab session (`sessionStorage`).
    Session,
}

impl PersistenceScope {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => PersistenceScope::Session,
            _ => PersistenceScope::Permanent,
        }
    }
}

// =============================================================================
// Implementations
// =============================================================================

/// Storage held in memory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls served.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Fallback when no backend can be acquired: reads find nothing, writes vanish.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStorage;

impl StoragePort for NoopStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }
}

/// A backend whose every call fails, as when the browser blocks storage access.
#[derive(Debug, Default, Clone)]
pub struct UnavailableStorage {
    reason: String,
}

impl UnavailableStorage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl StoragePort for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(BehaviorError::StorageUnavailable(self.reason.clone()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(BehaviorError::StorageUnavailable(self.reason.clone()))
    }
}

/// The durable and session backends of a page.
#[derive(Clone)]
pub struct Storages {
    pub permanent: Rc<dyn StoragePort>,
    pub session: Rc<dyn StoragePort>,
}

impl Storages {
    pub fn new(permanent: Rc<dyn StoragePort>, session: Rc<dyn StoragePort>) -> Self {
        Self { permanent, session }
    }

    /// Both scopes served by in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStorage::new()), Rc::new(MemoryStorage::new()))
    }

    pub fn scoped(&self, scope: PersistenceScope) -> Rc<dyn StoragePort> {
        match scope {
            PersistenceScope::Permanent => self.permanent.clone(),
            PersistenceScope::Session => self.session.clone(),
        }
    }
}

// =============================================================================
// Preference
// =============================================================================

/// One persisted value: a key on a port, with failures degraded to warnings.
#[derive(Clone)]
pub struct Preference {
    port: Rc<dyn StoragePort>,
    key: String,
}

impl Preference {
    pub fn new(port: Rc<dyn StoragePort>, key: impl Into<String>) -> Self {
        Self {
            port,
            key: key.into(),
        }
    }

    /// Stored string, or None when absent or unreadable.
    pub fn load(&self) -> Option<String> {
        match self.port.get(&self.key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read preference {}: {}", self.key, e);
                None
            }
        }
    }

    /// Store a string. Returns false when the write failed.
    pub fn store(&self, value: &str) -> bool {
        match self.port.set(&self.key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to save preference {}: {}", self.key, e);
                false
            }
        }
    }

    /// Stored boolean flag. `"true"` and `"1"` count as set; anything else,
    /// including a missing key or a failed read, does not.
    pub fn load_flag(&self) -> bool {
        self.load()
            .map(|v| matches!(v.trim(), "true" | "1"))
            .unwrap_or(false)
    }

    pub fn store_flag(&self, value: bool) -> bool {
        self.store(if value { "true" } else { "false" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_roundtrip_uses_literal_strings() {
        let storage = Rc::new(MemoryStorage::new());
        let pref = Preference::new(storage.clone(), "sidebarCollapsed");
        assert!(!pref.load_flag());

        assert!(pref.store_flag(true));
        assert_eq!(storage.snapshot("sidebarCollapsed").as_deref(), Some("true"));
        assert!(pref.load_flag());

        pref.store_flag(false);
        assert_eq!(storage.snapshot("sidebarCollapsed").as_deref(), Some("false"));
        assert!(!pref.load_flag());
        assert_eq!(storage.writes(), 2);
    }

    #[test]
    fn test_flag_accepts_legacy_numeric_form() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set("innerLayoutSidebarCollapsed", "1").unwrap();
        let pref = Preference::new(storage.clone(), "innerLayoutSidebarCollapsed");
        assert!(pref.load_flag());
        storage.set("innerLayoutSidebarCollapsed", "0").unwrap();
        assert!(!pref.load_flag());
    }

    #[test]
    fn test_unavailable_storage_degrades() {
        let pref = Preference::new(Rc::new(UnavailableStorage::new("SecurityError")), "theme");
        assert_eq!(pref.load(), None);
        assert!(!pref.load_flag());
        assert!(!pref.store("dark"));
    }

    #[test]
    fn test_noop_storage_forgets() {
        let pref = Preference::new(Rc::new(NoopStorage), "theme");
        assert!(pref.store("dark"));
        assert_eq!(pref.load(), None);
    }

    #[test]
    fn test_scopes_are_separate() {
        let storages = Storages::in_memory();
        Preference::new(storages.scoped(PersistenceScope::Session), "k").store("a");
        assert_eq!(
            Preference::new(storages.scoped(PersistenceScope::Permanent), "k").load(),
            None
        );
        assert_eq!(PersistenceScope::parse("Session"), PersistenceScope::Session);
        assert_eq!(PersistenceScope::parse("local"), PersistenceScope::Permanent);
    }
}
