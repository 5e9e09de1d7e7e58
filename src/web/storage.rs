//! `localStorage` / `sessionStorage` adapters.
//!
//! The only place in the crate that touches browser storage. Access can throw
//! (private browsing, sandboxed iframes, quota), so every call re-acquires the
//! storage object and maps failures to `StorageUnavailable`.

use std::rc::Rc;

use wasm_bindgen::JsValue;

use crate::error::{BehaviorError, Result};
use crate::storage::{PersistenceScope, StoragePort, Storages};

fn unavailable(what: &str, e: JsValue) -> BehaviorError {
    BehaviorError::StorageUnavailable(format!("{}: {:?}", what, e))
}

#[derive(Clone, Copy, Debug)]
pub struct BrowserStorage {
    scope: PersistenceScope,
}

impl BrowserStorage {
    pub fn local() -> Self {
        Self {
            scope: PersistenceScope::Permanent,
        }
    }

    pub fn session() -> Self {
        Self {
            scope: PersistenceScope::Session,
        }
    }

    fn backend(&self) -> Result<web_sys::Storage> {
        let window = web_sys::window()
            .ok_or_else(|| BehaviorError::StorageUnavailable("no window".into()))?;
        let storage = match self.scope {
            PersistenceScope::Permanent => window.local_storage(),
            PersistenceScope::Session => window.session_storage(),
        };
        storage
            .map_err(|e| unavailable("storage access denied", e))?
            .ok_or_else(|| BehaviorError::StorageUnavailable("storage not supported".into()))
    }
}

impl StoragePort for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.backend()?
            .get_item(key)
            .map_err(|e| unavailable("getItem", e))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.backend()?
            .set_item(key, value)
            .map_err(|e| unavailable("setItem", e))
    }
}

/// Storage backends of the current browsing context.
pub fn browser_storages() -> Storages {
    Storages::new(
        Rc::new(BrowserStorage::local()),
        Rc::new(BrowserStorage::session()),
    )
}
