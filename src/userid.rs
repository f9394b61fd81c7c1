//! Authenticated user identity carried in request extensions.
//!
//! The logging middleware calls [`init`] before any authentication runs, so
//! a later middleware's [`set`] mutates the existing slot in place and the
//! value is visible to everything that captured the extensions earlier --
//! including the logging middleware reading it after the handler completes.
//! This is a deliberate, single-writer, single-slot exception to
//! extensions-are-immutable-by-replacement; it is not a general mutable map.

use std::sync::{Arc, PoisonError, RwLock};

use http::Extensions;

/// Shared identity slot. Cloning shares the underlying slot.
#[derive(Debug, Clone, Default)]
pub struct UserId(Arc<RwLock<String>>);

impl UserId {
    /// The current identity, empty when none has been set.
    pub fn get(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, uid: &str) {
        let mut slot = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *slot = uid.to_string();
    }
}

/// Sets up an empty identity slot and returns a handle to it.
///
/// Called once per request by the logging middleware; authentication
/// middleware further down the stack writes into the slot via [`set`].
pub fn init(extensions: &mut Extensions) -> UserId {
    let slot = UserId::default();
    extensions.insert(slot.clone());
    slot
}

/// The user identity from the request extensions.
///
/// Returns the empty string when no slot exists or none has been set;
/// never panics.
pub fn get(extensions: &Extensions) -> String {
    extensions
        .get::<UserId>()
        .map(UserId::get)
        .unwrap_or_default()
}

/// Writes the user identity into the request extensions.
///
/// If [`init`] ran previously this mutates the existing slot, so holders of
/// earlier extension snapshots observe the new value too. Without a prior
/// `init` a fresh slot is inserted, visible only from this point on.
pub fn set(extensions: &mut Extensions, uid: &str) {
    if let Some(slot) = extensions.get::<UserId>() {
        slot.set(uid);
        return;
    }

    let slot = UserId::default();
    slot.set(uid);
    extensions.insert(slot);
}
