//! In-Memory Stores
//!
//! Keyed storage for preferences and payment attempts. Trait-based so a
//! persistent backend can replace the in-memory maps without touching the
//! services. Handlers for independent sessions share these safely; there is
//! no mutable state outside the locks.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::attempt::PaymentAttempt;
use crate::error::{CheckoutError, Result};
use crate::preference::Preference;

/// Storage for preferences, keyed by preference id
///
/// Preferences are write-once: `insert` refuses to overwrite an existing id.
pub trait PreferenceStore: Send + Sync {
    fn insert(&self, preference: &Preference) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<Preference>>;
}

/// Storage for payment attempts, keyed by attempt id
pub trait AttemptStore: Send + Sync {
    /// Insert or update an attempt record
    fn upsert(&self, attempt: &PaymentAttempt) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<PaymentAttempt>>;
}

/// In-memory preference store (for development and tests)
#[derive(Default)]
pub struct MemoryPreferenceStore {
    preferences: RwLock<HashMap<String, Preference>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn insert(&self, preference: &Preference) -> Result<()> {
        let mut preferences = self.preferences.write().unwrap();
        if preferences.contains_key(&preference.id) {
            return Err(CheckoutError::Store(format!(
                "preference {} already exists and is write-once",
                preference.id
            )));
        }
        preferences.insert(preference.id.clone(), preference.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Preference>> {
        let preferences = self.preferences.read().unwrap();
        Ok(preferences.get(id).cloned())
    }
}

/// In-memory attempt store (for development and tests)
#[derive(Default)]
pub struct MemoryAttemptStore {
    attempts: RwLock<HashMap<String, PaymentAttempt>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for MemoryAttemptStore {
    fn upsert(&self, attempt: &PaymentAttempt) -> Result<()> {
        let mut attempts = self.attempts.write().unwrap();
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PaymentAttempt>> {
        let attempts = self.attempts.read().unwrap();
        Ok(attempts.get(id).cloned())
    }
}
