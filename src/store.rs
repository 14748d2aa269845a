use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{RuleSet, SyncError, keys, storage::KvStore};

/// Durable rule set under the `rules` storage key
#[derive(Clone)]
pub struct RuleStore {
    storage: Arc<dyn KvStore>,
}

impl RuleStore {
    pub fn new(storage: Arc<dyn KvStore>) -> Self {
        Self { storage }
    }

    /// Load the persisted rule set
    ///
    /// Never fails: a missing or malformed value yields an empty set. Both a JSON array
    /// and a JSON-encoded string holding that array are accepted.
    #[must_use]
    pub fn load(&self) -> RuleSet {
        let Some(raw) = self.storage.get(keys::RULES) else {
            return RuleSet::new();
        };

        match decode(raw) {
            Ok(rules) => {
                debug!(count = rules.len(), "loaded rules");
                rules
            }
            Err(e) => {
                warn!(error = %e, "stored rules are malformed, starting empty");
                RuleSet::new()
            }
        }
    }

    /// Persist the full rule set, replacing the previous value
    ///
    /// An empty set is written too, so deletions survive a reload.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if serialization or the underlying store write fails.
    pub fn save(&self, rules: &RuleSet) -> Result<(), SyncError> {
        self.storage.set(keys::RULES, serde_json::to_value(rules)?)?;
        debug!(count = rules.len(), "saved rules");
        Ok(())
    }
}

fn decode(raw: Value) -> Result<RuleSet, serde_json::Error> {
    match raw {
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    }
}
