//! Replaces the contents of dynamic registries with data pack overrides.

use datapack::OverrideTable;
use std::collections::HashSet;
use tracing::{debug, error, info};
use worldgen::{Identifier, RegistryStore};

/// An override entry that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub identifier: String,
    pub reason: String,
}

/// Outcome for one dynamic registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryReport {
    pub key: Identifier,
    pub applied: usize,
    pub failed: Vec<EntryFailure>,
}

/// Outcome of one [`apply_overrides`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub registries: Vec<RegistryReport>,
}

impl ApplyReport {
    /// Entries registered across all registries.
    pub fn applied(&self) -> usize {
        self.registries.iter().map(|r| r.applied).sum()
    }

    /// Entries rejected across all registries.
    pub fn failed(&self) -> usize {
        self.registries.iter().map(|r| r.failed.len()).sum()
    }

    pub fn registry(&self, key: &Identifier) -> Option<&RegistryReport> {
        self.registries.iter().find(|r| &r.key == key)
    }
}

/// Rebind every dynamic registry in `store` to its category in `table`.
///
/// A registry is dynamic when the path of its key is listed in `dynamic`.
/// Its contents are replaced by exactly the entries of the matching category
/// that parse; a registry without a category ends up empty. Failed entries
/// are logged and skipped. Other registries are left untouched.
///
/// Each registry is swapped in one step, so concurrent readers see either
/// the previous contents or the new ones.
pub fn apply_overrides<S: AsRef<str>>(
    store: &RegistryStore,
    mut table: OverrideTable,
    dynamic: &[S],
) -> ApplyReport {
    let dynamic: HashSet<&str> = dynamic.iter().map(|path| path.as_ref()).collect();
    let mut report = ApplyReport::default();

    for registry in store.iter() {
        let key = registry.key();
        if !dynamic.contains(key.path()) {
            continue;
        }

        let entries = table.take(key.path()).unwrap_or_default();
        info!(
            "Applying data pack overrides to {key} ({} entries, replacing {})",
            entries.len(),
            registry.len()
        );

        let mut batch = registry.batch();
        let mut failed = Vec::new();

        for (raw, document) in entries {
            let result = Identifier::parse(&raw)
                .map_err(|e| e.to_string())
                .and_then(|identifier| batch.register(identifier, &document).map_err(|e| e.to_string()));

            if let Err(reason) = result {
                error!("Failed to register {raw} in {key}: {reason}");
                failed.push(EntryFailure {
                    identifier: raw,
                    reason,
                });
            }
        }

        let applied = batch.commit();
        debug!("{key} now holds {:?}", registry.keys());

        report.registries.push(RegistryReport {
            key: key.clone(),
            applied,
            failed,
        });
    }

    report
}
