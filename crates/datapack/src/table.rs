//! Per category override tables.

use crate::error::{DataPackError, MissingCategory};
use crate::scanner::DataPack;
use indexmap::IndexMap;
use serde_json::Value;

/// Identifier to raw document, in walk order.
pub type CategoryMapping = IndexMap<String, Value>;

/// A category whose scan was aborted.
#[derive(Debug)]
pub struct CategoryFailure {
    pub category: String,
    pub error: DataPackError,
}

/// Raw override documents for every requested category.
///
/// A category whose directory is missing maps to an empty table. A category
/// whose scan failed has no table at all and is listed in
/// [`failures`](Self::failures) instead.
#[derive(Debug, Default)]
pub struct OverrideTable {
    categories: IndexMap<String, CategoryMapping>,
    missing: Vec<MissingCategory>,
    failures: Vec<CategoryFailure>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every category of `pack`, in order.
    ///
    /// A failure stops the scan of its own category only; the remaining
    /// categories are still loaded.
    pub fn build<S: AsRef<str>>(pack: &DataPack, categories: &[S]) -> Self {
        let mut table = Self::new();

        for category in categories {
            let category = category.as_ref();
            let scan = pack.scan(category);

            if let Some(missing) = scan.missing() {
                tracing::warn!("{missing}, skipping");
                table.categories.insert(category.to_owned(), CategoryMapping::new());
                table.missing.push(missing);
                continue;
            }

            let mut mapping = CategoryMapping::new();
            let mut failure = None;
            for result in scan {
                match result {
                    Ok(scanned) => {
                        if mapping.contains_key(&scanned.identifier) {
                            tracing::warn!(
                                "Duplicate identifier {} in {category}, {} replaces the earlier document",
                                scanned.identifier,
                                scanned.path.display()
                            );
                        }
                        mapping.insert(scanned.identifier, scanned.document);
                    }
                    Err(error) => {
                        failure = Some(error);
                        break;
                    }
                }
            }

            match failure {
                Some(error) => {
                    tracing::error!("Failed to load data pack category {category}: {error}");
                    table.failures.push(CategoryFailure {
                        category: category.to_owned(),
                        error,
                    });
                }
                None => {
                    tracing::debug!("Loaded {} documents for {category}", mapping.len());
                    table.categories.insert(category.to_owned(), mapping);
                }
            }
        }

        table
    }

    /// Add or replace the mapping of a category.
    pub fn insert(&mut self, category: impl Into<String>, mapping: CategoryMapping) {
        self.categories.insert(category.into(), mapping);
    }

    pub fn get(&self, category: &str) -> Option<&CategoryMapping> {
        self.categories.get(category)
    }

    /// Remove and return the mapping of a category.
    pub fn take(&mut self, category: &str) -> Option<CategoryMapping> {
        self.categories.shift_remove(category)
    }

    /// Loaded categories, in request order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Total number of documents across all categories.
    pub fn document_count(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    #[inline]
    pub fn missing(&self) -> &[MissingCategory] {
        &self.missing
    }

    #[inline]
    pub fn failures(&self) -> &[CategoryFailure] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_build_categories_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "data/minecraft/worldgen/noise/a.json", "{}");
        write(dir.path(), "data/minecraft/worldgen/density_function/x/y.json", "0.5");

        let table = OverrideTable::build(
            &DataPack::new(dir.path()),
            &["worldgen/density_function", "worldgen/noise"],
        );

        let categories: Vec<_> = table.categories().collect();
        assert_eq!(categories, vec!["worldgen/density_function", "worldgen/noise"]);
        assert_eq!(
            table.get("worldgen/density_function").unwrap().get("minecraft:x/y"),
            Some(&json!(0.5))
        );
        assert_eq!(table.document_count(), 2);
        assert!(table.failures().is_empty());
    }

    #[test]
    fn test_missing_category_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "data/minecraft/worldgen/noise/a.json", "{}");

        let table = OverrideTable::build(
            &DataPack::new(dir.path()),
            &["worldgen/noise_settings", "worldgen/noise"],
        );

        assert!(table.get("worldgen/noise_settings").unwrap().is_empty());
        assert_eq!(table.get("worldgen/noise").unwrap().len(), 1);
        assert_eq!(table.missing().len(), 1);
        assert_eq!(table.missing()[0].category, "worldgen/noise_settings");
    }

    #[test]
    fn test_failure_is_scoped_to_category() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "data/minecraft/worldgen/noise/a.json", "{}");
        write(dir.path(), "data/minecraft/worldgen/noise/b.json", "{ broken");
        write(dir.path(), "data/minecraft/worldgen/density_function/c.json", "1");

        let table = OverrideTable::build(
            &DataPack::new(dir.path()),
            &["worldgen/noise", "worldgen/density_function"],
        );

        assert!(table.get("worldgen/noise").is_none());
        assert_eq!(table.get("worldgen/density_function").unwrap().len(), 1);
        assert_eq!(table.failures().len(), 1);
        assert_eq!(table.failures()[0].category, "worldgen/noise");
    }

    #[test]
    fn test_take() {
        let mut table = OverrideTable::new();
        let mut mapping = CategoryMapping::new();
        mapping.insert("minecraft:a".to_owned(), json!(1));
        table.insert("worldgen/noise", mapping);

        assert_eq!(table.take("worldgen/noise").unwrap().len(), 1);
        assert!(table.take("worldgen/noise").is_none());
    }
}
