//! Lazy enumeration of the documents under a data pack category.

use crate::error::{DataPackError, MissingCategory, Result};
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Extension of the files a category scan picks up.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A data pack rooted at a directory containing `data/<namespace>/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPack {
    root: PathBuf,
    namespace: String,
}

impl DataPack {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Directory holding the documents of `category`, e.g.
    /// `<root>/data/minecraft/worldgen/noise` for `worldgen/noise`.
    pub fn category_root(&self, category: &str) -> PathBuf {
        let mut path = self.root.join("data").join(&self.namespace);
        path.extend(category.split('/').filter(|segment| !segment.is_empty()));
        path
    }

    /// Start a lazy scan of one category.
    pub fn scan(&self, category: &str) -> CategoryScan {
        let root = self.category_root(category);
        let walker = root.is_dir().then(|| {
            WalkDir::new(&root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
        });

        CategoryScan {
            category: category.to_owned(),
            namespace: self.namespace.clone(),
            root,
            walker,
        }
    }
}

/// One parsed document and the identifier derived from its path.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedDocument {
    pub identifier: String,
    pub path: PathBuf,
    pub document: Value,
}

/// Depth first iterator over the documents of a category.
///
/// Files are visited in file name order within each directory. Files without
/// the `.json` extension are skipped. Read and parse failures are yielded as
/// errors; callers decide whether to keep going.
pub struct CategoryScan {
    category: String,
    namespace: String,
    root: PathBuf,
    walker: Option<walkdir::IntoIter>,
}

impl CategoryScan {
    #[inline]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the category directory does not exist.
    #[inline]
    pub fn is_missing(&self) -> bool {
        self.walker.is_none()
    }

    /// Details of a missing category directory, for reporting.
    pub fn missing(&self) -> Option<MissingCategory> {
        self.is_missing().then(|| MissingCategory {
            category: self.category.clone(),
            path: self.root.clone(),
        })
    }

    fn load(&self, path: &Path) -> Result<ScannedDocument> {
        let identifier = derive_identifier(&self.namespace, &self.root, path)?;

        let raw = std::fs::read_to_string(path).map_err(|source| DataPackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = serde_json::from_str(&raw).map_err(|source| DataPackError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(ScannedDocument {
            identifier,
            path: path.to_path_buf(),
            document,
        })
    }
}

impl Iterator for CategoryScan {
    type Item = Result<ScannedDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.as_mut()?.next()? {
                Ok(entry) => entry,
                Err(error) => return Some(Err(error.into())),
            };

            if entry.file_type().is_file() && is_document(entry.path()) {
                return Some(self.load(entry.path()));
            }
        }
    }
}

fn is_document(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(DOCUMENT_EXTENSION))
}

/// `namespace:relative/path` for a document below `root`, with the extension
/// removed and separators normalized to `/`.
pub fn derive_identifier(namespace: &str, root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            let segment = segment
                .to_str()
                .ok_or_else(|| DataPackError::NonUtf8Path(path.to_path_buf()))?;
            segments.push(segment.replace('\\', "/"));
        }
    }

    let mut joined = segments.join("/");
    if let Some(stripped) = joined.strip_suffix(".json") {
        joined.truncate(stripped.len());
    }

    Ok(format!("{namespace}:{joined}"))
}
