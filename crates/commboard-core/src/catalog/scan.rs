//! Directory scanning for native platforms.

use super::{AssetSource, BoxFuture, CatalogError, CatalogResult, sort_by_name};
use crate::symbol::Symbol;
use std::fs;
use std::path::PathBuf;

/// Lists the `*.png` files of an assets directory.
pub struct DirectoryScan {
    /// Directory holding the symbol images.
    dir: PathBuf,
}

impl DirectoryScan {
    /// Scan the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the scanned directory.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl AssetSource for DirectoryScan {
    fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>> {
        let dir = self.dir.clone();

        Box::pin(async move {
            let entries = fs::read_dir(&dir).map_err(|e| {
                CatalogError::Io(format!("Failed to read {}: {}", dir.display(), e))
            })?;

            let mut symbols = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                // Only include .png files
                if path.extension().map(|e| e == "png").unwrap_or(false) {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        symbols.push(Symbol::from_file_name(name));
                    }
                }
            }
            sort_by_name(&mut symbols);
            log::debug!("Scanned {} symbols in {}", symbols.len(), dir.display());
            Ok(symbols)
        })
    }
}
