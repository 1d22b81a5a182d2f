//! Manifest-based asset sources.

use super::{AssetSource, BoxFuture, CatalogError, CatalogResult, sort_by_name};
use crate::symbol::Symbol;

/// Asset file names shipped with the application.
pub const KNOWN_SYMBOL_FILES: &[&str] = &[
    "Chloe.png",
    "McDonalds.png",
    "angry.png",
    "angry002.png",
    "bath.png",
    "bedtime song 001.png",
    "bedtime song.png",
    "bedtime001.png",
    "blackpool.png",
    "bored.png",
    "bottle.png",
    "brush hair.png",
    "brush teeth.png",
    "bunk beds.png",
    "car.png",
    "cheese on toast.png",
    "cinema.png",
    "cinema001.png",
    "confused.png",
    "cottage.png",
    "dinner time.png",
    "dinner.png",
    "dream machine.png",
    "easter egg.png",
    "entertainment.png",
    "finished.png",
    "get dressed 002.png",
    "get dressed.png",
    "gullivers world.png",
    "happy.png",
    "ice lolly.png",
    "ipad.png",
    "izzi.png",
    "overjoyed.png",
    "playground.png",
    "pushchair.png",
    "pyjamas.png",
    "sisters.png",
    "sleep.png",
    "stop.png",
    "thinking.png",
    "toilet.png",
    "train.png",
    "trim fringe.png",
];

/// A fixed list of asset file names.
#[derive(Debug, Clone)]
pub struct StaticManifest {
    files: Vec<String>,
}

impl Default for StaticManifest {
    fn default() -> Self {
        Self::new(KNOWN_SYMBOL_FILES.iter().copied())
    }
}

impl StaticManifest {
    /// Create a manifest from file names such as `"bath.png"`.
    pub fn new(files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    /// Turn the file names into a sorted symbol list.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .files
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| Symbol::from_file_name(f))
            .collect();
        sort_by_name(&mut symbols);
        symbols
    }
}

impl AssetSource for StaticManifest {
    fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>> {
        let symbols = self.symbols();
        Box::pin(async move { Ok(symbols) })
    }
}

/// A JSON manifest: an array of `{ id, name, imagePath, tags }` records.
#[derive(Debug, Clone)]
pub struct JsonManifest {
    json: String,
}

impl JsonManifest {
    /// Wrap manifest text.
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }

    /// Parse the manifest. Record order is kept.
    pub fn parse(json: &str) -> CatalogResult<Vec<Symbol>> {
        serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

impl AssetSource for JsonManifest {
    fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>> {
        Box::pin(async move { Self::parse(&self.json) })
    }
}
