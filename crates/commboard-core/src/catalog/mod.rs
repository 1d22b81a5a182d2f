//! Symbol catalog and the asset-listing abstraction that fills it.

mod manifest;

#[cfg(not(target_arch = "wasm32"))]
mod scan;

pub use manifest::{JsonManifest, KNOWN_SYMBOL_FILES, StaticManifest};

#[cfg(not(target_arch = "wasm32"))]
pub use scan::DirectoryScan;

use crate::symbol::Symbol;
use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Catalog loading errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("No symbols found")]
    Empty,
    #[error("Manifest parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Something that can list the available symbol assets.
///
/// Implementations can read a static manifest, scan a directory or
/// fetch over the network.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait AssetSource: Send + Sync {
    /// List all symbols the source knows about.
    fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>>;
}

/// Something that can list the available symbol assets (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait AssetSource {
    /// List all symbols the source knows about.
    fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>>;
}

/// How a catalog load ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The listing was used as-is.
    Loaded(usize),
    /// The fallback list was substituted.
    Fallback(CatalogError),
}

impl LoadOutcome {
    /// Whether the fallback catalog is in use.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// The set of symbols available for placement.
#[derive(Debug, Clone)]
pub struct Catalog {
    symbols: Vec<Arc<Symbol>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::fallback()
    }
}

impl Catalog {
    /// Create a catalog from a symbol list.
    ///
    /// Ids are unique: when two symbols share an id the first one is kept
    /// and the later ones are dropped with a warning.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let mut seen = HashSet::new();
        let symbols = symbols
            .into_iter()
            .filter(|symbol| {
                let fresh = seen.insert(symbol.id.clone());
                if !fresh {
                    log::warn!(
                        "Dropping duplicate symbol id '{}' ({})",
                        symbol.id,
                        symbol.image_path
                    );
                }
                fresh
            })
            .map(Arc::new)
            .collect();
        Self { symbols }
    }

    /// The fixed list used when loading fails.
    pub fn fallback() -> Self {
        Self::new(vec![
            Symbol::new("bath", "Bath", "/assets/bath.png", ["daily-activities"]),
            Symbol::new(
                "bedtime_song",
                "Bedtime Song",
                "/assets/bedtime song.png",
                ["daily-activities"],
            ),
            Symbol::new("toilet", "Toilet", "/assets/toilet.png", ["daily-activities"]),
        ])
    }

    /// All symbols in display order.
    pub fn symbols(&self) -> &[Arc<Symbol>] {
        &self.symbols
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the catalog has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Look up a symbol by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Symbol>> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Check whether a symbol with this id is in the catalog.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Sorted list of every tag used by any symbol.
    pub fn all_tags(&self) -> Vec<String> {
        let tags: BTreeSet<&String> = self.symbols.iter().flat_map(|s| s.tags.iter()).collect();
        tags.into_iter().cloned().collect()
    }

    /// Ask a source for its listing. Errors are returned, not swallowed;
    /// pair with [`Catalog::apply_listing`].
    pub async fn fetch(source: &dyn AssetSource) -> CatalogResult<Vec<Symbol>> {
        source.list().await
    }

    /// Replace the catalog from a listing result.
    ///
    /// A non-empty listing is used with duplicate ids removed. An empty listing or an error
    /// installs the fallback list instead.
    pub fn apply_listing(&mut self, listing: CatalogResult<Vec<Symbol>>) -> LoadOutcome {
        match listing {
            Ok(symbols) if !symbols.is_empty() => {
                *self = Self::new(symbols);
                let count = self.len();
                log::info!("Loaded {} symbols", count);
                LoadOutcome::Loaded(count)
            }
            Ok(_) => {
                log::warn!("No symbols found, using fallback list");
                *self = Self::fallback();
                LoadOutcome::Fallback(CatalogError::Empty)
            }
            Err(e) => {
                log::error!("Failed to load symbols: {}", e);
                *self = Self::fallback();
                LoadOutcome::Fallback(e)
            }
        }
    }

    /// Load from a source, falling back on failure. Never fails.
    pub async fn load(&mut self, source: &dyn AssetSource) -> LoadOutcome {
        let listing = Self::fetch(source).await;
        self.apply_listing(listing)
    }
}

/// Sort symbols by display name, the order the library shows them in.
pub fn sort_by_name(symbols: &mut [Symbol]) {
    symbols.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
        // Simple blocking executor for tests
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }

    struct FixedSource(CatalogResult<Vec<Symbol>>);

    impl AssetSource for FixedSource {
        fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>> {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    #[test]
    fn test_load_replaces_catalog() {
        let mut catalog = Catalog::fallback();
        let source = FixedSource(Ok(vec![
            Symbol::from_file_name("car.png"),
            Symbol::from_file_name("train.png"),
        ]));

        let outcome = block_on(catalog.load(&source));

        assert_eq!(outcome, LoadOutcome::Loaded(2));
        assert!(catalog.contains("car"));
        assert!(!catalog.contains("bath"));
    }

    #[test]
    fn test_duplicate_ids_keep_first_symbol() {
        let mut catalog = Catalog::fallback();
        let listing = Ok(vec![
            Symbol::from_file_name("Bath.png"),
            Symbol::from_file_name("bath.png"),
            Symbol::from_file_name("brush  teeth.png"),
            Symbol::from_file_name("brush teeth.png"),
        ]);

        let outcome = catalog.apply_listing(listing);

        assert_eq!(outcome, LoadOutcome::Loaded(2));
        let ids: Vec<&str> = catalog.symbols().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["bath", "brush_teeth"]);
        assert_eq!(catalog.get("bath").unwrap().image_path, "/assets/Bath.png");
        assert_eq!(
            catalog.get("brush_teeth").unwrap().image_path,
            "/assets/brush  teeth.png"
        );
    }

    #[test]
    fn test_duplicate_ids_in_new() {
        let catalog = Catalog::new(vec![
            Symbol::new("cup", "Cup", "/assets/cup.png", ["food"]),
            Symbol::new("cup", "Mug", "/assets/mug.png", ["food"]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("cup").unwrap().name, "Cup");
    }

    #[test]
    fn test_empty_listing_uses_fallback() {
        let mut catalog = Catalog::new(vec![Symbol::from_file_name("car.png")]);
        let outcome = block_on(catalog.load(&FixedSource(Ok(Vec::new()))));

        assert_eq!(outcome, LoadOutcome::Fallback(CatalogError::Empty));
        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains("bath"));
    }

    #[test]
    fn test_failed_listing_uses_fallback() {
        let mut catalog = Catalog::new(vec![Symbol::from_file_name("car.png")]);
        let source = FixedSource(Err(CatalogError::Io("disk on fire".to_string())));

        let outcome = block_on(catalog.load(&source));

        assert!(outcome.is_fallback());
        assert!(catalog.contains("toilet"));
        assert!(!catalog.contains("car"));
    }

    #[test]
    fn test_all_tags_sorted_and_unique() {
        let catalog = Catalog::new(vec![
            Symbol::new("a", "A", "/assets/a.png", ["objects", "food"]),
            Symbol::new("b", "B", "/assets/b.png", ["food"]),
            Symbol::new("c", "C", "/assets/c.png", Vec::<String>::new()),
        ]);
        assert_eq!(catalog.all_tags(), vec!["food", "objects"]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut symbols = vec![
            Symbol::from_file_name("toilet.png"),
            Symbol::from_file_name("angry.png"),
            Symbol::from_file_name("Chloe.png"),
        ];
        sort_by_name(&mut symbols);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Angry", "Chloe", "Toilet"]);
    }
}
