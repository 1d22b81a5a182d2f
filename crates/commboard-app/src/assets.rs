//! Symbol listing and image loading.
//!
//! Native loads on helper threads and sends results back over a channel.
//! WASM loads with `spawn_local` + `fetch` and queues results in a
//! thread-local. Either way the app drains finished loads with
//! [`AssetLoader::poll`] once per frame; loaders never touch board state.

use crate::config::AppConfig;
use commboard_core::catalog::{AssetSource, BoxFuture, CatalogError, CatalogResult, JsonManifest};
use commboard_core::symbol::Symbol;
use std::collections::HashSet;

/// A finished load.
#[derive(Debug, Clone)]
pub enum AssetEvent {
    /// Result of listing the symbols.
    Catalog(CatalogResult<Vec<Symbol>>),
    /// Bytes of one symbol image.
    Image {
        path: String,
        bytes: Result<Vec<u8>, String>,
    },
}

/// Reads a JSON manifest from disk.
#[cfg(not(target_arch = "wasm32"))]
pub struct ManifestFile {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl ManifestFile {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetSource for ManifestFile {
    fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>> {
        Box::pin(async move {
            let json = std::fs::read_to_string(&self.path).map_err(|e| {
                CatalogError::Io(format!("Failed to read {}: {}", self.path.display(), e))
            })?;
            JsonManifest::parse(&json)
        })
    }
}

/// Fetches a JSON manifest over HTTP.
#[cfg(target_arch = "wasm32")]
pub struct FetchManifest {
    url: String,
}

#[cfg(target_arch = "wasm32")]
impl FetchManifest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(target_arch = "wasm32")]
impl AssetSource for FetchManifest {
    fn list(&self) -> BoxFuture<'_, CatalogResult<Vec<Symbol>>> {
        Box::pin(async move {
            let bytes = web::fetch_bytes(&self.url)
                .await
                .map_err(CatalogError::Network)?;
            let json = String::from_utf8(bytes)
                .map_err(|e| CatalogError::Parse(format!("manifest is not UTF-8: {}", e)))?;
            JsonManifest::parse(&json)
        })
    }
}

/// Pick the symbol source for this configuration.
#[cfg(not(target_arch = "wasm32"))]
pub fn catalog_source(config: &AppConfig) -> Box<dyn AssetSource> {
    use commboard_core::catalog::DirectoryScan;
    match &config.manifest {
        Some(path) => Box::new(ManifestFile::new(path)),
        None => Box::new(DirectoryScan::new(config.assets_dir())),
    }
}

/// Pick the symbol source for this configuration.
#[cfg(target_arch = "wasm32")]
pub fn catalog_source(config: &AppConfig) -> Box<dyn AssetSource> {
    use commboard_core::catalog::StaticManifest;
    match &config.manifest {
        Some(url) => Box::new(FetchManifest::new(url.clone())),
        None => Box::new(StaticManifest::default()),
    }
}

/// Read one image file.
#[cfg(not(target_arch = "wasm32"))]
pub fn read_image(config: &AppConfig, image_path: &str) -> Result<Vec<u8>, String> {
    let path = config.resolve_image(image_path);
    std::fs::read(&path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

/// Fetch one image.
#[cfg(target_arch = "wasm32")]
pub async fn read_image(config: &AppConfig, image_path: &str) -> Result<Vec<u8>, String> {
    web::fetch_bytes(&config.resolve_image(image_path)).await
}

/// Starts loads and collects their results.
pub struct AssetLoader {
    config: AppConfig,
    catalog_in_progress: bool,
    /// Image paths requested so far, loaded or not.
    requested: HashSet<String>,
    #[cfg(not(target_arch = "wasm32"))]
    tx: std::sync::mpsc::Sender<AssetEvent>,
    #[cfg(not(target_arch = "wasm32"))]
    rx: std::sync::mpsc::Receiver<AssetEvent>,
}

impl AssetLoader {
    /// Create a loader for the configured sources.
    pub fn new(config: &AppConfig) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            config: config.clone(),
            catalog_in_progress: false,
            requested: HashSet::new(),
            #[cfg(not(target_arch = "wasm32"))]
            tx,
            #[cfg(not(target_arch = "wasm32"))]
            rx,
        }
    }

    /// Check if a listing is in flight.
    pub fn is_loading_catalog(&self) -> bool {
        self.catalog_in_progress
    }

    /// Start listing the symbols. Returns false if a listing is already
    /// running.
    pub fn load_catalog(&mut self) -> bool {
        if self.catalog_in_progress {
            return false;
        }
        self.catalog_in_progress = true;
        let source = catalog_source(&self.config);
        log::info!("Loading symbol catalog");

        #[cfg(not(target_arch = "wasm32"))]
        {
            let tx = self.tx.clone();
            std::thread::spawn(move || {
                let listing = pollster::block_on(source.list());
                tx.send(AssetEvent::Catalog(listing)).ok();
            });
        }

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let listing = source.list().await;
            web::push_pending(AssetEvent::Catalog(listing));
        });

        true
    }

    /// Start loading every image path not requested before. Returns how
    /// many loads started.
    pub fn request_images<I, S>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fresh: Vec<String> = paths
            .into_iter()
            .map(Into::into)
            .filter(|p| self.requested.insert(p.clone()))
            .collect();
        if fresh.is_empty() {
            return 0;
        }
        let count = fresh.len();
        log::debug!("Loading {} symbol images", count);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let tx = self.tx.clone();
            let config = self.config.clone();
            std::thread::spawn(move || {
                for path in fresh {
                    let bytes = read_image(&config, &path);
                    if tx.send(AssetEvent::Image { path, bytes }).is_err() {
                        break;
                    }
                }
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                for path in fresh {
                    let bytes = read_image(&config, &path).await;
                    web::push_pending(AssetEvent::Image { path, bytes });
                }
            });
        }

        count
    }

    /// Drain finished loads.
    pub fn poll(&mut self) -> Vec<AssetEvent> {
        #[cfg(not(target_arch = "wasm32"))]
        let events: Vec<AssetEvent> = self.rx.try_iter().collect();
        #[cfg(target_arch = "wasm32")]
        let events = web::take_pending();

        if events.iter().any(|e| matches!(e, AssetEvent::Catalog(_))) {
            self.catalog_in_progress = false;
        }
        events
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) mod web {
    use super::AssetEvent;
    use std::cell::RefCell;
    use wasm_bindgen::{JsCast, JsValue};

    thread_local! {
        static PENDING: RefCell<Vec<AssetEvent>> = const { RefCell::new(Vec::new()) };
    }

    pub fn push_pending(event: AssetEvent) {
        PENDING.with(|p| p.borrow_mut().push(event));
    }

    pub fn take_pending() -> Vec<AssetEvent> {
        PENDING.with(|p| std::mem::take(&mut *p.borrow_mut()))
    }

    fn js_error(e: JsValue) -> String {
        e.as_string().unwrap_or_else(|| format!("{:?}", e))
    }

    /// GET a URL and return the body.
    pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
        let window = web_sys::window().ok_or_else(|| "No window".to_string())?;
        let response = wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(js_error)?;
        let response: web_sys::Response = response.dyn_into().map_err(js_error)?;
        if !response.ok() {
            return Err(format!("HTTP {} for {}", response.status(), url));
        }
        let buffer = wasm_bindgen_futures::JsFuture::from(response.array_buffer().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn config_for(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            public_dir: dir.to_path_buf(),
            ..AppConfig::default()
        }
    }

    fn wait_for(loader: &mut AssetLoader, count: usize) -> Vec<AssetEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.len() < count && Instant::now() < deadline {
            events.extend(loader.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn test_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbols.json");
        std::fs::write(
            &path,
            r#"[{"id": "car", "name": "Car", "imagePath": "/assets/car.png", "tags": ["objects"]}]"#,
        )
        .unwrap();

        let listing = pollster::block_on(ManifestFile::new(&path).list()).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, "car");

        let missing = pollster::block_on(ManifestFile::new(dir.path().join("nope.json")).list());
        assert!(matches!(missing, Err(CatalogError::Io(_))));
    }

    #[test]
    fn test_load_catalog_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/bath.png"), b"png").unwrap();
        std::fs::write(dir.path().join("assets/car.png"), b"png").unwrap();

        let mut loader = AssetLoader::new(&config_for(dir.path()));
        assert!(loader.load_catalog());
        assert!(!loader.load_catalog());
        assert!(loader.is_loading_catalog());

        let events = wait_for(&mut loader, 1);
        match &events[..] {
            [AssetEvent::Catalog(Ok(symbols))] => {
                let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, vec!["Bath", "Car"]);
            }
            other => panic!("unexpected events: {:?}", other),
        }
        assert!(!loader.is_loading_catalog());
    }

    #[test]
    fn test_missing_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = AssetLoader::new(&config_for(dir.path()));
        loader.load_catalog();

        let events = wait_for(&mut loader, 1);
        assert!(matches!(
            &events[..],
            [AssetEvent::Catalog(Err(CatalogError::Io(_)))]
        ));
    }

    #[test]
    fn test_request_images_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/bath.png"), b"bath bytes").unwrap();

        let mut loader = AssetLoader::new(&config_for(dir.path()));
        assert_eq!(
            loader.request_images(["/assets/bath.png", "/assets/car.png"]),
            2
        );
        assert_eq!(loader.request_images(["/assets/bath.png"]), 0);

        let mut events = wait_for(&mut loader, 2);
        events.sort_by_key(|e| match e {
            AssetEvent::Image { path, .. } => path.clone(),
            AssetEvent::Catalog(_) => String::new(),
        });
        match &events[..] {
            [
                AssetEvent::Image { path: a, bytes: Ok(bytes) },
                AssetEvent::Image { path: b, bytes: Err(_) },
            ] => {
                assert_eq!(a, "/assets/bath.png");
                assert_eq!(bytes, b"bath bytes");
                assert_eq!(b, "/assets/car.png");
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }
}
