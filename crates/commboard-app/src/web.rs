//! WebAssembly entry point and platform-specific code.

use wasm_bindgen::prelude::*;

use crate::config::AppConfig;

/// URL parameters that override asset locations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlParams {
    /// Base URL symbol image paths are resolved against.
    pub assets: Option<String>,
    /// JSON manifest listing the symbols.
    pub manifest: Option<String>,
}

/// Read parameters from the page URL. Supports both
/// `?assets=https://cdn.example.org&manifest=symbols.json` and the same pairs
/// in the hash fragment; the query string wins.
pub fn get_url_params() -> UrlParams {
    let Some(window) = web_sys::window() else {
        return UrlParams::default();
    };
    let location = window.location();

    let mut params = UrlParams::default();
    for source in [location.search(), location.hash()] {
        let Ok(source) = source else { continue };
        let parsed = parse_params(&source);
        params.assets = params.assets.or(parsed.assets);
        params.manifest = params.manifest.or(parsed.manifest);
    }
    params
}

/// Parse asset parameters from a query string or hash.
pub fn parse_params(s: &str) -> UrlParams {
    let s = s.trim_start_matches(['?', '#']);
    let mut params = UrlParams::default();

    for pair in s.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            if value.is_empty() {
                continue;
            }
            let value = js_sys::decode_uri_component(value)
                .ok()
                .map(String::from)
                .unwrap_or_else(|| value.to_string());
            match key {
                "assets" => params.assets = Some(value),
                "manifest" => params.manifest = Some(value),
                _ => {}
            }
        }
    }
    params
}

impl AppConfig {
    /// Configuration for the page the app is running in.
    pub fn from_url() -> Self {
        let params = get_url_params();
        let mut config = Self::default();
        if let Some(assets) = params.assets {
            log::info!("Assets from URL: {}", assets);
            config.asset_base_url = assets;
        }
        if let Some(manifest) = params.manifest {
            log::info!("Manifest from URL: {}", manifest);
            config.manifest = Some(manifest);
        }
        config
    }
}

/// Initialize and run the WASM application.
#[wasm_bindgen(start)]
pub async fn run_wasm() {
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Failed to initialize logger: {}", e).into());
    }

    log::info!("Starting Communication Board (WASM)");

    crate::App::run(AppConfig::from_url()).await;
}
