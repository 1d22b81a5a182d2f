//! Application configuration.

use commboard_core::config::BoardConfig;
#[cfg(not(target_arch = "wasm32"))]
use commboard_core::config::ConfigError;
use peniko::Color;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

/// Overrides the public directory holding `assets/`.
pub const PUBLIC_DIR_VAR: &str = "COMMBOARD_PUBLIC_DIR";
/// Points at a JSON symbol manifest.
pub const MANIFEST_VAR: &str = "COMMBOARD_MANIFEST";
/// Points at a JSON board config file.
pub const CONFIG_VAR: &str = "COMMBOARD_CONFIG";

/// Parse a CSS hex color like "#ff0000".
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if s.starts_with('#') && s.len() == 7 {
        let r = u8::from_str_radix(&s[1..3], 16).ok()?;
        let g = u8::from_str_radix(&s[3..5], 16).ok()?;
        let b = u8::from_str_radix(&s[5..7], 16).ok()?;
        Some(Color::from_rgba8(r, g, b, 255))
    } else {
        None
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
    /// Directory whose `assets/` folder holds the symbol pictures.
    #[cfg(not(target_arch = "wasm32"))]
    pub public_dir: PathBuf,
    /// Base URL that symbol image paths are resolved against.
    #[cfg(target_arch = "wasm32")]
    pub asset_base_url: String,
    /// JSON manifest to list symbols from instead of the default source.
    pub manifest: Option<String>,
    pub board: BoardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Communication Board".to_string(),
            width: 1280,
            height: 860,
            background_color: Color::from_rgba8(240, 242, 245, 255),
            #[cfg(not(target_arch = "wasm32"))]
            public_dir: PathBuf::from("public"),
            #[cfg(target_arch = "wasm32")]
            asset_base_url: String::new(),
            manifest: None,
            board: BoardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read overrides from the environment. A bad board config file is
    /// logged and the defaults are kept.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(PUBLIC_DIR_VAR) {
            config.public_dir = PathBuf::from(dir);
        }
        config.manifest = std::env::var(MANIFEST_VAR).ok().filter(|m| !m.is_empty());
        if let Ok(path) = std::env::var(CONFIG_VAR) {
            match load_board_config(&path) {
                Ok(board) => config.board = board,
                Err(e) => log::warn!("Ignoring board config {}: {}", path, e),
            }
        }
        log::info!(
            "Public directory: {}, manifest: {}",
            config.public_dir.display(),
            config.manifest.as_deref().unwrap_or("<none>")
        );
        config
    }

    /// Directory scanned for symbol pictures.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn assets_dir(&self) -> PathBuf {
        self.public_dir.join("assets")
    }

    /// File system path of a symbol image path like `/assets/bath.png`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn resolve_image(&self, image_path: &str) -> PathBuf {
        self.public_dir.join(image_path.trim_start_matches('/'))
    }

    /// URL of a symbol image path like `/assets/bath.png`.
    #[cfg(target_arch = "wasm32")]
    pub fn resolve_image(&self, image_path: &str) -> String {
        join_url(&self.asset_base_url, image_path)
    }
}

/// Join a base URL and an absolute asset path.
pub fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read and parse a board config file.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_board_config(path: &str) -> Result<BoardConfig, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse(e.to_string()))?;
    BoardConfig::from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(
            parse_color("#f0f2f5"),
            Some(Color::from_rgba8(240, 242, 245, 255))
        );
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("", "/assets/bath.png"), "/assets/bath.png");
        assert_eq!(
            join_url("https://example.org/board/", "/assets/bath.png"),
            "https://example.org/board/assets/bath.png"
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_resolve_image() {
        let config = AppConfig {
            public_dir: PathBuf::from("/srv/public"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolve_image("/assets/bath.png"),
            PathBuf::from("/srv/public/assets/bath.png")
        );
        assert_eq!(config.assets_dir(), PathBuf::from("/srv/public/assets"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_load_board_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, r#"{"rows": 2, "cols": 5}"#).unwrap();

        let board = load_board_config(path.to_str().unwrap()).unwrap();
        assert_eq!((board.rows, board.cols), (2, 5));

        std::fs::write(&path, r#"{"rows": 0}"#).unwrap();
        assert!(matches!(
            load_board_config(path.to_str().unwrap()),
            Err(ConfigError::Invalid(_))
        ));
        assert!(load_board_config("/nonexistent/board.json").is_err());
    }
}
