//! Keyboard and pointer shortcut registry.

/// A shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+E").
    pub fn format(&self) -> String {
        if self.ctrl {
            format!("Ctrl+{}", self.key)
        } else {
            self.key.to_string()
        }
    }
}

/// Registry of all shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("E", true, "Export to PNG"),
            Shortcut::new("Escape", false, "Cancel drag"),
            Shortcut::new("Drag", false, "Place, move or swap symbols"),
            Shortcut::new("Double-click", false, "Remove symbol"),
        ]
    }

    /// Log all shortcuts.
    pub fn log_all() {
        log::info!("Shortcuts:");
        for shortcut in Self::all() {
            log::info!("  {:14} {}", shortcut.format(), shortcut.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(Shortcut::new("E", true, "").format(), "Ctrl+E");
        assert_eq!(Shortcut::new("Escape", false, "").format(), "Escape");
    }

    #[test]
    fn test_registry_has_export() {
        assert!(
            ShortcutRegistry::all()
                .iter()
                .any(|s| s.ctrl && s.key == "E")
        );
    }
}
