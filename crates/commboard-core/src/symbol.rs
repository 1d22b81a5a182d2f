//! Symbol records and file-name derived metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Directory prefix for symbol image paths.
pub const ASSET_PREFIX: &str = "/assets/";

/// Maximum number of tags derived from a file name.
const MAX_DERIVED_TAGS: usize = 2;

/// A picture symbol that can be placed on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique, stable identifier.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Reference to the image asset (e.g. `/assets/bath.png`).
    #[serde(rename = "imagePath")]
    pub image_path: String,
    /// Classification labels.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Symbol {
    /// Create a symbol from its parts.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image_path: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_path: image_path.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a symbol from an asset file name such as `"brush teeth.png"`.
    pub fn from_file_name(file_name: &str) -> Self {
        let name = format_symbol_name(file_name);
        let tags = derive_tags(&name, file_name);
        Self {
            id: symbol_id(file_name),
            image_path: format!("{}{}", ASSET_PREFIX, file_name),
            name,
            tags: tags.into_iter().collect(),
        }
    }

    /// Check whether the symbol carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Turn a file name into a display name: extension removed, words title-cased.
///
/// Only a trailing `.png` is stripped; a `.png` elsewhere in the name is
/// kept as text.
pub fn format_symbol_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".png").unwrap_or(file_name);
    stem.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a stable id from a file name: lowercase, whitespace to `_`,
/// extension removed, anything but word characters dropped.
pub fn symbol_id(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    let stem = lower.strip_suffix(".png").unwrap_or(&lower);

    let mut id = String::with_capacity(stem.len());
    let mut in_whitespace = false;
    for c in stem.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                id.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' {
            id.push(c);
        }
    }
    id
}

/// Keyword table used to classify symbols by name.
const TAG_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "emotions",
        &["angry", "happy", "sad", "excited", "bored", "confused", "thinking", "overjoyed"],
    ),
    ("people", &["chloe", "izzi", "sisters", "person", "people"]),
    (
        "daily-activities",
        &["bath", "sleep", "bedtime", "brush", "get dressed", "toilet", "dinner", "entertainment"],
    ),
    (
        "food",
        &["dinner", "bottle", "cheese", "toast", "ice lolly", "easter egg", "mcdonalds"],
    ),
    (
        "places",
        &["cinema", "playground", "cottage", "blackpool", "gullivers world", "mcdonalds"],
    ),
    (
        "objects",
        &["bottle", "ipad", "pyjamas", "bunk beds", "dream machine", "car", "train", "pushchair"],
    ),
    ("communication", &["stop", "finished", "thinking"]),
];

/// Classify a symbol by keywords found in its name or file name.
///
/// Tags come out in table order, deduplicated, at most two of them.
pub fn derive_tags(name: &str, file_name: &str) -> Vec<String> {
    let name = name.to_lowercase();
    let file_name = file_name.to_lowercase();

    let mut tags: Vec<String> = Vec::new();
    for (tag, keywords) in TAG_KEYWORDS {
        let hit = keywords
            .iter()
            .any(|keyword| name.contains(keyword) || file_name.contains(keyword));
        if hit && !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
    tags.truncate(MAX_DERIVED_TAGS);
    tags
}

/// Human-readable description of a known tag category.
pub fn tag_description(tag: &str) -> Option<&'static str> {
    match tag {
        "emotions" => Some("Feelings and emotional expressions"),
        "people" => Some("Family members and individuals"),
        "daily-activities" => Some("Daily routines and activities"),
        "food" => Some("Food, drinks, and meals"),
        "places" => Some("Locations and venues"),
        "objects" => Some("Items, toys, and tools"),
        "communication" => Some("Actions and communication"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_symbol_name() {
        assert_eq!(format_symbol_name("bath.png"), "Bath");
        assert_eq!(format_symbol_name("brush teeth.png"), "Brush Teeth");
        assert_eq!(format_symbol_name("McDonalds.png"), "Mcdonalds");
        assert_eq!(format_symbol_name("bedtime song 001.png"), "Bedtime Song 001");
        assert_eq!(format_symbol_name("my.png file.png"), "My.png File");
    }

    #[test]
    fn test_symbol_id() {
        assert_eq!(symbol_id("bath.png"), "bath");
        assert_eq!(symbol_id("bedtime song.png"), "bedtime_song");
        assert_eq!(symbol_id("Chloe.png"), "chloe");
        assert_eq!(symbol_id("get dressed 002.png"), "get_dressed_002");
    }

    #[test]
    fn test_derive_tags() {
        assert_eq!(derive_tags("Bath", "bath.png"), vec!["daily-activities"]);
        assert_eq!(derive_tags("Car", "car.png"), vec!["objects"]);
        // "thinking" hits both emotions and communication
        assert_eq!(derive_tags("Thinking", "thinking.png"), vec!["emotions", "communication"]);
        assert!(derive_tags("Trim Fringe", "trim fringe.png").is_empty());
    }

    #[test]
    fn test_derive_tags_capped_at_two() {
        // dinner -> daily-activities + food; mcdonalds would add places
        let tags = derive_tags("Dinner At Mcdonalds", "dinner at mcdonalds.png");
        assert_eq!(tags, vec!["daily-activities", "food"]);
    }

    #[test]
    fn test_from_file_name() {
        let symbol = Symbol::from_file_name("cheese on toast.png");
        assert_eq!(symbol.id, "cheese_on_toast");
        assert_eq!(symbol.name, "Cheese On Toast");
        assert_eq!(symbol.image_path, "/assets/cheese on toast.png");
        assert!(symbol.has_tag("food"));
    }

    #[test]
    fn test_serde_uses_image_path_key() {
        let symbol = Symbol::new("bath", "Bath", "/assets/bath.png", ["daily-activities"]);
        let json = serde_json::to_string(&symbol).unwrap();
        assert!(json.contains("\"imagePath\""));

        let parsed: Symbol =
            serde_json::from_str(r#"{"id":"car","name":"Car","imagePath":"/assets/car.png"}"#)
                .unwrap();
        assert!(parsed.tags.is_empty());
    }
}
