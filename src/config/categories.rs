//! Default category configuration loaded from config.toml
//!
//! The categories listed here seed the database the first time `SubTrack` starts against
//! an empty database. When no config file is present a built-in default set is used.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Categories to seed on first run
    pub categories: Vec<CategoryConfig>,
}

/// Configuration for a single default category
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CategoryConfig {
    /// Category name
    pub name: String,
    /// Display icon
    pub icon: String,
    /// Monthly budget
    #[serde(default)]
    pub budget: f64,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Index into the gradient palette
    #[serde(default)]
    pub gradient_index: i32,
}

impl CategoryConfig {
    fn new(name: &str, icon: &str, description: &str, gradient_index: i32) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            budget: 0.0,
            description: description.to_string(),
            gradient_index,
        }
    }
}

/// Loads the default category set from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the default categories from `./config.toml`, falling back to the built-in set
/// when the file does not exist. A file that exists but fails to parse is an error.
pub fn load_default_categories() -> Result<Vec<CategoryConfig>> {
    let path = Path::new("config.toml");
    if !path.exists() {
        info!("No config.toml found, using built-in default categories");
        return Ok(builtin_categories());
    }

    debug!("Loading default categories from {:?}", path);
    Ok(load_config(path)?.categories)
}

/// The default category set used when no config file is present.
#[must_use]
pub fn builtin_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("Entertainment", "🎬", "Streaming video and games", 0),
        CategoryConfig::new("Music", "🎵", "Music and audio streaming", 1),
        CategoryConfig::new("Productivity", "💼", "Work tools and software", 2),
        CategoryConfig::new("Cloud Storage", "☁️", "Backups and file hosting", 3),
        CategoryConfig::new("Health", "💪", "Fitness and wellbeing", 4),
        CategoryConfig::new("Education", "📚", "Courses and learning", 5),
    ]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_category_config() {
        let toml_str = r#"
            [[categories]]
            name = "Entertainment"
            icon = "🎬"
            budget = 30.0
            description = "Streaming"
            gradient_index = 2

            [[categories]]
            name = "Music"
            icon = "🎵"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].name, "Entertainment");
        assert_eq!(config.categories[0].budget, 30.0);
        assert_eq!(config.categories[0].gradient_index, 2);

        // Optional fields fall back to defaults
        assert_eq!(config.categories[1].budget, 0.0);
        assert!(config.categories[1].description.is_empty());
        assert_eq!(config.categories[1].gradient_index, 0);
    }

    #[test]
    fn test_builtin_categories_have_unique_names() {
        let categories = builtin_categories();
        let mut names: Vec<String> = categories.iter().map(|c| c.name.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), categories.len());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
