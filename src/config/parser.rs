use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two sessions against the same target can be told
/// apart when their settings differ.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
state-dir = "./state"
tree-path = "./tree.json"

[resolver]
root-url = "https://example.com/Device"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_fills_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 8);
        assert_eq!(config.crawler.max_fan_out, 200);
        assert_eq!(config.resolver.root_name, "Root");
        assert_eq!(config.resolver.join_char, '_');
        assert_eq!(config.resolver.category_base(), "https://example.com/Device");
        assert!((config.consolidation.sentence_similarity - 0.9).abs() < f64::EPSILON);
        assert!(!config.consolidation.boilerplate_patterns.is_empty());
        assert!(!config.links.deny_patterns.is_empty());
        assert_eq!(config.extractor.sections.len(), 1);
        assert!(config.output.summary_path.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let content = format!(
            r#"{MINIMAL}
root-name = "Devices"
category-base = "https://example.com/Device/"
join-char = "-"
generic-suffixes = ["repair"]

[resolver.aliases]
"phone" = ["mobile", "cell phone"]

[crawler]
max-depth = 3
max-fan-out = 10
delay-min-ms = 0
delay-max-ms = 0
treat-target-as-leaf = true

[consolidation]
sentence-similarity = 0.85
fragment-redundancy = 0.4
max-paragraph-sentences = 4

[extractor]
child-selector = "ul.cats a"

[[extractor.sections]]
name = "causes"
selector = ".cause p"
"#
        );

        let file = create_temp_config(&content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert!(config.crawler.treat_target_as_leaf);
        assert_eq!(config.resolver.root_name, "Devices");
        assert_eq!(config.resolver.join_char, '-');
        assert_eq!(config.resolver.aliases["phone"].len(), 2);
        assert_eq!(config.consolidation.max_paragraph_sentences, 4);
        assert_eq!(config.consolidation.min_paragraph_sentences, 3);
        assert_eq!(config.extractor.child_selector, "ul.cats a");
        assert_eq!(config.extractor.sections[0].name, "causes");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/canopy.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = format!("{MINIMAL}\n[crawler]\nmax-fan-out = 0\n");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
