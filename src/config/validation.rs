use crate::config::types::{
    Config, ConsolidationConfig, CrawlerConfig, ExtractorConfig, OutputConfig, ResolverConfig,
    UserAgentConfig,
};
use crate::url::segments_below;
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_resolver_config(&config.resolver)?;
    validate_consolidation_config(&config.consolidation)?;
    validate_extractor_config(&config.extractor)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be >= 1, got {}",
            config.max_depth
        )));
    }

    if config.max_fan_out < 1 {
        return Err(ConfigError::Validation(format!(
            "max_fan_out must be >= 1, got {}",
            config.max_fan_out
        )));
    }

    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay_min_ms ({}) must not exceed delay_max_ms ({})",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.state_dir.is_empty() {
        return Err(ConfigError::Validation(
            "state_dir cannot be empty".to_string(),
        ));
    }

    if config.tree_path.is_empty() {
        return Err(ConfigError::Validation(
            "tree_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.summary_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates resolver configuration
fn validate_resolver_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    validate_http_url("root_url", &config.root_url)?;

    if let Some(base) = &config.category_base {
        validate_http_url("category_base", base)?;

        if segments_below(&config.root_url, base).is_none() {
            return Err(ConfigError::Validation(format!(
                "category_base '{}' must be root_url or below it",
                base
            )));
        }
    }

    if config.root_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "root_name cannot be empty".to_string(),
        ));
    }

    if config.join_char.is_whitespace() || config.join_char == '/' {
        return Err(ConfigError::Validation(format!(
            "join_char cannot be whitespace or '/', got {:?}",
            config.join_char
        )));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, value
        )));
    }

    Ok(())
}

/// Validates consolidation thresholds and boilerplate patterns
fn validate_consolidation_config(config: &ConsolidationConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("sentence_similarity", config.sentence_similarity),
        ("fragment_redundancy", config.fragment_redundancy),
        ("paragraph_similarity", config.paragraph_similarity),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "{} must be in (0, 1], got {}",
                name, value
            )));
        }
    }

    if config.min_paragraph_sentences < 1 {
        return Err(ConfigError::Validation(
            "min_paragraph_sentences must be >= 1".to_string(),
        ));
    }

    if config.min_paragraph_sentences > config.max_paragraph_sentences {
        return Err(ConfigError::Validation(format!(
            "min_paragraph_sentences ({}) must not exceed max_paragraph_sentences ({})",
            config.min_paragraph_sentences, config.max_paragraph_sentences
        )));
    }

    for pattern in &config.boilerplate_patterns {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}

/// Validates that every configured CSS selector parses
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    let mut selectors = vec![
        ("breadcrumb_selector", config.breadcrumb_selector.as_str()),
        ("child_selector", config.child_selector.as_str()),
        ("leaf_selector", config.leaf_selector.as_str()),
        ("title_selector", config.title_selector.as_str()),
    ];
    selectors.extend(
        config
            .sections
            .iter()
            .map(|section| (section.name.as_str(), section.selector.as_str())),
    );

    for (name, selector) in selectors {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::InvalidPattern(format!(
                "Invalid CSS selector for {}: '{}'",
                name, selector
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
