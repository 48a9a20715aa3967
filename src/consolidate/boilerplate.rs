//! Boilerplate detection

use crate::ConfigError;
use regex::RegexSet;

/// Decides whether a sentence is boilerplate (pricing, ratings, navigation)
pub trait BoilerplateFilter: Send + Sync {
    fn is_boilerplate(&self, sentence: &str) -> bool;
}

/// Regex-driven boilerplate filter
#[derive(Debug, Clone)]
pub struct PatternBoilerplate {
    patterns: RegexSet,
}

impl PatternBoilerplate {
    /// Compiles the given patterns into a single matcher
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = RegexSet::new(patterns.iter().map(|p| p.as_ref()))
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        Ok(Self { patterns })
    }
}

impl BoilerplateFilter for PatternBoilerplate {
    fn is_boilerplate(&self, sentence: &str) -> bool {
        self.patterns.is_match(sentence.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_boilerplate_patterns;

    fn filter() -> PatternBoilerplate {
        PatternBoilerplate::new(&default_boilerplate_patterns()).unwrap()
    }

    #[test]
    fn test_commercial_sentences() {
        let filter = filter();
        assert!(filter.is_boilerplate("Buy now $9.99."));
        assert!(filter.is_boilerplate("Only 24.99 USD with free shipping."));
        assert!(filter.is_boilerplate("Add to cart."));
        assert!(filter.is_boilerplate("Rated 4.5 out of 5."));
        assert!(filter.is_boilerplate("312 reviews."));
    }

    #[test]
    fn test_navigation_sentences() {
        let filter = filter();
        assert!(filter.is_boilerplate("Home."));
        assert!(filter.is_boilerplate("Skip to content."));
        assert!(!filter.is_boilerplate("Return the phone to the home screen."));
    }

    #[test]
    fn test_technical_sentences_pass() {
        let filter = filter();
        assert!(!filter.is_boilerplate("The fan may fail due to dust buildup."));
        assert!(!filter.is_boilerplate("Remove the 4 screws holding the back cover."));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = PatternBoilerplate::new(&["(unclosed"]);
        assert!(matches!(result, Err(ConfigError::InvalidPattern(_))));
    }
}
