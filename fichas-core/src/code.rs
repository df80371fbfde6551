//! Project-code validity rule.

use crate::config::FichasConfig;

/// Decides whether a string is a well-formed project code: it must start with
/// one of the configured prefixes and be strictly longer than the configured
/// minimum length (after trimming).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeValidator {
    prefixes: Vec<String>,
    min_length: usize,
}

impl CodeValidator {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>, min_length: usize) -> Self {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
            min_length,
        }
    }

    pub fn from_config(config: &FichasConfig) -> Self {
        Self::new(config.code_prefixes.iter().cloned(), config.min_code_length)
    }

    pub fn is_valid(&self, candidate: &str) -> bool {
        let code = candidate.trim();
        self.prefixes.iter().any(|p| code.starts_with(p.as_str()))
            && code.chars().count() > self.min_length
    }
}
