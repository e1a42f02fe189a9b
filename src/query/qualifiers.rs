//! Qualifier alias registry.

use ahash::AHashMap;

use crate::error::{BurrowError, Result};

/// Maps query-side qualifier aliases to canonical category names.
///
/// Built once before the first query and read-only afterwards. Aliases are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct QualifierRegistry {
    aliases: AHashMap<String, String>,
}

impl QualifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` for `category`.
    ///
    /// Registering the same alias for the same category twice is fine; one
    /// alias pointing at two different categories is a configuration error.
    pub fn register(&mut self, alias: &str, category: &str) -> Result<()> {
        let alias = alias.trim().to_lowercase();
        if alias.is_empty() {
            return Err(BurrowError::invalid_config(format!(
                "empty qualifier for category {category}"
            )));
        }
        match self.aliases.get(&alias) {
            Some(existing) if existing != category => Err(BurrowError::invalid_config(format!(
                "qualifier {alias:?} maps to both {existing} and {category}"
            ))),
            Some(_) => Ok(()),
            None => {
                self.aliases.insert(alias, category.to_string());
                Ok(())
            }
        }
    }

    /// Canonical category name for an alias, `None` when unknown.
    pub fn normalize(&self, alias: &str) -> Option<&str> {
        self.aliases
            .get(&alias.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
