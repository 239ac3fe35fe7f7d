//! Seed registry loading and validation.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

const SUPPORTED_VERSION: u32 = 1;

/// One named generation recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDefinition {
    /// Registry-unique recipe name.
    pub name: String,
    /// Deterministic RNG seed.
    pub seed: u64,
    /// Number of categories to generate.
    pub category_count: usize,
    /// Number of clubs inside each category.
    pub clubs_per_category: usize,
    /// Number of events inside each club.
    pub events_per_club: usize,
    /// Number of user accounts to generate.
    pub user_count: usize,
}

/// Versioned collection of seed definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRegistry {
    /// Registry schema version.
    pub version: u32,
    /// Named recipes.
    pub seeds: Vec<SeedDefinition>,
}

impl SeedRegistry {
    /// Parse and validate a registry from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] for malformed JSON, an unsupported
    /// version, or a seed with zero counts throughout.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let registry: Self =
            serde_json::from_str(json).map_err(|error| RegistryError::Malformed {
                message: error.to_string(),
            })?;
        if registry.version != SUPPORTED_VERSION {
            return Err(RegistryError::UnsupportedVersion {
                version: registry.version,
            });
        }
        for seed in &registry.seeds {
            if seed.name.trim().is_empty() {
                return Err(RegistryError::InvalidSeed {
                    name: seed.name.clone(),
                    message: "name must not be blank".to_owned(),
                });
            }
            if seed.category_count == 0 && seed.user_count == 0 {
                return Err(RegistryError::InvalidSeed {
                    name: seed.name.clone(),
                    message: "a seed must generate at least one category or user".to_owned(),
                });
            }
        }
        Ok(registry)
    }

    /// Find a recipe by name.
    pub fn find_seed(&self, name: &str) -> Option<&SeedDefinition> {
        self.seeds.iter().find(|seed| seed.name == name)
    }
}
