//! Error types for registry loading and data generation.

/// Failures while loading or interrogating a seed registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The registry JSON failed to parse.
    #[error("registry JSON is malformed: {message}")]
    Malformed {
        /// Underlying parse failure, as text.
        message: String,
    },
    /// The registry names a version this crate does not understand.
    #[error("registry version {version} is not supported")]
    UnsupportedVersion {
        /// Version found in the registry.
        version: u32,
    },
    /// A seed definition carried an impossible shape.
    #[error("seed \"{name}\" is invalid: {message}")]
    InvalidSeed {
        /// Name of the offending seed definition.
        name: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Failures while generating a dataset from a seed definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// A generated display name failed backend validation even after
    /// sanitisation.
    #[error("generated display name \"{display_name}\" is invalid")]
    InvalidDisplayName {
        /// The rejected name.
        display_name: String,
    },
}
