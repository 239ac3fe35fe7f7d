//! Deterministic example catalogue and user data for demonstration purposes.
//!
//! This crate generates a believable, reproducible campus dataset
//! (categories, clubs, events, and users) from a JSON seed registry. It is
//! independent of backend domain types to avoid circular dependencies; the
//! backend converts the seed records into its own entities at the point of
//! use.
//!
//! # Example
//!
//! ```
//! use example_data::{SeedRegistry, generate_example_data};
//!
//! let json = r#"{
//!     "version": 1,
//!     "seeds": [{
//!         "name": "campus-demo",
//!         "seed": 42,
//!         "categoryCount": 2,
//!         "clubsPerCategory": 2,
//!         "eventsPerClub": 1,
//!         "userCount": 4
//!     }]
//! }"#;
//!
//! let registry = SeedRegistry::from_json(json).expect("valid registry");
//! let seed_def = registry.find_seed("campus-demo").expect("seed exists");
//! let data = generate_example_data(seed_def).expect("generation succeeds");
//!
//! assert_eq!(data.categories.len(), 2);
//! assert_eq!(data.users.len(), 4);
//! ```

mod error;
mod generator;
mod registry;
mod seed;
mod validation;

pub use error::{GenerationError, RegistryError};
pub use generator::generate_example_data;
pub use registry::{SeedDefinition, SeedRegistry};
pub use seed::{
    CategorySeed, ClubSeed, EventModeSeed, EventSeed, ExampleDataSet, ExampleUserSeed,
};
pub use validation::{DISPLAY_NAME_MAX, DISPLAY_NAME_MIN, is_valid_display_name};
