//! Deterministic dataset generation.
//!
//! Generation is a pure function of the seed definition: the same definition
//! always yields the same ids, names, and structure, which keeps demo
//! environments reproducible and makes seeding idempotent.

use fake::Fake;
use fake::faker::name::en::Name;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::error::GenerationError;
use crate::registry::SeedDefinition;
use crate::seed::{
    CategorySeed, ClubSeed, EventModeSeed, EventSeed, ExampleDataSet, ExampleUserSeed,
};
use crate::validation::sanitise_display_name;

const CATEGORY_NAMES: &[&str] = &[
    "Sports", "Arts", "Technology", "Culture", "Outdoors", "Music", "Gaming", "Science",
];
const CLUB_TOPICS: &[&str] = &[
    "Chess",
    "Robotics",
    "Debate",
    "Photography",
    "Climbing",
    "Jazz",
    "Cinema",
    "Astronomy",
    "Pottery",
    "Fencing",
];
const CLUB_SUFFIXES: &[&str] = &["Society", "Club", "Circle", "Collective"];
const EVENT_SEASONS: &[&str] = &["Spring", "Summer", "Autumn", "Winter"];
const EVENT_FORMATS: &[&str] = &["Open", "Tournament", "Meetup", "Showcase", "Workshop"];

fn pick<'a>(rng: &mut ChaCha8Rng, items: &'a [&'a str]) -> &'a str {
    let index = rng.random_range(0..items.len());
    items.get(index).copied().unwrap_or("Misc")
}

fn deterministic_uuid(rng: &mut ChaCha8Rng) -> Uuid {
    Uuid::from_u128(rng.random::<u128>())
}

fn category_name(index: usize) -> String {
    let position = index % CATEGORY_NAMES.len();
    let name = CATEGORY_NAMES.get(position).copied().unwrap_or("Misc");
    if index < CATEGORY_NAMES.len() {
        name.to_owned()
    } else {
        format!("{name} {}", index / CATEGORY_NAMES.len() + 1)
    }
}

fn generate_event(rng: &mut ChaCha8Rng) -> EventSeed {
    let mode = match rng.random_range(0_u8..3) {
        0 => EventModeSeed::Single,
        1 => EventModeSeed::Group,
        _ => EventModeSeed::Both,
    };
    let team_size = match mode {
        EventModeSeed::Single => None,
        EventModeSeed::Group | EventModeSeed::Both => {
            let min = rng.random_range(2_u32..=3);
            let max = rng.random_range(min..=min + 3);
            Some((min, max))
        }
    };
    EventSeed {
        id: deterministic_uuid(rng),
        name: format!(
            "{} {}",
            pick(rng, EVENT_SEASONS),
            pick(rng, EVENT_FORMATS)
        ),
        mode,
        team_size,
    }
}

fn generate_club(rng: &mut ChaCha8Rng, events_per_club: usize) -> ClubSeed {
    let topic = pick(rng, CLUB_TOPICS);
    let suffix = pick(rng, CLUB_SUFFIXES);
    ClubSeed {
        id: deterministic_uuid(rng),
        name: format!("{topic} {suffix}"),
        description: format!("Campus {} enthusiasts, all levels welcome", topic.to_lowercase()),
        events: (0..events_per_club).map(|_| generate_event(rng)).collect(),
    }
}

fn generate_user(rng: &mut ChaCha8Rng, index: usize) -> Result<ExampleUserSeed, GenerationError> {
    let raw: String = Name().fake_with_rng(rng);
    let display_name = sanitise_display_name(&raw)
        .or_else(|| sanitise_display_name(&format!("Member {}", index + 1)))
        .ok_or(GenerationError::InvalidDisplayName { display_name: raw })?;
    let slug: String = display_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase();
    Ok(ExampleUserSeed {
        id: deterministic_uuid(rng),
        email: format!("{slug}{}@campus.example", index + 1),
        display_name,
    })
}

/// Generate the dataset a seed definition describes.
///
/// # Errors
///
/// Returns a [`GenerationError`] when a display name cannot be made valid,
/// which indicates a bug in sanitisation rather than bad input.
pub fn generate_example_data(seed: &SeedDefinition) -> Result<ExampleDataSet, GenerationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.seed);

    let categories = (0..seed.category_count)
        .map(|index| CategorySeed {
            id: deterministic_uuid(&mut rng),
            name: category_name(index),
            clubs: (0..seed.clubs_per_category)
                .map(|_| generate_club(&mut rng, seed.events_per_club))
                .collect(),
        })
        .collect();

    let users = (0..seed.user_count)
        .map(|index| generate_user(&mut rng, index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExampleDataSet { categories, users })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::validation::is_valid_display_name;
    use std::collections::HashSet;

    fn definition() -> SeedDefinition {
        SeedDefinition {
            name: "campus-demo".to_owned(),
            seed: 42,
            category_count: 3,
            clubs_per_category: 4,
            events_per_club: 2,
            user_count: 10,
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let first = generate_example_data(&definition()).expect("generation succeeds");
        let second = generate_example_data(&definition()).expect("generation succeeds");
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut other = definition();
        other.seed = 43;
        let first = generate_example_data(&definition()).expect("generation succeeds");
        let second = generate_example_data(&other).expect("generation succeeds");
        assert_ne!(first, second);
    }

    #[test]
    fn generated_shape_matches_the_definition() {
        let data = generate_example_data(&definition()).expect("generation succeeds");
        assert_eq!(data.categories.len(), 3);
        assert!(data
            .categories
            .iter()
            .all(|category| category.clubs.len() == 4
                && category.clubs.iter().all(|club| club.events.len() == 2)));
        assert_eq!(data.users.len(), 10);
    }

    #[test]
    fn generated_users_satisfy_backend_constraints_and_are_unique() {
        let data = generate_example_data(&definition()).expect("generation succeeds");
        let mut emails = HashSet::new();
        for user in &data.users {
            assert!(is_valid_display_name(&user.display_name), "{}", user.display_name);
            assert!(emails.insert(user.email.clone()), "duplicate {}", user.email);
        }
    }

    #[test]
    fn team_capable_events_carry_bounds() {
        let data = generate_example_data(&definition()).expect("generation succeeds");
        for event in data
            .categories
            .iter()
            .flat_map(|category| &category.clubs)
            .flat_map(|club| &club.events)
        {
            match event.mode {
                EventModeSeed::Single => assert!(event.team_size.is_none()),
                EventModeSeed::Group | EventModeSeed::Both => {
                    let (min, max) = event.team_size.expect("bounds present");
                    assert!(1 <= min && min <= max);
                }
            }
        }
    }
}
