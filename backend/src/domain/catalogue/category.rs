//! Category aggregate.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{CategoryId, ClubId};
use crate::domain::label::Label;

/// Category grouping a set of clubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: CategoryId,
    #[schema(value_type = String, example = "Sports")]
    name: Label,
    /// Denormalised child club ids, mirrored from the `Clubs` sub-collection.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    club_ids: Vec<ClubId>,
}

impl Category {
    /// Build a new empty [`Category`].
    pub fn new(id: CategoryId, name: Label) -> Self {
        Self {
            id,
            name,
            club_ids: Vec::new(),
        }
    }

    /// Stable category identifier.
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    /// Category name shown in the browser.
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Denormalised child club ids.
    pub fn club_ids(&self) -> &[ClubId] {
        &self.club_ids
    }
}
