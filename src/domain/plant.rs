//! Plant listings and their lifecycle status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PlantId, UserId};
use crate::error::MarketError;

const MAX_SHORT_FIELD: usize = 100;
const MAX_DESCRIPTION: usize = 2000;

/// Lifecycle status of a plant listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlantStatus {
    /// Listed and eligible to be offered or selected.
    Available,
    /// Put on hold by its owner.
    Pending,
    /// Traded away in a completed exchange.
    Exchanged,
}

impl PlantStatus {
    /// Returns the status as its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Exchanged => "exchanged",
        }
    }
}

impl fmt::Display for PlantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlantStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "pending" => Ok(Self::Pending),
            "exchanged" => Ok(Self::Exchanged),
            other => Err(MarketError::InvalidRequest(format!(
                "unknown plant status: {other}"
            ))),
        }
    }
}

/// A plant listed by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    /// Unique plant identifier.
    pub id: PlantId,
    /// The listing user. Never changes.
    pub owner_id: UserId,
    /// Common name.
    pub name: String,
    /// Botanical species.
    pub species: String,
    /// Optional subspecies or cultivar.
    pub subspecies: Option<String>,
    /// Free-form location (city, neighbourhood).
    pub location: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Public URL of the listing photo.
    pub image_url: Option<String>,
    /// Category such as `"succulent"` or `"cutting"`.
    pub plant_type: String,
    /// Lifecycle status.
    pub status: PlantStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Plant {
    /// Builds a fresh `available` listing owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] if a required field is blank
    /// or any field is too long.
    pub fn new(owner_id: UserId, draft: NewPlant) -> Result<Self, MarketError> {
        let draft = draft.validated()?;
        Ok(Self {
            id: PlantId::new(),
            owner_id,
            name: draft.name,
            species: draft.species,
            subspecies: draft.subspecies,
            location: draft.location,
            description: draft.description,
            image_url: None,
            plant_type: draft.plant_type,
            status: PlantStatus::Available,
            created_at: Utc::now(),
        })
    }

    /// Returns `true` if the plant can be offered or selected.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == PlantStatus::Available
    }

    /// Applies an owner edit in place.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] on invalid field values or a
    /// status change the owner may not make.
    pub fn apply(&mut self, patch: PlantPatch) -> Result<(), MarketError> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = required("name", &name)?;
        }
        if let Some(species) = patch.species {
            next.species = required("species", &species)?;
        }
        if let Some(subspecies) = patch.subspecies {
            next.subspecies = optional("subspecies", &subspecies, MAX_SHORT_FIELD)?;
        }
        if let Some(location) = patch.location {
            next.location = required("location", &location)?;
        }
        if let Some(description) = patch.description {
            next.description = optional("description", &description, MAX_DESCRIPTION)?;
        }
        if let Some(plant_type) = patch.plant_type {
            next.plant_type = required("plant_type", &plant_type)?;
        }
        if let Some(status) = patch.status {
            let touches_exchanged =
                status == PlantStatus::Exchanged || self.status == PlantStatus::Exchanged;
            if touches_exchanged && status != self.status {
                return Err(MarketError::InvalidRequest(
                    "exchanged status is set only by completing an exchange".to_string(),
                ));
            }
            next.status = status;
        }
        *self = next;
        Ok(())
    }
}

/// Owner-supplied fields for a new listing.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewPlant {
    /// Common name.
    pub name: String,
    /// Botanical species.
    pub species: String,
    /// Optional subspecies or cultivar.
    #[serde(default)]
    pub subspecies: Option<String>,
    /// Free-form location.
    pub location: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Category such as `"succulent"`.
    pub plant_type: String,
}

impl NewPlant {
    fn validated(self) -> Result<Self, MarketError> {
        Ok(Self {
            name: required("name", &self.name)?,
            species: required("species", &self.species)?,
            subspecies: match self.subspecies {
                Some(s) => optional("subspecies", &s, MAX_SHORT_FIELD)?,
                None => None,
            },
            location: required("location", &self.location)?,
            description: match self.description {
                Some(d) => optional("description", &d, MAX_DESCRIPTION)?,
                None => None,
            },
            plant_type: required("plant_type", &self.plant_type)?,
        })
    }
}

/// Partial owner edit. Absent fields are left unchanged; an empty string
/// clears an optional field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PlantPatch {
    /// New common name.
    #[serde(default)]
    pub name: Option<String>,
    /// New species.
    #[serde(default)]
    pub species: Option<String>,
    /// New subspecies; empty clears it.
    #[serde(default)]
    pub subspecies: Option<String>,
    /// New location.
    #[serde(default)]
    pub location: Option<String>,
    /// New description; empty clears it.
    #[serde(default)]
    pub description: Option<String>,
    /// New category.
    #[serde(default)]
    pub plant_type: Option<String>,
    /// Hold (`pending`) or release (`available`) the listing.
    #[serde(default)]
    pub status: Option<PlantStatus>,
}

fn required(field: &str, value: &str) -> Result<String, MarketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MarketError::InvalidRequest(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_SHORT_FIELD {
        return Err(MarketError::InvalidRequest(format!(
            "{field} must be at most {MAX_SHORT_FIELD} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn optional(field: &str, value: &str, max: usize) -> Result<Option<String>, MarketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(MarketError::InvalidRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn draft() -> NewPlant {
        NewPlant {
            name: "  Monstera ".to_string(),
            species: "Monstera deliciosa".to_string(),
            subspecies: Some(String::new()),
            location: "Lisbon".to_string(),
            description: Some("Two leaves, rooted".to_string()),
            plant_type: "cutting".to_string(),
        }
    }

    #[test]
    fn new_plant_is_available_and_trimmed() {
        let Ok(plant) = Plant::new(UserId::new(), draft()) else {
            panic!("valid draft rejected");
        };
        assert_eq!(plant.status, PlantStatus::Available);
        assert_eq!(plant.name, "Monstera");
        assert_eq!(plant.subspecies, None);
        assert!(plant.image_url.is_none());
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let mut d = draft();
        d.location = "   ".to_string();
        assert!(matches!(
            Plant::new(UserId::new(), d),
            Err(MarketError::InvalidRequest(_))
        ));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut d = draft();
        d.name = "x".repeat(101);
        assert!(Plant::new(UserId::new(), d).is_err());
    }

    #[test]
    fn patch_clears_optional_and_keeps_absent() {
        let Ok(mut plant) = Plant::new(UserId::new(), draft()) else {
            panic!("valid draft rejected");
        };
        let patch = PlantPatch {
            description: Some(String::new()),
            location: Some("Porto".to_string()),
            ..PlantPatch::default()
        };
        assert!(plant.apply(patch).is_ok());
        assert_eq!(plant.description, None);
        assert_eq!(plant.location, "Porto");
        assert_eq!(plant.name, "Monstera");
    }

    #[test]
    fn owner_can_hold_and_release() {
        let Ok(mut plant) = Plant::new(UserId::new(), draft()) else {
            panic!("valid draft rejected");
        };
        let hold = PlantPatch {
            status: Some(PlantStatus::Pending),
            ..PlantPatch::default()
        };
        assert!(plant.apply(hold).is_ok());
        assert_eq!(plant.status, PlantStatus::Pending);

        let release = PlantPatch {
            status: Some(PlantStatus::Available),
            ..PlantPatch::default()
        };
        assert!(plant.apply(release).is_ok());
        assert!(plant.is_available());
    }

    #[test]
    fn owner_cannot_touch_exchanged_status() {
        let Ok(mut plant) = Plant::new(UserId::new(), draft()) else {
            panic!("valid draft rejected");
        };
        let set_exchanged = PlantPatch {
            status: Some(PlantStatus::Exchanged),
            ..PlantPatch::default()
        };
        assert!(plant.apply(set_exchanged).is_err());

        plant.status = PlantStatus::Exchanged;
        let revive = PlantPatch {
            status: Some(PlantStatus::Available),
            ..PlantPatch::default()
        };
        assert!(plant.apply(revive).is_err());
        assert_eq!(plant.status, PlantStatus::Exchanged);
    }

    #[test]
    fn status_parses_from_stored_form() {
        for status in [
            PlantStatus::Available,
            PlantStatus::Pending,
            PlantStatus::Exchanged,
        ] {
            assert_eq!(status.as_str().parse::<PlantStatus>().ok(), Some(status));
        }
        assert!("sold".parse::<PlantStatus>().is_err());
    }
}
