//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain records are mirrored by response DTOs so the wire shape and the
//! OpenAPI schema stay stable when internal types change. Owner-editable
//! request bodies (`NewPlant`, `PlantPatch`, `NewProfile`, `ProfilePatch`)
//! come straight from the domain.

pub mod common_dto;
pub mod exchange_dto;
pub mod notification_dto;
pub mod plant_dto;
pub mod profile_dto;

pub use common_dto::*;
pub use exchange_dto::*;
pub use notification_dto::*;
pub use plant_dto::*;
pub use profile_dto::*;
