//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Response body of bulk updates.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdatedCountResponse {
    /// Number of records changed.
    pub updated: u64,
}

/// Empty acknowledgement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AckResponse {
    /// Always `true`.
    pub ok: bool,
}

impl AckResponse {
    /// The one acknowledgement value.
    pub const OK: Self = Self { ok: true };
}
